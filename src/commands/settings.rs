use crate::commands::{Out, Session};
use crate::model::SettingsUpdate;
use crate::{Config, Result};

/// Applies the supplied settings, if any, and returns the resulting settings.
pub async fn settings(config: Config, update: SettingsUpdate) -> Result<Out<SettingsUpdate>> {
    let session = Session::open(&config).await?;
    let changed = !update.is_empty();
    if changed {
        session.documents().update_settings(update).await;
    }
    let doc = session.documents().snapshot().await;
    session.close().await?;

    let current = SettingsUpdate {
        company_name: Some(doc.company_name),
        tax_id: Some(doc.tax_id),
        small_business_exempt: Some(doc.small_business_exempt),
        fiscal_year: Some(doc.fiscal_year),
    };
    let message = if changed {
        "Updated settings"
    } else {
        "Current settings"
    };
    Ok(Out::new(message, current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::current_year;
    use crate::test::TestEnv;
    use crate::Backend;

    #[tokio::test]
    async fn test_defaults_then_partial_update() {
        let env = TestEnv::new(Backend::Desktop).await;
        let out = settings(env.config(), SettingsUpdate::default())
            .await
            .unwrap();
        let shown = out.structure().unwrap();
        assert_eq!(shown.small_business_exempt, Some(true));
        assert_eq!(shown.fiscal_year, Some(current_year()));

        settings(
            env.config(),
            SettingsUpdate {
                company_name: Some("Kurier Nord".into()),
                ..SettingsUpdate::default()
            },
        )
        .await
        .unwrap();
        let out = settings(
            env.config(),
            SettingsUpdate {
                small_business_exempt: Some(false),
                ..SettingsUpdate::default()
            },
        )
        .await
        .unwrap();
        let shown = out.structure().unwrap();
        assert_eq!(out.message(), "Updated settings");
        assert_eq!(shown.company_name.as_deref(), Some("Kurier Nord"));
        assert_eq!(shown.small_business_exempt, Some(false));
    }
}
