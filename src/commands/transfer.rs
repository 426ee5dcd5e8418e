//! Whole-document import and export.

use crate::backup::PRE_IMPORT;
use crate::commands::{Out, Session};
use crate::model::PartialDocument;
use crate::{utils, Config, Result};
use anyhow::Context;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What an import replaced, and where the previous data was saved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub backup: PathBuf,
    pub replaced_fields: Vec<&'static str>,
}

/// Merges the JSON file at `file` over the current document. Each top-level field present in the
/// file replaces the current one; absent fields are kept. The current document is backed up before
/// anything is replaced.
///
/// # Errors
/// - Returns an error, and changes nothing, if the file cannot be read or is not a valid export.
pub async fn import(config: Config, file: &Path) -> Result<Out<ImportSummary>> {
    let text = utils::read(file).await?;
    let partial: PartialDocument = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid haulbook export", file.display()))?;
    let replaced_fields = present_fields(&partial);

    let session = Session::open(&config).await?;
    let current = session.documents().snapshot().await;
    let backup = config.backup().save_json(PRE_IMPORT, &current).await?;
    debug!("Saved pre-import backup to {}", backup.display());

    session.documents().import_document(partial).await;
    session.close().await?;
    Ok(Out::new(
        format!("Imported {}", file.display()),
        ImportSummary {
            backup,
            replaced_fields,
        },
    ))
}

/// Writes the whole document to `out` as pretty JSON.
pub async fn export(config: Config, out: &Path) -> Result<Out<()>> {
    let session = Session::open(&config).await?;
    let json = session.documents().export_json().await;
    session.close().await?;
    utils::write(out, json?).await?;
    Ok(format!("Exported to {}", out.display()).into())
}

fn present_fields(partial: &PartialDocument) -> Vec<&'static str> {
    let mut fields = Vec::new();
    let mut note = |present: bool, name: &'static str| {
        if present {
            fields.push(name);
        }
    };
    note(partial.income_entries.is_some(), "incomeEntries");
    note(partial.expense_entries.is_some(), "expenseEntries");
    note(partial.customers.is_some(), "customers");
    note(partial.trip_log_entries.is_some(), "tripLogEntries");
    note(partial.fiscal_year.is_some(), "fiscalYear");
    note(partial.company_name.is_some(), "companyName");
    note(partial.tax_id.is_some(), "taxId");
    note(partial.small_business_exempt.is_some(), "smallBusinessExempt");
    fields
}
