use crate::commands::Out;
use crate::{Backend, Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its subdirectories and an initial `config.json`.
///
/// # Arguments
/// - `haulbook_home` - The directory that will be the root of the data directory.
/// - `backend` - Where the document and the attachments will be kept.
/// - `origin` - The namespace used inside the embedded store, `local` when not given.
///
/// # Errors
/// - Returns an error if the directory already holds a configuration or a file operation fails.
pub async fn init(haulbook_home: &Path, backend: Backend, origin: Option<&str>) -> Result<Out<()>> {
    let config = Config::create(haulbook_home, backend, origin)
        .await
        .context("Unable to create the data directory and config")?;
    Ok(format!(
        "Created a haulbook directory at {} using the {} backend",
        config.root().display(),
        config.backend()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_then_load() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("books");
        let out = init(&home, Backend::Embedded, Some("shop")).await.unwrap();
        assert!(out.message().contains("embedded"));

        let config = Config::load(&home).await.unwrap();
        assert_eq!(config.origin(), "shop");
        assert!(init(&home, Backend::Desktop, None).await.is_err());
    }
}
