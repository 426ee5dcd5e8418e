//! Rolling JSON snapshots of the document, taken before an operation that replaces data.

use crate::model::AppDocument;
use crate::{utils, Config, Result};
use anyhow::Context;
use chrono::Local;
use std::path::PathBuf;
use tracing::debug;

/// Prefix for the snapshot written before `haulbook import`.
pub const PRE_IMPORT: &str = "pre-import";

const EXTENSION: &str = "json";

/// Writes snapshots to the backups directory and rotates old ones away.
///
/// Create one via `Config::backup()`.
#[derive(Debug, Clone)]
pub struct Backup {
    backups_dir: PathBuf,
    backup_copies: u32,
}

impl Backup {
    pub fn new(config: &Config) -> Self {
        Self {
            backups_dir: config.backups().to_path_buf(),
            backup_copies: config.backup_copies(),
        }
    }

    /// Saves `doc` as `{prefix}.YYYY-MM-DD-NNN.json`, where NNN counts up within a day, then
    /// deletes the oldest files with the same prefix beyond `backup_copies`.
    ///
    /// Returns the path of the new file.
    pub async fn save_json(&self, prefix: &str, doc: &AppDocument) -> Result<PathBuf> {
        let date = today();
        let seq = self.next_sequence_number(prefix, &date).await?;
        let path = self
            .backups_dir
            .join(format!("{prefix}.{date}-{seq:03}.{EXTENSION}"));

        let json = serde_json::to_string_pretty(doc).context("Failed to serialize the document")?;
        utils::write(&path, json).await?;
        debug!("Wrote backup {}", path.display());

        self.rotate(prefix).await?;
        Ok(path)
    }

    async fn backup_names(&self, prefix: &str) -> Result<Vec<(PathBuf, String)>> {
        let mut files = Vec::new();
        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if is_backup_file(&name, prefix) {
                files.push((entry.path(), name));
            }
        }
        Ok(files)
    }

    async fn next_sequence_number(&self, prefix: &str, date: &str) -> Result<u32> {
        let max = self
            .backup_names(prefix)
            .await?
            .iter()
            .filter_map(|(_, name)| parse_sequence_number(name, prefix, date))
            .max()
            .unwrap_or(0);
        Ok(max + 1)
    }

    async fn rotate(&self, prefix: &str) -> Result<()> {
        let mut files = self.backup_names(prefix).await?;
        // Names sort by date, then sequence number.
        files.sort_by(|a, b| a.1.cmp(&b.1));
        let excess = files.len().saturating_sub(self.backup_copies as usize);
        for (path, _) in files.into_iter().take(excess) {
            debug!("Rotating out {}", path.display());
            utils::remove(&path).await?;
        }
        Ok(())
    }
}

fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// `pre-import.2025-12-14-007.json` -> `Some(7)` for the matching prefix and date.
fn parse_sequence_number(filename: &str, prefix: &str, date: &str) -> Option<u32> {
    filename
        .strip_prefix(&format!("{prefix}.{date}-"))?
        .strip_suffix(&format!(".{EXTENSION}"))?
        .parse()
        .ok()
}

fn is_backup_file(filename: &str, prefix: &str) -> bool {
    filename.starts_with(&format!("{prefix}.")) && filename.ends_with(&format!(".{EXTENSION}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use crate::Backend;

    #[test]
    fn test_parse_sequence_number() {
        let date = "2025-12-14";
        assert_eq!(
            parse_sequence_number("pre-import.2025-12-14-001.json", PRE_IMPORT, date),
            Some(1)
        );
        assert_eq!(
            parse_sequence_number("pre-import.2025-12-14-042.json", PRE_IMPORT, date),
            Some(42)
        );
        assert_eq!(
            parse_sequence_number("pre-import.2025-12-13-001.json", PRE_IMPORT, date),
            None
        );
        assert_eq!(
            parse_sequence_number("other.2025-12-14-001.json", PRE_IMPORT, date),
            None
        );
        assert_eq!(
            parse_sequence_number("pre-import.2025-12-14-001.json.tmp", PRE_IMPORT, date),
            None
        );
    }

    #[test]
    fn test_is_backup_file() {
        assert!(is_backup_file("pre-import.2025-12-14-001.json", PRE_IMPORT));
        assert!(!is_backup_file("pre-import.2025-12-14-001.txt", PRE_IMPORT));
        assert!(!is_backup_file("pre-importer.2025-12-14-001.json", PRE_IMPORT));
    }

    #[tokio::test]
    async fn test_save_json_numbers_and_rotates() {
        let env = TestEnv::new(Backend::Desktop).await;
        let backup = env.config().backup();
        let doc = AppDocument {
            company_name: "Kurier Nord".into(),
            ..AppDocument::default()
        };

        let first = backup.save_json(PRE_IMPORT, &doc).await.unwrap();
        assert!(first
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("-001.json"));
        let restored: AppDocument =
            serde_json::from_str(&utils::read(&first).await.unwrap()).unwrap();
        assert_eq!(restored, doc);

        for _ in 0..6 {
            backup.save_json(PRE_IMPORT, &doc).await.unwrap();
        }
        let names = backup.backup_names(PRE_IMPORT).await.unwrap();
        assert_eq!(names.len(), env.config().backup_copies() as usize);
        assert!(!first.exists());
    }
}
