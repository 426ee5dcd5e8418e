//! Configuration file handling for haulbook.
//!
//! The configuration file is stored at `$HAULBOOK_HOME/config.json`. It selects which storage
//! backend is active and holds the few tunables of the persistence layer. Everything else in the
//! home directory lives at a fixed location relative to the root, which keeps the data directory
//! portable: copy the folder and the books come along.

use crate::backup::Backup;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "haulbook";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
const DEBOUNCE_MS: u64 = 500;
const DEFAULT_ORIGIN: &str = "local";
const BACKUPS: &str = ".backups";
const ATTACHMENTS: &str = "attachments";
const CONFIG_JSON: &str = "config.json";
const DATA_JSON: &str = "data.json";
const EMBEDDED_SQLITE: &str = "embedded.sqlite";

/// Which storage medium holds the document and the attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Plain files in the home directory: `data.json` and one file per attachment.
    #[default]
    Desktop,
    /// A single SQLite file acting as an origin-scoped key-value and blob store.
    Embedded,
}

serde_plain::derive_display_from_serialize!(Backend);
serde_plain::derive_fromstr_from_deserialize!(Backend);

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$HAULBOOK_HOME` and from there it loads `$HAULBOOK_HOME/config.json`. It provides
/// paths to the other items which are expected in a fixed location within the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    attachments: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the data directory, its subdirectories and an initial `config.json`.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the data directory.
    /// - `backend` - The storage backend that will be active for this installation.
    /// - `origin` - The namespace used by the embedded store. Defaults to `local`.
    ///
    /// # Errors
    /// - Returns an error if a `config.json` already exists or if any file operation fails.
    pub async fn create(
        dir: impl Into<PathBuf>,
        backend: Backend,
        origin: Option<&str>,
    ) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the haulbook home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A configuration already exists at '{}'",
                config_path.display()
            )
        }

        let backups = root.join(BACKUPS);
        utils::make_dir(&backups).await?;
        let attachments = root.join(ATTACHMENTS);
        utils::make_dir(&attachments).await?;

        let config_file = ConfigFile {
            backend,
            origin: origin.unwrap_or(DEFAULT_ORIGIN).to_string(),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            backups,
            attachments,
            config_path,
            config_file,
        })
    }

    /// This will
    /// - validate that the home directory and the config file exist
    /// - load the config file
    /// - validate that the backups and attachments directories exist
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The haulbook home directory is missing, run 'haulbook init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let config = Self {
            root: root.clone(),
            backups: root.join(BACKUPS),
            attachments: root.join(ATTACHMENTS),
            config_path,
            config_file,
        };
        if !config.backups.is_dir() {
            bail!(
                "The backups directory is missing '{}'",
                config.backups.display()
            )
        }
        if !config.attachments.is_dir() {
            bail!(
                "The attachments directory is missing '{}'",
                config.attachments.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    pub fn attachments_dir(&self) -> &Path {
        &self.attachments
    }

    /// Where the desktop backend keeps the document.
    pub fn document_path(&self) -> PathBuf {
        self.root.join(DATA_JSON)
    }

    /// Where the embedded backend keeps its SQLite file.
    pub fn embedded_path(&self) -> PathBuf {
        self.root.join(EMBEDDED_SQLITE)
    }

    pub fn backend(&self) -> Backend {
        self.config_file.backend
    }

    pub fn origin(&self) -> &str {
        &self.config_file.origin
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.config_file.debounce_ms)
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    /// Creates a new `Backup` instance for managing backup files.
    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "haulbook",
///   "config_version": 1,
///   "backend": "desktop",
///   "origin": "local",
///   "debounce_ms": 500,
///   "backup_copies": 5
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "haulbook"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// The active storage backend
    #[serde(default)]
    backend: Backend,

    /// Namespace for rows in the embedded store
    #[serde(default = "default_origin")]
    origin: String,

    /// Quiet period before a mutation is written to disk
    #[serde(default = "default_debounce_ms")]
    debounce_ms: u64,

    /// Number of backup copies to keep
    #[serde(default = "default_backup_copies")]
    backup_copies: u32,
}

fn default_origin() -> String {
    DEFAULT_ORIGIN.to_string()
}

fn default_debounce_ms() -> u64 {
    DEBOUNCE_MS
}

fn default_backup_copies() -> u32 {
    BACKUP_COPIES
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            backend: Backend::default(),
            origin: default_origin(),
            debounce_ms: DEBOUNCE_MS,
            backup_copies: BACKUP_COPIES,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app.
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = utils::read(path).await?;
        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.config_version <= CONFIG_VERSION,
            "Config version {} is unsupported. Is a newer version of haulbook available?",
            config.config_version
        );

        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path, data)
            .await
            .context("Unable to write config file")
    }
}
