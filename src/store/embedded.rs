//! The embedded backend: a single SQLite file that behaves like a browser's origin-scoped storage.
//! Small string values go into `kv`, attachment bytes and their metadata into `blobs`. Every row
//! carries the origin it belongs to, and every query filters on it, so two origins sharing the file
//! never see each other's data.

use crate::model::Attachment;
use crate::store::backend::{AttachmentBackend, DocumentBackend};
use crate::Result;
use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Executor, SqlitePool};
use std::path::Path;
use tracing::debug;

/// The key the document is stored under.
pub const DOCUMENT_KEY: &str = "haulbook-data";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    origin TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (origin, key)
);
CREATE TABLE IF NOT EXISTS blobs (
    origin TEXT NOT NULL,
    id TEXT NOT NULL,
    name TEXT NOT NULL,
    mime_type TEXT NOT NULL,
    size INTEGER NOT NULL,
    data BLOB NOT NULL,
    PRIMARY KEY (origin, id)
);
"#;

/// A connection to the embedded SQLite file, bound to one origin.
#[derive(Debug, Clone)]
pub struct EmbeddedStore {
    pool: SqlitePool,
    origin: String,
}

impl EmbeddedStore {
    /// Opens (creating if necessary) the SQLite file at `path` and ensures the schema exists.
    pub async fn open(path: impl AsRef<Path>, origin: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("Unable to open embedded store at {}", path.display()))?;
        pool.execute(SCHEMA)
            .await
            .context("Failed to create the embedded store schema")?;
        let origin = origin.into();
        debug!("Opened embedded store {} for origin '{origin}'", path.display());
        Ok(Self { pool, origin })
    }

    /// The same file, seen from another origin.
    pub fn with_origin(&self, origin: impl Into<String>) -> Self {
        Self {
            pool: self.pool.clone(),
            origin: origin.into(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM kv WHERE origin = ? AND key = ?")
                .bind(&self.origin)
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("Failed to read key '{key}'"))?;
        Ok(row.map(|(value,)| value))
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO kv (origin, key, value) VALUES (?, ?, ?) \
             ON CONFLICT(origin, key) DO UPDATE SET value = excluded.value",
        )
        .bind(&self.origin)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to write key '{key}'"))?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv WHERE origin = ? AND key = ?")
            .bind(&self.origin)
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to remove key '{key}'"))?;
        Ok(())
    }

    async fn put_blob(&self, id: &str, attachment: &Attachment) -> Result<()> {
        let size = i64::try_from(attachment.size_bytes).context("Attachment is too large")?;
        sqlx::query(
            "INSERT INTO blobs (origin, id, name, mime_type, size, data) VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT(origin, id) DO UPDATE SET name = excluded.name, \
             mime_type = excluded.mime_type, size = excluded.size, data = excluded.data",
        )
        .bind(&self.origin)
        .bind(id)
        .bind(&attachment.name)
        .bind(&attachment.mime_type)
        .bind(size)
        .bind(&attachment.data)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to save attachment '{id}'"))?;
        Ok(())
    }

    async fn get_blob(&self, id: &str) -> Result<Option<Attachment>> {
        let row: Option<(String, String, i64, Vec<u8>)> = sqlx::query_as(
            "SELECT name, mime_type, size, data FROM blobs WHERE origin = ? AND id = ?",
        )
        .bind(&self.origin)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to read attachment '{id}'"))?;
        Ok(row.map(|(name, mime_type, size, data)| Attachment {
            name,
            mime_type,
            size_bytes: u64::try_from(size).unwrap_or(data.len() as u64),
            data,
        }))
    }

    async fn delete_blob(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM blobs WHERE origin = ? AND id = ?")
            .bind(&self.origin)
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete attachment '{id}'"))?;
        Ok(())
    }
}

/// Stores the document as one value in the key-value table.
#[derive(Debug, Clone)]
pub struct EmbeddedDocumentBackend {
    store: EmbeddedStore,
    key: String,
}

impl EmbeddedDocumentBackend {
    pub fn new(store: EmbeddedStore) -> Self {
        Self {
            store,
            key: DOCUMENT_KEY.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl DocumentBackend for EmbeddedDocumentBackend {
    async fn read(&self) -> Result<Option<String>> {
        self.store.get(&self.key).await
    }

    async fn write(&self, contents: &str) -> Result<()> {
        self.store.set(&self.key, contents).await
    }

    async fn remove(&self) -> Result<()> {
        self.store.remove(&self.key).await
    }

    fn describe(&self) -> String {
        format!(
            "embedded key '{}' (origin '{}')",
            self.key,
            self.store.origin()
        )
    }
}

/// Stores attachments in the blob table, metadata included.
#[derive(Debug, Clone)]
pub struct EmbeddedAttachmentBackend {
    store: EmbeddedStore,
}

impl EmbeddedAttachmentBackend {
    pub fn new(store: EmbeddedStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl AttachmentBackend for EmbeddedAttachmentBackend {
    async fn save(&self, id: &str, attachment: &Attachment) -> Result<()> {
        self.store.put_blob(id, attachment).await
    }

    async fn read(&self, id: &str) -> Result<Option<Attachment>> {
        self.store.get_blob(id).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete_blob(id).await
    }

    fn describe(&self) -> String {
        format!("embedded blobs (origin '{}')", self.store.origin())
    }
}
