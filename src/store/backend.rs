//! The capability traits each storage medium implements. The stores only ever talk to these; which
//! concrete medium sits behind them is decided once, when the `StorageContext` is built.

use crate::model::Attachment;
use crate::Result;
use std::fmt::Debug;

/// Somewhere the serialized `AppDocument` can be kept. The document is always read and written
/// whole.
#[async_trait::async_trait]
pub trait DocumentBackend: Debug + Send + Sync {
    /// Returns the stored document text, or `None` if nothing has been stored yet.
    async fn read(&self) -> Result<Option<String>>;

    /// Replaces whatever was stored with `contents`.
    async fn write(&self, contents: &str) -> Result<()>;

    /// Forgets the stored document. Removing a document that does not exist is not an error.
    async fn remove(&self) -> Result<()>;

    /// A human readable description for log messages.
    fn describe(&self) -> String;
}

/// A flat key to blob map for attachment bytes.
#[async_trait::async_trait]
pub trait AttachmentBackend: Debug + Send + Sync {
    /// Stores `attachment` under `id`, replacing anything already stored there.
    async fn save(&self, id: &str, attachment: &Attachment) -> Result<()>;

    /// Returns the blob stored under `id`, or `None` if there is none.
    async fn read(&self, id: &str) -> Result<Option<Attachment>>;

    /// Removes the blob stored under `id`. Deleting a missing blob is not an error.
    async fn delete(&self, id: &str) -> Result<()>;

    fn describe(&self) -> String;
}
