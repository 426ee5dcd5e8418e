//! In-memory backends. Nothing survives the process; they exist so the stores can be exercised
//! without touching disk and so tests can count how often the document was written.

use crate::model::Attachment;
use crate::store::backend::{AttachmentBackend, DocumentBackend};
use crate::Result;
use anyhow::bail;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryDocumentBackend {
    contents: Mutex<Option<String>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryDocumentBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts out holding `contents`, as if it had been written earlier.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
            ..Self::default()
        }
    }

    /// How many successful writes have happened.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn contents(&self) -> Option<String> {
        self.contents.lock().await.clone()
    }

    /// Makes every following write fail, simulating an unwritable medium.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl DocumentBackend for MemoryDocumentBackend {
    async fn read(&self) -> Result<Option<String>> {
        Ok(self.contents.lock().await.clone())
    }

    async fn write(&self, contents: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("The in-memory document is read-only")
        }
        *self.contents.lock().await = Some(contents.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self) -> Result<()> {
        *self.contents.lock().await = None;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[derive(Debug, Default)]
pub struct MemoryAttachmentBackend {
    blobs: Mutex<HashMap<String, Attachment>>,
}

impl MemoryAttachmentBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.lock().await.is_empty()
    }
}

#[async_trait::async_trait]
impl AttachmentBackend for MemoryAttachmentBackend {
    async fn save(&self, id: &str, attachment: &Attachment) -> Result<()> {
        self.blobs
            .lock()
            .await
            .insert(id.to_string(), attachment.clone());
        Ok(())
    }

    async fn read(&self, id: &str) -> Result<Option<Attachment>> {
        Ok(self.blobs.lock().await.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.blobs.lock().await.remove(id);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
