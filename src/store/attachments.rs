//! The attachment store: blobs addressed by ids that callers generate up front. It knows nothing
//! about the document. Records hold `AttachmentRef`s and nothing ties the two together, so deleting
//! a record leaves its blobs behind and deleting a blob leaves dangling references.

use crate::error::StoreError;
use crate::model::Attachment;
use crate::store::backend::AttachmentBackend;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};
use uuid::Uuid;

const URL_PREFIX: &str = "blob:haulbook/";

/// A handle to an attachment that has been materialized into the process-wide URL registry. The
/// registered blob stays alive until the URL is revoked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Default)]
struct UrlRegistry {
    entries: Mutex<HashMap<String, Arc<Attachment>>>,
}

impl UrlRegistry {
    fn register(&self, attachment: Attachment) -> ObjectUrl {
        let url = format!("{URL_PREFIX}{}", Uuid::new_v4());
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.clone(), Arc::new(attachment));
        ObjectUrl(url)
    }

    fn resolve(&self, url: &str) -> Option<Arc<Attachment>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
    }

    fn revoke(&self, url: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(url)
            .is_some()
    }

    fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[derive(Debug, Clone)]
pub struct AttachmentStore {
    backend: Arc<dyn AttachmentBackend>,
    urls: Arc<UrlRegistry>,
}

impl AttachmentStore {
    pub fn new(backend: Arc<dyn AttachmentBackend>) -> Self {
        Self {
            backend,
            urls: Arc::new(UrlRegistry::default()),
        }
    }

    /// Stores `data` under `id`, overwriting anything already there.
    pub async fn save(
        &self,
        id: &str,
        data: Vec<u8>,
        display_name: &str,
        mime_type: &str,
    ) -> Result<(), StoreError> {
        ensure_id(id)?;
        let attachment = Attachment::new(display_name, mime_type, data);
        self.backend.save(id, &attachment).await?;
        debug!(
            "Saved attachment {id} ({} bytes) to {}",
            attachment.size_bytes,
            self.backend.describe()
        );
        Ok(())
    }

    pub async fn read(&self, id: &str) -> Result<Attachment, StoreError> {
        ensure_id(id)?;
        self.backend
            .read(id)
            .await?
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    /// Removes the blob. An id that was never stored is not an error.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        ensure_id(id)?;
        self.backend.delete(id).await?;
        debug!("Deleted attachment {id}");
        Ok(())
    }

    /// Reads the blob and registers it under a fresh object URL. Returns `None` when the blob is
    /// missing or cannot be read. The caller must `revoke_url` once the URL is no longer needed.
    pub async fn materialize_url(&self, id: &str) -> Option<ObjectUrl> {
        match self.read(id).await {
            Ok(attachment) => Some(self.urls.register(attachment)),
            Err(StoreError::NotFound { .. }) => None,
            Err(e) => {
                warn!("Unable to materialize attachment {id}: {e:#}");
                None
            }
        }
    }

    pub fn resolve_url(&self, url: &ObjectUrl) -> Option<Arc<Attachment>> {
        self.urls.resolve(url.as_str())
    }

    /// Releases a materialized URL. Returns `false` if it was not live.
    pub fn revoke_url(&self, url: &ObjectUrl) -> bool {
        self.urls.revoke(url.as_str())
    }

    /// How many materialized URLs have not been revoked yet.
    pub fn live_urls(&self) -> usize {
        self.urls.len()
    }
}

fn ensure_id(id: &str) -> Result<(), StoreError> {
    if id.trim().is_empty() {
        return Err(StoreError::InvalidId { id: id.to_string() });
    }
    Ok(())
}
