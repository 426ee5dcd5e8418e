use crate::store::backend::{AttachmentBackend, DocumentBackend};
use crate::store::embedded::{EmbeddedAttachmentBackend, EmbeddedDocumentBackend, EmbeddedStore};
use crate::store::fs::{FsAttachmentBackend, FsDocumentBackend};
use crate::{Backend, Config, Result};
use std::sync::Arc;
use tracing::debug;

/// The storage backends selected for this process. It is built once at startup and handed to the
/// document store and the attachment store, which never decide for themselves where data goes.
#[derive(Debug, Clone)]
pub struct StorageContext {
    documents: Arc<dyn DocumentBackend>,
    attachments: Arc<dyn AttachmentBackend>,
    legacy_documents: Option<Arc<dyn DocumentBackend>>,
}

impl StorageContext {
    pub fn new(
        documents: Arc<dyn DocumentBackend>,
        attachments: Arc<dyn AttachmentBackend>,
    ) -> Self {
        Self {
            documents,
            attachments,
            legacy_documents: None,
        }
    }

    /// Adds a location that older versions may have written the document to. It is consulted once
    /// on load when the primary backend has nothing.
    pub fn with_legacy_documents(mut self, legacy: Arc<dyn DocumentBackend>) -> Self {
        self.legacy_documents = Some(legacy);
        self
    }

    /// Selects the backends named by `config`.
    ///
    /// - `desktop`: the document is `data.json` and attachments are files. If an embedded store
    ///   file exists from an earlier embedded-mode run, its document is registered as the legacy
    ///   location so it gets migrated.
    /// - `embedded`: both document and attachments live in the embedded SQLite file, scoped to the
    ///   configured origin.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let context = match config.backend() {
            Backend::Desktop => {
                let context = Self::new(
                    Arc::new(FsDocumentBackend::new(config.document_path())),
                    Arc::new(FsAttachmentBackend::new(config.attachments_dir())),
                );
                let embedded_path = config.embedded_path();
                if embedded_path.is_file() {
                    let store = EmbeddedStore::open(&embedded_path, config.origin()).await?;
                    context.with_legacy_documents(Arc::new(EmbeddedDocumentBackend::new(store)))
                } else {
                    context
                }
            }
            Backend::Embedded => {
                let store = EmbeddedStore::open(config.embedded_path(), config.origin()).await?;
                Self::new(
                    Arc::new(EmbeddedDocumentBackend::new(store.clone())),
                    Arc::new(EmbeddedAttachmentBackend::new(store)),
                )
            }
        };
        debug!(
            "Storage: document in {}, attachments in {}",
            context.documents.describe(),
            context.attachments.describe()
        );
        Ok(context)
    }

    pub fn documents(&self) -> Arc<dyn DocumentBackend> {
        self.documents.clone()
    }

    pub fn attachments(&self) -> Arc<dyn AttachmentBackend> {
        self.attachments.clone()
    }

    pub fn legacy_documents(&self) -> Option<Arc<dyn DocumentBackend>> {
        self.legacy_documents.clone()
    }
}
