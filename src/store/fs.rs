//! File system backends, used by the desktop installation. The document is a single JSON file and
//! every attachment is one file in the attachments directory, next to a small JSON sidecar holding
//! its metadata.

use crate::model::Attachment;
use crate::store::backend::{AttachmentBackend, DocumentBackend};
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

const META_SUFFIX: &str = ".meta.json";

/// Keeps the document in one JSON file.
#[derive(Debug, Clone)]
pub struct FsDocumentBackend {
    path: PathBuf,
}

impl FsDocumentBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl DocumentBackend for FsDocumentBackend {
    async fn read(&self) -> Result<Option<String>> {
        trace!("Reading document from {}", self.path.display());
        utils::read_optional(&self.path).await
    }

    async fn write(&self, contents: &str) -> Result<()> {
        trace!("Writing document to {}", self.path.display());
        utils::write_atomic(&self.path, contents).await
    }

    async fn remove(&self) -> Result<()> {
        utils::remove_if_exists(&self.path).await
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// What the sidecar file next to each blob contains.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Sidecar {
    name: String,
    mime_type: String,
    size_bytes: u64,
}

/// Keeps each attachment as a file named after its id inside `dir`.
#[derive(Debug, Clone)]
pub struct FsAttachmentBackend {
    dir: PathBuf,
}

impl FsAttachmentBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn blob_path(&self, id: &str) -> Result<PathBuf> {
        ensure_file_name(id)?;
        Ok(self.dir.join(id))
    }

    fn meta_path(&self, id: &str) -> Result<PathBuf> {
        ensure_file_name(id)?;
        Ok(self.dir.join(format!("{id}{META_SUFFIX}")))
    }
}

/// Ids become file names, so they must not be able to point outside the attachments directory or
/// collide with a sidecar or a temp file.
fn ensure_file_name(id: &str) -> Result<()> {
    if id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\'])
        || id.ends_with(META_SUFFIX)
        || id.ends_with(utils::TMP_SUFFIX)
    {
        bail!("'{id}' cannot be used as an attachment file name")
    }
    Ok(())
}

#[async_trait::async_trait]
impl AttachmentBackend for FsAttachmentBackend {
    async fn save(&self, id: &str, attachment: &Attachment) -> Result<()> {
        let blob = self.blob_path(id)?;
        let meta = self.meta_path(id)?;
        utils::make_dir(&self.dir).await?;
        // Without a sidecar the blob reads back with metadata derived from its id, never with the
        // metadata of the blob it replaced.
        utils::remove_if_exists(&meta).await?;
        utils::write_atomic(&blob, &attachment.data).await?;
        let sidecar = Sidecar {
            name: attachment.name.clone(),
            mime_type: attachment.mime_type.clone(),
            size_bytes: attachment.size_bytes,
        };
        let json = serde_json::to_string(&sidecar).context("Unable to serialize sidecar")?;
        utils::write_atomic(&meta, json).await
    }

    async fn read(&self, id: &str) -> Result<Option<Attachment>> {
        let blob = self.blob_path(id)?;
        let Some(data) = utils::read_bytes_optional(&blob).await? else {
            return Ok(None);
        };
        let meta = self.meta_path(id)?;
        let sidecar = match utils::read_optional(&meta).await? {
            None => None,
            Some(text) => match serde_json::from_str::<Sidecar>(&text) {
                Ok(s) => Some(s),
                Err(e) => {
                    warn!("Ignoring unreadable metadata {}: {e}", meta.display());
                    None
                }
            },
        };
        Ok(Some(match sidecar {
            Some(s) => Attachment {
                name: s.name,
                mime_type: s.mime_type,
                size_bytes: data.len() as u64,
                data,
            },
            None => Attachment::without_metadata(id, data),
        }))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        utils::remove_if_exists(&self.blob_path(id)?).await?;
        utils::remove_if_exists(&self.meta_path(id)?).await
    }

    fn describe(&self) -> String {
        format!("directory {}", self.dir.display())
    }
}
