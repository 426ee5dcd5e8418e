//! Attachment handlers. The blob goes to the attachment store and an `AttachmentRef` goes into the
//! record; these handlers are the only place the two are kept in step.

use crate::args::AttachTarget;
use crate::commands::{Out, Session};
use crate::model::{AttachmentRef, ExpenseEntry, IncomeEntry, Record};
use crate::store::DocumentStore;
use crate::{utils, Config, Result};
use anyhow::{bail, Context};
use std::path::Path;
use tracing::{debug, warn};

/// Files larger than this are refused.
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

/// Stores `file` and attaches it to the income or expense entry `record_id`.
///
/// # Errors
/// - Returns an error if the record does not exist, the file cannot be read or is too large, or
///   the attachment store fails. The document is only changed once the blob is stored.
pub async fn attach_add(
    config: Config,
    target: AttachTarget,
    record_id: &str,
    file: &Path,
    name: Option<&str>,
) -> Result<Out<AttachmentRef>> {
    let data = utils::read_bytes(file).await?;
    if data.len() > MAX_ATTACHMENT_BYTES {
        bail!(
            "{} is {} bytes, attachments are limited to {MAX_ATTACHMENT_BYTES} bytes",
            file.display(),
            data.len()
        )
    }
    let display_name = match name {
        Some(name) => name.to_string(),
        None => file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .context("The file has no name, pass --name")?,
    };

    let session = Session::open(&config).await?;
    if !record_exists(session.documents(), target, record_id).await {
        session.close().await?;
        bail!("There is no {target} with id '{record_id}'")
    }

    let reference = AttachmentRef::for_upload(display_name, &data);
    session
        .attachments()
        .save(
            &reference.id,
            data,
            &reference.display_name,
            &reference.mime_type,
        )
        .await?;

    let attached = match target {
        AttachTarget::Income => {
            push_ref::<IncomeEntry>(session.documents(), record_id, reference.clone()).await
        }
        AttachTarget::Expense => {
            push_ref::<ExpenseEntry>(session.documents(), record_id, reference.clone()).await
        }
    };
    if !attached {
        // The record vanished between the check and the mutation; do not leave an orphan.
        session.attachments().delete(&reference.id).await?;
        session.close().await?;
        bail!("There is no {target} with id '{record_id}'")
    }
    session.close().await?;
    Ok(Out::new(
        format!(
            "Attached {} to {target} {record_id}",
            reference.display_name
        ),
        reference,
    ))
}

/// Writes the bytes of attachment `id` to `out`.
pub async fn attach_export(config: Config, id: &str, out: &Path) -> Result<Out<()>> {
    let session = Session::open(&config).await?;
    let attachment = session.attachments().read(id).await;
    session.close().await?;
    let attachment = attachment?;
    utils::write(out, &attachment.data).await?;
    Ok(format!(
        "Wrote {} ({}, {} bytes) to {}",
        attachment.name,
        attachment.mime_type,
        attachment.size_bytes,
        out.display()
    )
    .into())
}

/// Removes the reference `id` from the record and deletes the blob.
pub async fn attach_remove(
    config: Config,
    target: AttachTarget,
    record_id: &str,
    id: &str,
) -> Result<Out<()>> {
    let session = Session::open(&config).await?;
    let removed = match target {
        AttachTarget::Income => remove_ref::<IncomeEntry>(session.documents(), record_id, id).await,
        AttachTarget::Expense => {
            remove_ref::<ExpenseEntry>(session.documents(), record_id, id).await
        }
    };
    if !removed {
        session.close().await?;
        bail!("{target} '{record_id}' has no attachment '{id}'")
    }
    if let Err(e) = session.attachments().delete(id).await {
        warn!("The reference was removed but the stored file could not be deleted: {e}");
    }
    session.close().await?;
    Ok(format!("Removed attachment {id} from {target} {record_id}").into())
}

async fn record_exists(documents: &DocumentStore, target: AttachTarget, id: &str) -> bool {
    match target {
        AttachTarget::Income => documents.find::<IncomeEntry>(id).await.is_some(),
        AttachTarget::Expense => documents.find::<ExpenseEntry>(id).await.is_some(),
    }
}

async fn push_ref<R: Record>(
    documents: &DocumentStore,
    record_id: &str,
    reference: AttachmentRef,
) -> bool {
    documents
        .mutate(|doc| {
            let Some(record) = R::list_mut(doc).iter_mut().find(|r| r.id() == record_id) else {
                return false;
            };
            match record.attachments_mut() {
                Some(attachments) => {
                    attachments.push(reference);
                    true
                }
                None => false,
            }
        })
        .await
}

async fn remove_ref<R: Record>(documents: &DocumentStore, record_id: &str, id: &str) -> bool {
    let removed = documents
        .mutate(|doc| {
            R::list_mut(doc)
                .iter_mut()
                .find(|r| r.id() == record_id)
                .and_then(|r| r.attachments_mut())
                .map(|attachments| {
                    let before = attachments.len();
                    attachments.retain(|a| a.id != id);
                    attachments.len() != before
                })
                .unwrap_or(false)
        })
        .await;
    debug!("Removing {id} from {} {record_id}: {removed}", R::KIND);
    removed
}
