//! Add, update, delete and list handlers, shared by all four record kinds.

use crate::commands::{plural, Out, Session};
use crate::model::Record;
use crate::{Config, Result};
use anyhow::bail;
use tracing::debug;

/// Appends `record` and returns it.
pub async fn add<R: Record>(config: Config, record: R) -> Result<Out<R>> {
    let session = Session::open(&config).await?;
    session.documents().add(record.clone()).await;
    session.close().await?;
    Ok(Out::new(
        format!("Added {} {}", R::KIND, record.id()),
        record,
    ))
}

/// Replaces the record with the same id. The attachments of the stored record are carried over,
/// since the command line has no way to list them.
///
/// # Errors
/// - Returns an error if no record with that id exists. Nothing is changed in that case.
pub async fn update<R: Record>(config: Config, mut record: R) -> Result<Out<R>> {
    let session = Session::open(&config).await?;
    let Some(existing) = session.documents().find::<R>(record.id()).await else {
        session.close().await?;
        bail!("There is no {} with id '{}'", R::KIND, record.id())
    };
    if let Some(attachments) = record.attachments_mut() {
        *attachments = existing.attachments().to_vec();
    }
    let replaced = session.documents().update(record.clone()).await;
    debug!("update of {} {} replaced: {replaced}", R::KIND, record.id());
    session.close().await?;
    Ok(Out::new(
        format!("Updated {} {}", R::KIND, record.id()),
        record,
    ))
}

/// Removes the record. Attachment blobs it referenced stay in the attachment store.
pub async fn delete<R: Record>(config: Config, id: &str) -> Result<Out<()>> {
    let session = Session::open(&config).await?;
    let removed = session.documents().delete::<R>(id).await;
    session.close().await?;
    if !removed {
        bail!("There is no {} with id '{id}'", R::KIND)
    }
    Ok(format!("Deleted {} {id}", R::KIND).into())
}

/// Lists the records of one kind, optionally only those dated in `year`.
pub async fn list<R: Record>(config: Config, year: Option<i32>) -> Result<Out<Vec<R>>> {
    let session = Session::open(&config).await?;
    let records = session.documents().list::<R>(year).await;
    session.close().await?;
    let count = records.len();
    Ok(Out::new(
        format!("Found {count} {}{}", R::KIND, plural(count)),
        records,
    ))
}
