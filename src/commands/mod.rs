//! Command handlers for the haulbook CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod attach;
mod init;
mod records;
mod report;
mod settings;
mod transfer;

use crate::store::{AttachmentStore, DocumentStore, StorageContext};
use crate::{Config, Result};
use serde::Serialize;
use std::fmt::Debug;
use tracing::{info, warn};

pub use attach::{attach_add, attach_export, attach_remove, MAX_ATTACHMENT_BYTES};
pub use init::init;
pub use records::{add, delete, list, update};
pub use report::report;
pub use settings::settings;
pub use transfer::{export, import, ImportSummary};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data to the command line.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to stdout.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            match serde_json::to_string_pretty(structure) {
                Ok(json) => println!("{json}"),
                Err(e) => warn!("Unable to format the command output: {e}"),
            }
        }
    }
}

/// Both stores, opened on the backends `config` selects. Commands end with `close`, which writes
/// any pending change before the process exits.
pub(crate) struct Session {
    documents: DocumentStore,
    attachments: AttachmentStore,
}

impl Session {
    pub(crate) async fn open(config: &Config) -> Result<Self> {
        let context = StorageContext::from_config(config).await?;
        Ok(Self {
            documents: DocumentStore::open(&context, config.debounce()).await,
            attachments: AttachmentStore::new(context.attachments()),
        })
    }

    pub(crate) fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub(crate) fn attachments(&self) -> &AttachmentStore {
        &self.attachments
    }

    pub(crate) async fn close(self) -> Result<()> {
        self.documents.close().await
    }
}

/// Adds an `s` when `count` is not one.
fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
