//! Persistence: the document store, the attachment store and the backends they write through.

mod attachments;
mod backend;
mod context;
mod document;
pub mod embedded;
pub mod fs;
pub mod memory;

pub use attachments::{AttachmentStore, ObjectUrl};
pub use backend::{AttachmentBackend, DocumentBackend};
pub use context::StorageContext;
pub use document::{load_document, save_document, DocumentStore, DEFAULT_DEBOUNCE};
