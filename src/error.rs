pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the attachment store. Callers are expected to inspect these, e.g. to treat a
/// missing blob as "no preview available".
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Attachment '{id}' was not found")]
    NotFound { id: String },

    #[error("'{id}' is not a valid attachment id")]
    InvalidId { id: String },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
