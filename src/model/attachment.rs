use serde::{Deserialize, Serialize};
use uuid::Uuid;

const OCTET_STREAM: &str = "application/octet-stream";

/// Metadata about a receipt or image stored in the attachment store. This is what records embed;
/// the bytes themselves live in the attachment store under `id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRef {
    pub id: String,
    pub display_name: String,
    #[serde(default = "octet_stream")]
    pub mime_type: String,
    #[serde(default)]
    pub size_bytes: u64,
}

impl AttachmentRef {
    /// Creates the reference for a file that is about to be uploaded. The id is generated here,
    /// before the blob is saved, so the reference can be embedded right away.
    pub fn for_upload(display_name: impl Into<String>, data: &[u8]) -> Self {
        let display_name = display_name.into();
        let mime_type = mime_guess::from_path(&display_name)
            .first_raw()
            .unwrap_or(OCTET_STREAM)
            .to_string();
        Self {
            id: Uuid::new_v4().to_string(),
            display_name,
            mime_type,
            size_bytes: data.len() as u64,
        }
    }
}

/// A blob as it comes back out of the attachment store, with whatever metadata the backend kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size_bytes: data.len() as u64,
            data,
        }
    }

    /// Used when a backend only has the bytes: the id stands in for the name.
    pub(crate) fn without_metadata(id: &str, data: Vec<u8>) -> Self {
        Self::new(id, OCTET_STREAM, data)
    }
}

fn octet_stream() -> String {
    OCTET_STREAM.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_upload_guesses_mime_and_size() {
        let r = AttachmentRef::for_upload("receipt.png", &[1, 2, 3]);
        assert_eq!(r.mime_type, "image/png");
        assert_eq!(r.size_bytes, 3);
        assert_eq!(r.display_name, "receipt.png");
        assert!(Uuid::parse_str(&r.id).is_ok());
    }

    #[test]
    fn test_for_upload_unknown_extension() {
        let r = AttachmentRef::for_upload("scan", &[]);
        assert_eq!(r.mime_type, OCTET_STREAM);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = AttachmentRef::for_upload("a.pdf", &[]);
        let b = AttachmentRef::for_upload("a.pdf", &[]);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_camel_case_keys() {
        let r = AttachmentRef {
            id: "att-1".into(),
            display_name: "x.png".into(),
            mime_type: "image/png".into(),
            size_bytes: 3,
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["displayName"], "x.png");
        assert_eq!(json["sizeBytes"], 3);
    }
}
