//! Optional supporting document: selection, validation and transport encoding.

pub mod encoder;
pub mod validator;

use std::fmt;
use std::path::Path;

use serde::Serialize;

pub use encoder::{decode, encode, AttachmentDecodeError, ENCODE_CHUNK_BYTES};
pub use validator::{
    AttachmentPolicy, AttachmentRejection, DEFAULT_ALLOWED_MEDIA_TYPES,
    DEFAULT_MAX_ATTACHMENT_BYTES,
};

/// A user-selected file that has not been accepted yet.
#[derive(Clone, PartialEq, Eq)]
pub struct AttachmentCandidate {
    pub file_name: String,
    pub media_type: String,
    pub size: u64,
    pub bytes: Vec<u8>,
}

impl AttachmentCandidate {
    pub fn new(file_name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            size: bytes.len() as u64,
            bytes,
        }
    }

    /// Read a file from disk, guessing its media type from the extension.
    pub async fn read_from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        let media_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self::new(file_name, media_type, bytes))
    }
}

impl fmt::Debug for AttachmentCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachmentCandidate")
            .field("file_name", &self.file_name)
            .field("media_type", &self.media_type)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Accepted attachment in its wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentPayload {
    pub file_name: String,
    #[serde(rename = "mimeType")]
    pub media_type: String,
    pub data: String,
}

impl AttachmentPayload {
    pub fn from_candidate(candidate: &AttachmentCandidate) -> Self {
        Self {
            file_name: candidate.file_name.clone(),
            media_type: validator::normalize_media_type(&candidate.media_type),
            data: encode(&candidate.bytes),
        }
    }
}
