//! Base64 transport encoding for attachment bytes.
//!
//! Work is split into fixed-size chunks so large files never go through a single
//! encode call. The chunk size is a multiple of three, which keeps padding out of
//! every chunk but the last and makes the chunked output identical to a one-shot
//! encoding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Raw bytes per encoder chunk (48 KiB).
pub const ENCODE_CHUNK_BYTES: usize = 3 * 16 * 1024;

const DECODE_CHUNK_CHARS: usize = ENCODE_CHUNK_BYTES / 3 * 4;

#[derive(Debug, thiserror::Error)]
#[error("attachment data is not valid base64 near offset {offset}: {source}")]
pub struct AttachmentDecodeError {
    pub offset: usize,
    #[source]
    pub source: base64::DecodeError,
}

pub fn encode(bytes: &[u8]) -> String {
    let capacity = base64::encoded_len(bytes.len(), true).unwrap_or_default();
    let mut encoded = String::with_capacity(capacity);
    for chunk in bytes.chunks(ENCODE_CHUNK_BYTES) {
        STANDARD.encode_string(chunk, &mut encoded);
    }
    encoded
}

pub fn decode(text: &str) -> Result<Vec<u8>, AttachmentDecodeError> {
    let text = text.trim().as_bytes();
    let mut decoded = Vec::with_capacity(text.len() / 4 * 3);
    for (index, chunk) in text.chunks(DECODE_CHUNK_CHARS).enumerate() {
        STANDARD
            .decode_vec(chunk, &mut decoded)
            .map_err(|source| AttachmentDecodeError {
                offset: index * DECODE_CHUNK_CHARS,
                source,
            })?;
    }
    Ok(decoded)
}
