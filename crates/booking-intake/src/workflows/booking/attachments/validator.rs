use super::AttachmentCandidate;

const MIB: u64 = 1024 * 1024;

pub const DEFAULT_MAX_ATTACHMENT_BYTES: u64 = 5 * MIB;
pub const DEFAULT_ALLOWED_MEDIA_TYPES: [&str; 3] = ["application/pdf", "image/jpeg", "image/png"];

/// Reason a candidate file was turned away.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttachmentRejection {
    #[error("{file_name} is not a supported file type ({media_type}); allowed types: {allowed}")]
    UnsupportedType {
        file_name: String,
        media_type: String,
        allowed: String,
    },
    #[error(
        "{file_name} is too large ({}); the maximum file size is {}",
        human_size(.size),
        human_size(.max)
    )]
    TooLarge {
        file_name: String,
        size: u64,
        max: u64,
    },
}

/// Allowed media types and the per-file size ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPolicy {
    max_bytes: u64,
    allowed_media_types: Vec<String>,
}

impl AttachmentPolicy {
    pub fn new<I, S>(max_bytes: u64, allowed_media_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut allowed: Vec<String> = allowed_media_types
            .into_iter()
            .map(|value| normalize_media_type(value.as_ref()))
            .filter(|value| !value.is_empty())
            .collect();
        allowed.dedup();

        Self {
            max_bytes,
            allowed_media_types: allowed,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn allowed_media_types(&self) -> &[String] {
        &self.allowed_media_types
    }

    pub fn accepts_media_type(&self, media_type: &str) -> bool {
        let normalized = normalize_media_type(media_type);
        self.allowed_media_types
            .iter()
            .any(|allowed| *allowed == normalized)
    }

    /// Accept or reject a candidate. Never mutates it and never fails for malformed input.
    pub fn validate(&self, candidate: &AttachmentCandidate) -> Result<(), AttachmentRejection> {
        if !self.accepts_media_type(&candidate.media_type) {
            return Err(AttachmentRejection::UnsupportedType {
                file_name: candidate.file_name.clone(),
                media_type: candidate.media_type.clone(),
                allowed: self.allowed_media_types.join(", "),
            });
        }

        // The ceiling itself is allowed; there is no minimum size.
        if candidate.size > self.max_bytes {
            return Err(AttachmentRejection::TooLarge {
                file_name: candidate.file_name.clone(),
                size: candidate.size,
                max: self.max_bytes,
            });
        }

        Ok(())
    }
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTACHMENT_BYTES, DEFAULT_ALLOWED_MEDIA_TYPES)
    }
}

/// Lowercase, drop parameters, and fold common aliases.
pub(crate) fn normalize_media_type(raw: &str) -> String {
    let essence = raw
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        _ => essence,
    }
}

fn human_size(bytes: &u64) -> String {
    let bytes = *bytes;
    if bytes >= MIB {
        let mib = bytes as f64 / MIB as f64;
        if bytes % MIB == 0 {
            format!("{mib:.0} MiB")
        } else {
            format!("{mib:.1} MiB")
        }
    } else if bytes >= 1024 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} bytes")
    }
}
