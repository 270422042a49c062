use std::path::PathBuf;

use booking_intake::config::load_attachment_policy;
use booking_intake::error::AppError;
use booking_intake::workflows::booking::{AttachmentCandidate, AttachmentPolicy};
use clap::Args;

#[derive(Args, Debug)]
pub(crate) struct CheckAttachmentArgs {
    /// File to check
    pub(crate) path: PathBuf,
    /// Size ceiling in bytes, overriding BOOKING_MAX_ATTACHMENT_BYTES; the ceiling itself is accepted
    #[arg(long)]
    pub(crate) max_bytes: Option<u64>,
}

pub(crate) async fn check_attachment(args: CheckAttachmentArgs) -> Result<(), AppError> {
    let policy = effective_policy(load_attachment_policy()?, args.max_bytes);
    let candidate = AttachmentCandidate::read_from_path(&args.path).await?;

    let verdict = policy.validate(&candidate);
    let summary = serde_json::json!({
        "fileName": candidate.file_name,
        "mediaType": candidate.media_type,
        "size": candidate.size,
        "accepted": verdict.is_ok(),
    });
    println!("{summary}");

    verdict.map_err(AppError::from)
}

/// Configured policy, with only the size ceiling replaced when `--max-bytes` is given.
fn effective_policy(configured: AttachmentPolicy, max_bytes: Option<u64>) -> AttachmentPolicy {
    match max_bytes {
        Some(max_bytes) => AttachmentPolicy::new(max_bytes, configured.allowed_media_types()),
        None => configured,
    }
}
