use std::path::PathBuf;
use std::sync::Arc;

use booking_intake::config::AppConfig;
use booking_intake::error::AppError;
use booking_intake::telemetry;
use booking_intake::workflows::booking::{
    AttachmentCandidate, BookingDraft, BookingSession, HttpPaymentGateway, HttpRelayGateway,
    ServiceKind, SessionError, SubmissionComposer, SubmitOrchestrator, SubmitOutcome,
    WizardController, WizardState,
};
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub(crate) struct SubmitArgs {
    /// JSON file holding the contact, identity, notes and consent answers
    #[arg(long)]
    pub(crate) draft: PathBuf,
    /// Service being booked (visa-help, translation, family-travel-check)
    #[arg(long)]
    pub(crate) service: ServiceKind,
    /// Optional supporting document (PDF, JPEG or PNG)
    #[arg(long)]
    pub(crate) attachment: Option<PathBuf>,
}

pub(crate) async fn submit(args: SubmitArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let raw = tokio::fs::read_to_string(&args.draft).await?;
    let draft: BookingDraft = serde_json::from_str(&raw)?;

    let booking = &config.booking;
    let relay = HttpRelayGateway::new(booking.relay.clone())?;
    let payment = HttpPaymentGateway::new(booking.payment.clone())?;
    let orchestrator = SubmitOrchestrator::new(
        Arc::new(relay),
        Arc::new(payment),
        booking.orchestrator_config(),
    );

    let mut wizard = WizardController::with_draft(booking.attachment_policy(), draft);
    if let Some(path) = &args.attachment {
        let candidate = AttachmentCandidate::read_from_path(path).await?;
        wizard.attach(candidate)?;
    }

    while let &WizardState::Step(step) = wizard.state() {
        if step.next().is_none() {
            break;
        }
        wizard.advance().map_err(SessionError::from)?;
    }

    let mut session = BookingSession::new(
        wizard,
        SubmissionComposer::new(args.service, booking.policy_version.clone()),
        orchestrator,
        booking.correlation_policy(),
    );

    let abandon = CancellationToken::new();
    let on_interrupt = abandon.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, abandoning submission");
            on_interrupt.cancel();
        }
    });

    info!(?config.environment, service = %args.service, "submitting booking");
    let outcome = session.submit_until(&abandon).await?;

    match outcome {
        SubmitOutcome::Redirect(handoff) => {
            let summary = serde_json::json!({
                "status": "redirect",
                "submissionId": handoff.correlation_id.to_string(),
                "redirectUrl": handoff.redirect_url,
            });
            println!("{summary}");
            Ok(())
        }
        SubmitOutcome::Failed(failure) => Err(AppError::Submit {
            banner: session.orchestrator().banner_for(&failure),
            failure,
        }),
        SubmitOutcome::AlreadyInFlight => Err(AppError::Session(SessionError::AlreadySubmitted)),
    }
}
