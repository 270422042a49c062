use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::composer::SubmissionComposer;
use super::domain::CorrelationId;
use super::gateway::{PaymentGateway, RelayGateway};
use super::orchestrator::{SubmitOrchestrator, SubmitOutcome};
use super::steps::{StepError, StepId};
use super::wizard::{WizardController, WizardState};

const INTERRUPTED_SUBMIT_BANNER: &str =
    "Your previous attempt was interrupted. Check your details and submit again.";

/// How correlation ids are chosen across attempts within one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CorrelationPolicy {
    /// Every attempt mints a new id, so every retry is a new relay record.
    #[default]
    FreshPerAttempt,
    /// A failed attempt's id is reused by the next attempt in the same session.
    ReuseWithinSession,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Step(#[from] StepError),
    #[error("finish the {} step before submitting", .0.label())]
    NotOnFinalStep(StepId),
    #[error("this booking has already been submitted")]
    AlreadySubmitted,
}

/// One booking form instance: its wizard, composer and orchestrator.
pub struct BookingSession<R, P> {
    wizard: WizardController,
    composer: SubmissionComposer,
    orchestrator: SubmitOrchestrator<R, P>,
    correlation_policy: CorrelationPolicy,
    retry_correlation: Option<CorrelationId>,
}

impl<R, P> BookingSession<R, P>
where
    R: RelayGateway,
    P: PaymentGateway,
{
    pub fn new(
        wizard: WizardController,
        composer: SubmissionComposer,
        orchestrator: SubmitOrchestrator<R, P>,
        correlation_policy: CorrelationPolicy,
    ) -> Self {
        Self {
            wizard,
            composer,
            orchestrator,
            correlation_policy,
            retry_correlation: None,
        }
    }

    pub fn wizard(&self) -> &WizardController {
        &self.wizard
    }

    pub fn wizard_mut(&mut self) -> &mut WizardController {
        &mut self.wizard
    }

    pub fn orchestrator(&self) -> &SubmitOrchestrator<R, P> {
        &self.orchestrator
    }

    pub async fn submit(&mut self) -> Result<SubmitOutcome, SessionError> {
        self.submit_until(&CancellationToken::new()).await
    }

    /// Validate the final step, compose a record and run the two-phase protocol.
    pub async fn submit_until(
        &mut self,
        abandon: &CancellationToken,
    ) -> Result<SubmitOutcome, SessionError> {
        if self.orchestrator.is_in_flight() {
            return Ok(SubmitOutcome::AlreadyInFlight);
        }

        let state = self.wizard.state().clone();
        match state {
            WizardState::Submitting => {
                // A previous submit future was dropped before it finished.
                warn!("re-arming wizard left in submitting state");
                self.wizard.fail(INTERRUPTED_SUBMIT_BANNER.to_string());
            }
            WizardState::Done { .. } => return Err(SessionError::AlreadySubmitted),
            WizardState::Step(step) if step != StepId::LAST => {
                return Err(SessionError::NotOnFinalStep(step))
            }
            WizardState::Step(_) | WizardState::Failed { .. } => {}
        }

        self.wizard.advance()?;

        let record = match (self.correlation_policy, self.retry_correlation) {
            (CorrelationPolicy::ReuseWithinSession, Some(id)) => {
                self.composer.compose_with_id(self.wizard.draft(), id)
            }
            _ => self.composer.compose(self.wizard.draft()),
        };
        let correlation_id = record.correlation_id;

        let outcome = self.orchestrator.submit_until(record, abandon).await;
        match &outcome {
            SubmitOutcome::Redirect(handoff) => {
                self.retry_correlation = None;
                self.wizard.complete(handoff.redirect_url.clone());
            }
            SubmitOutcome::Failed(failure) => {
                if self.correlation_policy == CorrelationPolicy::ReuseWithinSession {
                    self.retry_correlation = Some(correlation_id);
                }
                let banner = self.orchestrator.banner_for(failure);
                self.wizard.fail(banner);
            }
            SubmitOutcome::AlreadyInFlight => {
                self.wizard.fail(INTERRUPTED_SUBMIT_BANNER.to_string());
            }
        }

        Ok(outcome)
    }
}
