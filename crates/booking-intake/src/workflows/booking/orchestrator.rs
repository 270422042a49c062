//! Two-phase submit: persist with the relay, then request a payment session.
//!
//! The two services cannot share a transaction, so the protocol runs as a saga
//! with a strict order. Phase 2 is never started unless phase 1 was
//! acknowledged, which guarantees nobody pays for a submission that was not
//! recorded. There is deliberately no compensating step: when persist succeeds
//! and payment setup fails, the relay keeps an unpaid lead. That inconsistency
//! is accepted; the user is told their details were saved and may resubmit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::composer::SubmissionRecord;
use super::consent::{ConsentGate, ConsentKind};
use super::domain::CorrelationId;
use super::gateway::{
    PaymentGateway, PaymentSessionRequest, PaymentSessionResponse, RelayError, RelayGateway,
};

const DEFAULT_RELAY_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_PAYMENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeouts and the contact named in payment-failure banners.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub relay_timeout: Duration,
    pub payment_timeout: Duration,
    pub support_contact: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            relay_timeout: DEFAULT_RELAY_TIMEOUT,
            payment_timeout: DEFAULT_PAYMENT_TIMEOUT,
            support_contact: "support@example.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitPhase {
    Idle,
    PersistingRecord,
    RequestingPayment,
    Redirecting,
    Terminal(SubmitTerminal),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitTerminal {
    Success { redirect_url: String },
    Error(SubmitFailure),
}

/// Checkout URL the browser is sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentHandoff {
    pub correlation_id: CorrelationId,
    pub redirect_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Redirect(PaymentHandoff),
    Failed(SubmitFailure),
    /// Another attempt was still running; nothing was sent.
    AlreadyInFlight,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitFailure {
    #[error("consent not given: {0:?}")]
    ConsentMissing(ConsentKind),
    #[error("relay unreachable: {0}")]
    RelayUnavailable(String),
    #[error("relay did not answer within {0:?}")]
    RelayTimedOut(Duration),
    #[error("relay rejected the submission: {}", .message.as_deref().unwrap_or("no reason given"))]
    RelayRejected { message: Option<String> },
    #[error("payment provider unreachable: {0}")]
    PaymentUnavailable(String),
    #[error("payment provider did not answer within {0:?}")]
    PaymentTimedOut(Duration),
    #[error("payment session response carried no URL")]
    PaymentUrlMissing,
    #[error("payment session URL is not a web address: {0}")]
    PaymentUrlInvalid(String),
    #[error("submission abandoned by the user")]
    Abandoned { record_saved: bool },
}

impl SubmitFailure {
    /// Whether the relay had already acknowledged the record.
    pub fn record_saved(&self) -> bool {
        match self {
            SubmitFailure::PaymentUnavailable(_)
            | SubmitFailure::PaymentTimedOut(_)
            | SubmitFailure::PaymentUrlMissing
            | SubmitFailure::PaymentUrlInvalid(_) => true,
            SubmitFailure::Abandoned { record_saved } => *record_saved,
            SubmitFailure::ConsentMissing(_)
            | SubmitFailure::RelayUnavailable(_)
            | SubmitFailure::RelayTimedOut(_)
            | SubmitFailure::RelayRejected { .. } => false,
        }
    }

    /// Banner text shown above the final step.
    pub fn user_message(&self, support_contact: &str) -> String {
        match self {
            SubmitFailure::ConsentMissing(kind) => kind.prompt().to_string(),
            SubmitFailure::RelayUnavailable(_) | SubmitFailure::RelayTimedOut(_) => {
                "We could not reach our booking service, so your request was not sent. \
                 Check your connection and try again."
                    .to_string()
            }
            SubmitFailure::RelayRejected { message } => message
                .clone()
                .unwrap_or_else(|| "We could not save your request. Please try again.".to_string()),
            SubmitFailure::PaymentUnavailable(_)
            | SubmitFailure::PaymentTimedOut(_)
            | SubmitFailure::PaymentUrlMissing
            | SubmitFailure::PaymentUrlInvalid(_) => format!(
                "Your information has been saved, but we could not set up the payment. \
                 Please try again or contact us at {support_contact}."
            ),
            SubmitFailure::Abandoned {
                record_saved: false,
            } => "Submission cancelled. Your request may not have been saved; you can submit again."
                .to_string(),
            SubmitFailure::Abandoned { record_saved: true } => {
                "Submission cancelled. Your information has been saved; submit again to continue \
                 to payment."
                    .to_string()
            }
        }
    }
}

/// Clears the in-flight flag even when the submit future is dropped, and closes out a
/// phase the dropped attempt left open.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
    phase: &'a watch::Sender<SubmitPhase>,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool, phase: &'a watch::Sender<SubmitPhase>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag, phase })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.phase.send_if_modified(|phase| {
            let record_saved = match phase {
                SubmitPhase::Idle | SubmitPhase::Terminal(_) => return false,
                SubmitPhase::PersistingRecord => false,
                SubmitPhase::RequestingPayment | SubmitPhase::Redirecting => true,
            };
            warn!(record_saved, "submit dropped before it finished");
            *phase = SubmitPhase::Terminal(SubmitTerminal::Error(SubmitFailure::Abandoned {
                record_saved,
            }));
            true
        });
        self.flag.store(false, Ordering::Release);
    }
}

/// Runs the persist-then-pay protocol for one form instance.
pub struct SubmitOrchestrator<R, P> {
    relay: Arc<R>,
    payment: Arc<P>,
    config: OrchestratorConfig,
    in_flight: AtomicBool,
    phase: watch::Sender<SubmitPhase>,
}

impl<R, P> SubmitOrchestrator<R, P>
where
    R: RelayGateway,
    P: PaymentGateway,
{
    pub fn new(relay: Arc<R>, payment: Arc<P>, config: OrchestratorConfig) -> Self {
        let (phase, _) = watch::channel(SubmitPhase::Idle);
        Self {
            relay,
            payment,
            config,
            in_flight: AtomicBool::new(false),
            phase,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn phase(&self) -> SubmitPhase {
        self.phase.borrow().clone()
    }

    /// Phase updates for a progress indicator.
    pub fn subscribe(&self) -> watch::Receiver<SubmitPhase> {
        self.phase.subscribe()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn banner_for(&self, failure: &SubmitFailure) -> String {
        failure.user_message(&self.config.support_contact)
    }

    pub async fn submit(&self, record: SubmissionRecord) -> SubmitOutcome {
        self.submit_until(record, &CancellationToken::new()).await
    }

    /// Run the protocol, giving up at the next await point once `abandon` fires.
    ///
    /// An abandoned relay call may still land on the relay; that leaves an orphaned
    /// record but never a charge.
    pub async fn submit_until(
        &self,
        record: SubmissionRecord,
        abandon: &CancellationToken,
    ) -> SubmitOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight, &self.phase) else {
            debug!(correlation_id = %record.correlation_id, "submit ignored while in flight");
            return SubmitOutcome::AlreadyInFlight;
        };

        match self.run(&record, abandon).await {
            Ok(handoff) => {
                info!(
                    correlation_id = %handoff.correlation_id,
                    service = %record.service,
                    "payment session ready, redirecting"
                );
                self.phase
                    .send_replace(SubmitPhase::Terminal(SubmitTerminal::Success {
                        redirect_url: handoff.redirect_url.clone(),
                    }));
                SubmitOutcome::Redirect(handoff)
            }
            Err(failure) => {
                warn!(
                    correlation_id = %record.correlation_id,
                    service = %record.service,
                    record_saved = failure.record_saved(),
                    error = %failure,
                    "submission failed"
                );
                self.phase
                    .send_replace(SubmitPhase::Terminal(SubmitTerminal::Error(failure.clone())));
                SubmitOutcome::Failed(failure)
            }
        }
    }

    async fn run(
        &self,
        record: &SubmissionRecord,
        abandon: &CancellationToken,
    ) -> Result<PaymentHandoff, SubmitFailure> {
        if let Some(kind) = ConsentGate::first_missing(&record.consent) {
            return Err(SubmitFailure::ConsentMissing(kind));
        }

        self.phase.send_replace(SubmitPhase::PersistingRecord);
        info!(
            correlation_id = %record.correlation_id,
            service = %record.service,
            attachments = record.attachments.len(),
            "persisting submission record"
        );

        let persisted = tokio::select! {
            biased;
            _ = abandon.cancelled() => {
                return Err(SubmitFailure::Abandoned { record_saved: false });
            }
            result = tokio::time::timeout(self.config.relay_timeout, self.relay.persist(record)) => result,
        };

        match persisted {
            Ok(Ok(())) => {}
            Ok(Err(RelayError::Transport(reason))) => {
                return Err(SubmitFailure::RelayUnavailable(reason))
            }
            Ok(Err(RelayError::Rejected { message })) => {
                return Err(SubmitFailure::RelayRejected { message })
            }
            Err(_) => return Err(SubmitFailure::RelayTimedOut(self.config.relay_timeout)),
        }

        // From here on the record exists remotely; failures only lose the payment step.
        self.phase.send_replace(SubmitPhase::RequestingPayment);
        let request = PaymentSessionRequest::for_record(record);

        let session = tokio::select! {
            biased;
            _ = abandon.cancelled() => {
                return Err(SubmitFailure::Abandoned { record_saved: true });
            }
            result = tokio::time::timeout(self.config.payment_timeout, self.payment.create_session(&request)) => result,
        };

        let response = match session {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => return Err(SubmitFailure::PaymentUnavailable(err.to_string())),
            Err(_) => return Err(SubmitFailure::PaymentTimedOut(self.config.payment_timeout)),
        };

        let redirect_url = checkout_url(response)?;
        self.phase.send_replace(SubmitPhase::Redirecting);

        Ok(PaymentHandoff {
            correlation_id: record.correlation_id,
            redirect_url,
        })
    }
}

fn checkout_url(response: PaymentSessionResponse) -> Result<String, SubmitFailure> {
    let raw = response
        .url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .ok_or(SubmitFailure::PaymentUrlMissing)?;

    match Url::parse(&raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(raw),
        _ => Err(SubmitFailure::PaymentUrlInvalid(raw)),
    }
}
