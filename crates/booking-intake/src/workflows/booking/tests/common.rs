use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::workflows::booking::attachments::{AttachmentCandidate, AttachmentPolicy};
use crate::workflows::booking::composer::{SubmissionComposer, SubmissionRecord};
use crate::workflows::booking::domain::{
    Answer, BookingDraft, ConsentFlags, ContactDetails, IdentityDetails, ServiceKind,
};
use crate::workflows::booking::gateway::{
    PaymentError, PaymentGateway, PaymentSessionRequest, PaymentSessionResponse, RelayError,
    RelayGateway,
};
use crate::workflows::booking::orchestrator::{OrchestratorConfig, SubmitOrchestrator};
use crate::workflows::booking::session::{BookingSession, CorrelationPolicy};
use crate::workflows::booking::wizard::WizardController;

pub(super) const MIB: usize = 1024 * 1024;
pub(super) const CHECKOUT_URL: &str = "https://pay.example.com/checkout/cs_test_123";
pub(super) const SUPPORT_CONTACT: &str = "help@visa-desk.example";

pub(super) fn complete_draft() -> BookingDraft {
    BookingDraft {
        contact: ContactDetails {
            first_name: "Amara".to_string(),
            last_name: "Okafor".to_string(),
            email: "amara.okafor@example.com".to_string(),
            phone: "+44 20 7946 0958".to_string(),
        },
        identity: IdentityDetails {
            date_of_birth: "1990-04-12".to_string(),
            place_of_birth: "Lagos".to_string(),
            country_of_birth: "Nigeria".to_string(),
            nationality: "Nigerian".to_string(),
            passport_number: "A12345678".to_string(),
            passport_expiry: "2031-09-30".to_string(),
            prior_refusal: Answer::No,
        },
        attachment: None,
        notes: "Schengen visit visa for a conference in Berlin in March.".to_string(),
        consent: ConsentFlags {
            start_now_authorized: true,
            refund_policy_accepted: true,
            data_processing_consent: true,
        },
    }
}

pub(super) fn pdf_candidate(size: usize) -> AttachmentCandidate {
    let mut bytes = b"%PDF-1.7\n".to_vec();
    bytes.resize(size, 0x20);
    AttachmentCandidate::new("passport.pdf", "application/pdf", bytes)
}

pub(super) fn png_candidate(size: usize) -> AttachmentCandidate {
    AttachmentCandidate::new("photo.png", "image/png", vec![0x89; size])
}

pub(super) fn composer() -> SubmissionComposer {
    SubmissionComposer::new(ServiceKind::VisaHelp, "2024-06")
}

pub(super) fn record_for(draft: &BookingDraft) -> SubmissionRecord {
    composer().compose(draft)
}

pub(super) fn orchestrator_config() -> OrchestratorConfig {
    OrchestratorConfig {
        relay_timeout: Duration::from_secs(2),
        payment_timeout: Duration::from_secs(2),
        support_contact: SUPPORT_CONTACT.to_string(),
    }
}

/// Ordered log of remote calls shared by both fakes.
#[derive(Debug, Default, Clone)]
pub(super) struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    fn push(&self, entry: String) {
        self.entries.lock().expect("log mutex poisoned").push(entry);
    }

    pub(super) fn entries(&self) -> Vec<String> {
        self.entries.lock().expect("log mutex poisoned").clone()
    }
}

pub(super) enum RelayBehavior {
    Acknowledge,
    Transport,
    Reject(Option<String>),
    Hang,
    WaitFor(Arc<Notify>),
}

pub(super) struct FakeRelay {
    behavior: RelayBehavior,
    log: CallLog,
    records: Mutex<Vec<SubmissionRecord>>,
}

impl FakeRelay {
    pub(super) fn new(behavior: RelayBehavior, log: &CallLog) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            log: log.clone(),
            records: Mutex::new(Vec::new()),
        })
    }

    pub(super) fn records(&self) -> Vec<SubmissionRecord> {
        self.records.lock().expect("relay mutex poisoned").clone()
    }
}

#[async_trait]
impl RelayGateway for FakeRelay {
    async fn persist(&self, record: &SubmissionRecord) -> Result<(), RelayError> {
        self.log.push(format!("relay:{}", record.correlation_id));
        self.records
            .lock()
            .expect("relay mutex poisoned")
            .push(record.clone());

        match &self.behavior {
            RelayBehavior::Acknowledge => Ok(()),
            RelayBehavior::Transport => Err(RelayError::Transport("connection refused".to_string())),
            RelayBehavior::Reject(message) => Err(RelayError::Rejected {
                message: message.clone(),
            }),
            RelayBehavior::Hang => std::future::pending().await,
            RelayBehavior::WaitFor(gate) => {
                gate.notified().await;
                Ok(())
            }
        }
    }
}

pub(super) enum PaymentBehavior {
    Url(String),
    MissingUrl,
    Transport,
    Hang,
}

pub(super) struct FakePayment {
    behavior: PaymentBehavior,
    log: CallLog,
    requests: Mutex<Vec<PaymentSessionRequest>>,
}

impl FakePayment {
    pub(super) fn new(behavior: PaymentBehavior, log: &CallLog) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            log: log.clone(),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(super) fn checkout(log: &CallLog) -> Arc<Self> {
        Self::new(PaymentBehavior::Url(CHECKOUT_URL.to_string()), log)
    }

    pub(super) fn requests(&self) -> Vec<PaymentSessionRequest> {
        self.requests.lock().expect("payment mutex poisoned").clone()
    }
}

#[async_trait]
impl PaymentGateway for FakePayment {
    async fn create_session(
        &self,
        request: &PaymentSessionRequest,
    ) -> Result<PaymentSessionResponse, PaymentError> {
        self.log.push(format!("payment:{}", request.correlation_id));
        self.requests
            .lock()
            .expect("payment mutex poisoned")
            .push(request.clone());

        match &self.behavior {
            PaymentBehavior::Url(url) => Ok(PaymentSessionResponse {
                url: Some(url.clone()),
            }),
            PaymentBehavior::MissingUrl => Ok(PaymentSessionResponse { url: None }),
            PaymentBehavior::Transport => Err(PaymentError::Transport("dns failure".to_string())),
            PaymentBehavior::Hang => std::future::pending().await,
        }
    }
}

pub(super) fn orchestrator(
    relay: &Arc<FakeRelay>,
    payment: &Arc<FakePayment>,
) -> SubmitOrchestrator<FakeRelay, FakePayment> {
    SubmitOrchestrator::new(relay.clone(), payment.clone(), orchestrator_config())
}

/// Session whose wizard sits on the final step with `draft` filled in.
pub(super) fn session_at_final_step(
    draft: BookingDraft,
    relay: &Arc<FakeRelay>,
    payment: &Arc<FakePayment>,
    policy: CorrelationPolicy,
) -> BookingSession<FakeRelay, FakePayment> {
    let mut wizard = WizardController::with_draft(AttachmentPolicy::default(), draft);
    for _ in 0..3 {
        wizard.advance().expect("earlier steps are valid");
    }
    BookingSession::new(wizard, composer(), orchestrator(relay, payment), policy)
}
