//! Service-booking intake: a four-step wizard, optional document upload, and the
//! persist-then-pay submission protocol shared by every paid service form.

pub mod attachments;
mod composer;
mod consent;
pub mod domain;
pub mod gateway;
pub mod http;
mod orchestrator;
mod session;
mod steps;
mod wizard;

#[cfg(test)]
mod tests;

pub use attachments::{
    AttachmentCandidate, AttachmentPayload, AttachmentPolicy, AttachmentRejection,
    DEFAULT_ALLOWED_MEDIA_TYPES, DEFAULT_MAX_ATTACHMENT_BYTES,
};
pub use composer::{SubmissionAnswers, SubmissionComposer, SubmissionRecord};
pub use consent::{ConsentGate, ConsentKind};
pub use domain::{
    Answer, BookingDraft, ConsentFlags, ContactDetails, CorrelationId, DraftField,
    IdentityDetails, ServiceKind, UnknownService,
};
pub use gateway::{
    PaymentError, PaymentGateway, PaymentSessionRequest, PaymentSessionResponse, RelayError,
    RelayGateway,
};
pub use http::{
    GatewayBuildError, HttpPaymentGateway, HttpRelayGateway, PaymentEndpoint, RelayEndpoint,
};
pub use orchestrator::{
    OrchestratorConfig, PaymentHandoff, SubmitFailure, SubmitOrchestrator, SubmitOutcome,
    SubmitPhase, SubmitTerminal,
};
pub use session::{BookingSession, CorrelationPolicy, SessionError};
pub use steps::{validate_step, StepError, StepId};
pub use wizard::{WizardController, WizardState};
