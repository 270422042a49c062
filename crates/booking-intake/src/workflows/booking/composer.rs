use chrono::{DateTime, Utc};
use serde::Serialize;

use super::attachments::AttachmentPayload;
use super::domain::{
    BookingDraft, ConsentFlags, ContactDetails, CorrelationId, IdentityDetails, ServiceKind,
};

/// Structured step answers as sent to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionAnswers {
    pub date_of_birth: String,
    pub place_of_birth: String,
    pub country_of_birth: String,
    pub nationality: String,
    pub passport_number: String,
    pub passport_expiry: String,
    pub prior_visa_refusal: Option<bool>,
    pub notes: String,
    pub start_now_authorized: bool,
    pub refund_policy_accepted: bool,
    pub data_processing_consent: bool,
    pub policy_version: String,
}

/// Immutable payload for one submit attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRecord {
    pub correlation_id: CorrelationId,
    pub service: ServiceKind,
    pub contact: ContactDetails,
    pub answers: SubmissionAnswers,
    pub attachments: Vec<AttachmentPayload>,
    pub consent: ConsentFlags,
    pub policy_version: String,
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionRecord {
    pub fn display_name(&self) -> String {
        self.contact.display_name()
    }
}

/// Builds submission records for one service form.
#[derive(Debug, Clone)]
pub struct SubmissionComposer {
    service: ServiceKind,
    policy_version: String,
}

impl SubmissionComposer {
    pub fn new(service: ServiceKind, policy_version: impl Into<String>) -> Self {
        Self {
            service,
            policy_version: policy_version.into(),
        }
    }

    pub fn service(&self) -> ServiceKind {
        self.service
    }

    /// Compose a record under a freshly minted correlation id.
    pub fn compose(&self, draft: &BookingDraft) -> SubmissionRecord {
        self.compose_with_id(draft, CorrelationId::mint())
    }

    /// Compose a record under a caller-chosen id. Every draft field is cloned.
    pub fn compose_with_id(
        &self,
        draft: &BookingDraft,
        correlation_id: CorrelationId,
    ) -> SubmissionRecord {
        let IdentityDetails {
            date_of_birth,
            place_of_birth,
            country_of_birth,
            nationality,
            passport_number,
            passport_expiry,
            prior_refusal,
        } = draft.identity.clone();
        let consent = draft.consent;

        let answers = SubmissionAnswers {
            date_of_birth,
            place_of_birth,
            country_of_birth,
            nationality,
            passport_number,
            passport_expiry,
            prior_visa_refusal: prior_refusal.as_bool(),
            notes: draft.notes.clone(),
            start_now_authorized: consent.start_now_authorized,
            refund_policy_accepted: consent.refund_policy_accepted,
            data_processing_consent: consent.data_processing_consent,
            policy_version: self.policy_version.clone(),
        };

        let attachments = draft
            .attachment
            .iter()
            .map(AttachmentPayload::from_candidate)
            .collect();

        SubmissionRecord {
            correlation_id,
            service: self.service,
            contact: draft.contact.clone(),
            answers,
            attachments,
            consent,
            policy_version: self.policy_version.clone(),
            submitted_at: Utc::now(),
        }
    }
}
