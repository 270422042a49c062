use serde::Serialize;

use super::domain::{ConsentFlags, DraftField};

/// One of the mandatory acknowledgements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentKind {
    StartNowAuthorization,
    RefundPolicyAgreement,
    DataProcessingConsent,
}

impl ConsentKind {
    pub const fn field(self) -> DraftField {
        match self {
            ConsentKind::StartNowAuthorization => DraftField::StartNowAuthorized,
            ConsentKind::RefundPolicyAgreement => DraftField::RefundPolicyAccepted,
            ConsentKind::DataProcessingConsent => DraftField::DataProcessingConsent,
        }
    }

    pub const fn prompt(self) -> &'static str {
        match self {
            ConsentKind::StartNowAuthorization => {
                "Confirm that we may start working on your request right away"
            }
            ConsentKind::RefundPolicyAgreement => "Agree to the refund policy to continue",
            ConsentKind::DataProcessingConsent => {
                "Consent to the processing of your personal data to continue"
            }
        }
    }
}

/// Gate evaluated by the final wizard step and again right before submission.
pub struct ConsentGate;

impl ConsentGate {
    pub fn all_satisfied(flags: &ConsentFlags) -> bool {
        Self::first_missing(flags).is_none()
    }

    pub fn first_missing(flags: &ConsentFlags) -> Option<ConsentKind> {
        [
            (flags.start_now_authorized, ConsentKind::StartNowAuthorization),
            (flags.refund_policy_accepted, ConsentKind::RefundPolicyAgreement),
            (flags.data_processing_consent, ConsentKind::DataProcessingConsent),
        ]
        .into_iter()
        .find_map(|(granted, kind)| (!granted).then_some(kind))
    }
}
