use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::attachments::AttachmentCandidate;

/// Paid services sold through the booking forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceKind {
    VisaHelp,
    Translation,
    FamilyTravelCheck,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 3] = [
        ServiceKind::VisaHelp,
        ServiceKind::Translation,
        ServiceKind::FamilyTravelCheck,
    ];

    /// Stable identifier shared with the relay and payment provider.
    pub const fn identifier(self) -> &'static str {
        match self {
            ServiceKind::VisaHelp => "visa-help",
            ServiceKind::Translation => "translation",
            ServiceKind::FamilyTravelCheck => "family-travel-check",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown service '{0}'")]
pub struct UnknownService(pub String);

impl FromStr for ServiceKind {
    type Err = UnknownService;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim().to_ascii_lowercase();
        ServiceKind::ALL
            .into_iter()
            .find(|kind| kind.identifier() == wanted)
            .ok_or_else(|| UnknownService(raw.to_string()))
    }
}

/// Join key between the relay record and its payment session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    pub fn mint() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Step 1 fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl ContactDetails {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// Answer to a yes/no question that starts out unanswered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    #[default]
    Unanswered,
    Yes,
    No,
}

impl Answer {
    pub const fn is_answered(self) -> bool {
        !matches!(self, Answer::Unanswered)
    }

    pub const fn as_bool(self) -> Option<bool> {
        match self {
            Answer::Yes => Some(true),
            Answer::No => Some(false),
            Answer::Unanswered => None,
        }
    }
}

/// Step 2 fields. Dates are kept as entered (`YYYY-MM-DD` from the date inputs).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityDetails {
    pub date_of_birth: String,
    pub place_of_birth: String,
    pub country_of_birth: String,
    pub nationality: String,
    pub passport_number: String,
    pub passport_expiry: String,
    /// Whether the applicant was previously refused a visa.
    pub prior_refusal: Answer,
}

/// The three acknowledgements required before any data leaves the form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsentFlags {
    pub start_now_authorized: bool,
    pub refund_policy_accepted: bool,
    pub data_processing_consent: bool,
}

/// In-progress state of one form session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingDraft {
    pub contact: ContactDetails,
    pub identity: IdentityDetails,
    #[serde(skip)]
    pub attachment: Option<AttachmentCandidate>,
    pub notes: String,
    pub consent: ConsentFlags,
}

/// Draft fields addressable by validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftField {
    FirstName,
    LastName,
    Email,
    Phone,
    DateOfBirth,
    PlaceOfBirth,
    CountryOfBirth,
    Nationality,
    PassportNumber,
    PassportExpiry,
    PriorRefusal,
    Notes,
    StartNowAuthorized,
    RefundPolicyAccepted,
    DataProcessingConsent,
}
