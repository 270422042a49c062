use serde::Serialize;

use super::consent::ConsentGate;
use super::domain::{BookingDraft, DraftField};

/// Ordered wizard steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Contact,
    Identity,
    Documents,
    NotesAndConsent,
}

impl StepId {
    pub const ALL: [StepId; 4] = [
        StepId::Contact,
        StepId::Identity,
        StepId::Documents,
        StepId::NotesAndConsent,
    ];
    pub const FIRST: StepId = StepId::Contact;
    pub const LAST: StepId = StepId::NotesAndConsent;

    /// One-based position shown in the progress header.
    pub const fn number(self) -> u8 {
        match self {
            StepId::Contact => 1,
            StepId::Identity => 2,
            StepId::Documents => 3,
            StepId::NotesAndConsent => 4,
        }
    }

    pub const fn next(self) -> Option<StepId> {
        match self {
            StepId::Contact => Some(StepId::Identity),
            StepId::Identity => Some(StepId::Documents),
            StepId::Documents => Some(StepId::NotesAndConsent),
            StepId::NotesAndConsent => None,
        }
    }

    pub const fn previous(self) -> Option<StepId> {
        match self {
            StepId::Contact => None,
            StepId::Identity => Some(StepId::Contact),
            StepId::Documents => Some(StepId::Identity),
            StepId::NotesAndConsent => Some(StepId::Documents),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            StepId::Contact => "contact",
            StepId::Identity => "identity",
            StepId::Documents => "documents",
            StepId::NotesAndConsent => "notes_and_consent",
        }
    }
}

/// First failing field of a step; the form shows one error at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct StepError {
    pub step: StepId,
    pub field: DraftField,
    pub message: String,
}

impl StepError {
    fn new(step: StepId, field: DraftField, message: impl Into<String>) -> Self {
        Self {
            step,
            field,
            message: message.into(),
        }
    }
}

/// Check the required fields of `step` against the draft.
pub fn validate_step(step: StepId, draft: &BookingDraft) -> Result<(), StepError> {
    match step {
        StepId::Contact => {
            let contact = &draft.contact;
            require(step, &contact.first_name, DraftField::FirstName, "Enter your first name")?;
            require(step, &contact.last_name, DraftField::LastName, "Enter your last name")?;
            require(step, &contact.email, DraftField::Email, "Enter your email address")?;
            require(step, &contact.phone, DraftField::Phone, "Enter your phone number")
        }
        StepId::Identity => {
            let identity = &draft.identity;
            require(
                step,
                &identity.date_of_birth,
                DraftField::DateOfBirth,
                "Enter your date of birth",
            )?;
            require(
                step,
                &identity.place_of_birth,
                DraftField::PlaceOfBirth,
                "Enter your place of birth",
            )?;
            require(
                step,
                &identity.country_of_birth,
                DraftField::CountryOfBirth,
                "Enter your country of birth",
            )?;
            require(
                step,
                &identity.nationality,
                DraftField::Nationality,
                "Enter your nationality",
            )?;
            require(
                step,
                &identity.passport_number,
                DraftField::PassportNumber,
                "Enter your passport number",
            )?;
            require(
                step,
                &identity.passport_expiry,
                DraftField::PassportExpiry,
                "Enter your passport expiry date",
            )?;
            if !identity.prior_refusal.is_answered() {
                return Err(StepError::new(
                    step,
                    DraftField::PriorRefusal,
                    "Tell us whether you have ever been refused a visa",
                ));
            }
            Ok(())
        }
        // The attachment is optional.
        StepId::Documents => Ok(()),
        StepId::NotesAndConsent => {
            require(
                step,
                &draft.notes,
                DraftField::Notes,
                "Tell us briefly about your trip and what you need help with",
            )?;
            match ConsentGate::first_missing(&draft.consent) {
                Some(kind) => Err(StepError::new(step, kind.field(), kind.prompt())),
                None => Ok(()),
            }
        }
    }
}

/// Validate every step up to and including `last`, in order.
pub fn validate_through(last: StepId, draft: &BookingDraft) -> Result<(), StepError> {
    StepId::ALL
        .into_iter()
        .take_while(|step| *step <= last)
        .try_for_each(|step| validate_step(step, draft))
}

fn require(step: StepId, value: &str, field: DraftField, message: &str) -> Result<(), StepError> {
    if value.trim().is_empty() {
        Err(StepError::new(step, field, message))
    } else {
        Ok(())
    }
}
