use tracing::debug;

use super::attachments::{AttachmentCandidate, AttachmentPolicy, AttachmentRejection};
use super::domain::BookingDraft;
use super::steps::{validate_step, validate_through, StepError, StepId};

/// Where the form currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardState {
    Step(StepId),
    Submitting,
    Done { redirect_url: String },
    /// Submission failed; the final step is shown again with `reason` as a banner.
    Failed { reason: String },
}

impl WizardState {
    /// Step rendered for this state, if any.
    pub fn visible_step(&self) -> Option<StepId> {
        match self {
            WizardState::Step(step) => Some(*step),
            WizardState::Failed { .. } => Some(StepId::LAST),
            WizardState::Submitting | WizardState::Done { .. } => None,
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, WizardState::Submitting)
    }
}

#[derive(Debug)]
enum WizardEvent {
    Advance,
    Retreat,
    SubmitSucceeded { redirect_url: String },
    SubmitFailed { reason: String },
}

/// Step-by-step controller owning the draft for one form session.
#[derive(Debug)]
pub struct WizardController {
    state: WizardState,
    draft: BookingDraft,
    policy: AttachmentPolicy,
    last_error: Option<StepError>,
}

impl WizardController {
    pub fn new(policy: AttachmentPolicy) -> Self {
        Self::with_draft(policy, BookingDraft::default())
    }

    /// Start at the first step with a prefilled draft.
    pub fn with_draft(policy: AttachmentPolicy, draft: BookingDraft) -> Self {
        Self {
            state: WizardState::Step(StepId::FIRST),
            draft,
            policy,
            last_error: None,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut BookingDraft {
        &mut self.draft
    }

    pub fn attachment_policy(&self) -> &AttachmentPolicy {
        &self.policy
    }

    /// Error from the most recent rejected `advance`, cleared by the next successful one.
    pub fn last_error(&self) -> Option<&StepError> {
        self.last_error.as_ref()
    }

    pub fn banner(&self) -> Option<&str> {
        match &self.state {
            WizardState::Failed { reason } => Some(reason.as_str()),
            _ => None,
        }
    }

    /// Validate the visible step and move forward, or to `Submitting` from the last step.
    pub fn advance(&mut self) -> Result<&WizardState, StepError> {
        self.apply(WizardEvent::Advance)?;
        Ok(&self.state)
    }

    /// Move back one step. Never validates and never touches the draft.
    pub fn retreat(&mut self) -> &WizardState {
        // Retreat cannot fail.
        let _ = self.apply(WizardEvent::Retreat);
        &self.state
    }

    /// Validate and keep a candidate file. A rejected file also clears any earlier attachment.
    pub fn attach(&mut self, candidate: AttachmentCandidate) -> Result<(), AttachmentRejection> {
        match self.policy.validate(&candidate) {
            Ok(()) => {
                self.draft.attachment = Some(candidate);
                Ok(())
            }
            Err(rejection) => {
                self.draft.attachment = None;
                Err(rejection)
            }
        }
    }

    pub fn detach(&mut self) {
        self.draft.attachment = None;
    }

    pub(crate) fn complete(&mut self, redirect_url: String) {
        let _ = self.apply(WizardEvent::SubmitSucceeded { redirect_url });
    }

    pub(crate) fn fail(&mut self, reason: String) {
        let _ = self.apply(WizardEvent::SubmitFailed { reason });
    }

    fn apply(&mut self, event: WizardEvent) -> Result<(), StepError> {
        let current = self.state.clone();
        let next = match (current, event) {
            (WizardState::Step(step), WizardEvent::Advance) => {
                self.check(step)?;
                match step.next() {
                    Some(next) => WizardState::Step(next),
                    None => WizardState::Submitting,
                }
            }
            (WizardState::Failed { .. }, WizardEvent::Advance) => {
                self.check(StepId::LAST)?;
                WizardState::Submitting
            }
            (WizardState::Step(step), WizardEvent::Retreat) => {
                WizardState::Step(step.previous().unwrap_or(step))
            }
            (WizardState::Failed { .. }, WizardEvent::Retreat) => {
                WizardState::Step(StepId::LAST.previous().unwrap_or(StepId::LAST))
            }
            (WizardState::Submitting, WizardEvent::SubmitSucceeded { redirect_url }) => {
                self.draft = BookingDraft::default();
                WizardState::Done { redirect_url }
            }
            (WizardState::Submitting, WizardEvent::SubmitFailed { reason }) => {
                WizardState::Failed { reason }
            }
            (state, event) => {
                debug!(?state, ?event, "wizard event ignored");
                state
            }
        };

        self.state = next;
        Ok(())
    }

    fn check(&mut self, step: StepId) -> Result<(), StepError> {
        // Leaving the last step re-checks every earlier step as well.
        let result = if step == StepId::LAST {
            validate_through(step, &self.draft)
        } else {
            validate_step(step, &self.draft)
        };

        match result {
            Ok(()) => {
                self.last_error = None;
                Ok(())
            }
            Err(error) => {
                self.last_error = Some(error.clone());
                Err(error)
            }
        }
    }
}
