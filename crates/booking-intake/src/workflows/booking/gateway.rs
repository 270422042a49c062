use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::composer::SubmissionRecord;
use super::domain::{CorrelationId, ServiceKind};

/// Durable store for submitted forms.
#[async_trait]
pub trait RelayGateway: Send + Sync {
    /// Persist one record. `Ok` means the relay acknowledged it.
    async fn persist(&self, record: &SubmissionRecord) -> Result<(), RelayError>;
}

/// Issuer of checkout sessions.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_session(
        &self,
        request: &PaymentSessionRequest,
    ) -> Result<PaymentSessionResponse, PaymentError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    /// No usable response arrived.
    #[error("relay unreachable: {0}")]
    Transport(String),
    /// The relay answered but did not acknowledge the record.
    #[error("relay rejected the submission: {}", .message.as_deref().unwrap_or("no reason given"))]
    Rejected { message: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentError {
    #[error("payment provider unreachable: {0}")]
    Transport(String),
    #[error("payment provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSessionRequest {
    #[serde(rename = "submissionId")]
    pub correlation_id: CorrelationId,
    pub service: ServiceKind,
    pub name: String,
    pub email: String,
}

impl PaymentSessionRequest {
    pub fn for_record(record: &SubmissionRecord) -> Self {
        Self {
            correlation_id: record.correlation_id,
            service: record.service,
            name: record.display_name(),
            email: record.contact.email.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PaymentSessionResponse {
    #[serde(default, alias = "sessionUrl")]
    pub url: Option<String>,
}
