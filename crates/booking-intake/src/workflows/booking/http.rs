//! `reqwest` clients for the relay service and the payment-session provider.
//!
//! Both clients map every failure into the gateway error types and never retry;
//! retry is a user decision made at the form.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use super::attachments::AttachmentPayload;
use super::composer::{SubmissionAnswers, SubmissionRecord};
use super::domain::{CorrelationId, ServiceKind};
use super::gateway::{
    PaymentError, PaymentGateway, PaymentSessionRequest, PaymentSessionResponse, RelayError,
    RelayGateway,
};

const RELAY_ACTION: &str = "submitBooking";
const MAX_ERROR_BODY_CHARS: usize = 256;
/// Added to the endpoint timeout for the client's own deadline, so the orchestrator's
/// phase timeout always fires first and a slow call is reported as timed out.
const CLIENT_TIMEOUT_GRACE: Duration = Duration::from_secs(2);

/// Relay location and shared secret.
#[derive(Clone)]
pub struct RelayEndpoint {
    pub url: Url,
    pub token: String,
    pub timeout: Duration,
}

impl fmt::Debug for RelayEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayEndpoint")
            .field("url", &self.url.as_str())
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct PaymentEndpoint {
    pub url: Url,
    pub timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayBuildError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RelayRequest<'a> {
    token: &'a str,
    action: &'static str,
    submission_id: CorrelationId,
    service: ServiceKind,
    name: String,
    email: &'a str,
    phone: &'a str,
    files: BTreeMap<String, &'a AttachmentPayload>,
    answers: &'a SubmissionAnswers,
    submitted_at: DateTime<Utc>,
}

impl<'a> RelayRequest<'a> {
    fn new(token: &'a str, record: &'a SubmissionRecord) -> Self {
        let files = record
            .attachments
            .iter()
            .enumerate()
            .map(|(index, payload)| (format!("document_{}", index + 1), payload))
            .collect();

        Self {
            token,
            action: RELAY_ACTION,
            submission_id: record.correlation_id,
            service: record.service,
            name: record.display_name(),
            email: record.contact.email.trim(),
            phone: record.contact.phone.trim(),
            files,
            answers: &record.answers,
            submitted_at: record.submitted_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RelayAcknowledgement {
    #[serde(alias = "success")]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Relay client authenticated with the shared token carried in every request body.
#[derive(Debug, Clone)]
pub struct HttpRelayGateway {
    client: reqwest::Client,
    endpoint: RelayEndpoint,
}

impl HttpRelayGateway {
    pub fn new(endpoint: RelayEndpoint) -> Result<Self, GatewayBuildError> {
        let client = reqwest::Client::builder()
            .timeout(client_timeout(endpoint.timeout))
            .build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl RelayGateway for HttpRelayGateway {
    async fn persist(&self, record: &SubmissionRecord) -> Result<(), RelayError> {
        let body = RelayRequest::new(&self.endpoint.token, record);
        let response = self
            .client
            .post(self.endpoint.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|err| RelayError::Transport(err.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| RelayError::Transport(err.to_string()))?;
        debug!(%status, correlation_id = %record.correlation_id, "relay responded");

        match serde_json::from_str::<RelayAcknowledgement>(&text) {
            Ok(ack) if ack.ok && status.is_success() => Ok(()),
            Ok(ack) => Err(RelayError::Rejected {
                message: ack.error.filter(|message| !message.trim().is_empty()),
            }),
            Err(_) if !status.is_success() => {
                Err(RelayError::Transport(format!("HTTP {}", status.as_u16())))
            }
            Err(err) => {
                warn!(error = %err, "relay acknowledgement unreadable");
                Err(RelayError::Transport(format!(
                    "unreadable acknowledgement: {err}"
                )))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    endpoint: PaymentEndpoint,
}

impl HttpPaymentGateway {
    pub fn new(endpoint: PaymentEndpoint) -> Result<Self, GatewayBuildError> {
        let client = reqwest::Client::builder()
            .timeout(client_timeout(endpoint.timeout))
            .build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_session(
        &self,
        request: &PaymentSessionRequest,
    ) -> Result<PaymentSessionResponse, PaymentError> {
        let response = self
            .client
            .post(self.endpoint.url.clone())
            .json(request)
            .send()
            .await
            .map_err(|err| PaymentError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        response
            .json::<PaymentSessionResponse>()
            .await
            .map_err(|err| PaymentError::Transport(format!("unreadable session response: {err}")))
    }
}

fn client_timeout(phase_timeout: Duration) -> Duration {
    phase_timeout + CLIENT_TIMEOUT_GRACE
}
