use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::booking::{
    AttachmentRejection, GatewayBuildError, SessionError, SubmitFailure,
};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Draft(serde_json::Error),
    Gateway(GatewayBuildError),
    Attachment(AttachmentRejection),
    Session(SessionError),
    /// The submission ran but did not reach checkout; `banner` is the text shown to the user.
    Submit {
        failure: SubmitFailure,
        banner: String,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Draft(err) => write!(f, "invalid draft file: {}", err),
            AppError::Gateway(err) => write!(f, "gateway error: {}", err),
            AppError::Attachment(err) => write!(f, "attachment rejected: {}", err),
            AppError::Session(err) => write!(f, "booking not submitted: {}", err),
            AppError::Submit { banner, .. } => write!(f, "submission failed: {}", banner),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Draft(err) => Some(err),
            AppError::Gateway(err) => Some(err),
            AppError::Attachment(err) => Some(err),
            AppError::Session(err) => Some(err),
            AppError::Submit { failure, .. } => Some(failure),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Draft(value)
    }
}

impl From<GatewayBuildError> for AppError {
    fn from(value: GatewayBuildError) -> Self {
        Self::Gateway(value)
    }
}

impl From<AttachmentRejection> for AppError {
    fn from(value: AttachmentRejection) -> Self {
        Self::Attachment(value)
    }
}

impl From<SessionError> for AppError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}
