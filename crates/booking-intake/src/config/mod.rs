use std::env;
use std::fmt;
use std::time::Duration;

use url::Url;

use crate::workflows::booking::{
    AttachmentPolicy, CorrelationPolicy, OrchestratorConfig, PaymentEndpoint, RelayEndpoint,
    DEFAULT_ALLOWED_MEDIA_TYPES, DEFAULT_MAX_ATTACHMENT_BYTES,
};

const DEFAULT_RELAY_TIMEOUT_SECS: u64 = 20;
const DEFAULT_PAYMENT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_POLICY_VERSION: &str = "2024-06";
const DEFAULT_SUPPORT_CONTACT: &str = "support@example.com";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the intake pipeline.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub booking: BookingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );
        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            booking: BookingConfig::from_env()?,
        })
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Remote endpoints, limits and policy stamps for the booking forms.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    pub relay: RelayEndpoint,
    pub payment: PaymentEndpoint,
    pub max_attachment_bytes: u64,
    pub allowed_media_types: Vec<String>,
    pub policy_version: String,
    pub support_contact: String,
    pub reuse_correlation_id: bool,
}

impl BookingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let relay_url = required_url("BOOKING_RELAY_URL")?;
        let relay_token = env::var("BOOKING_RELAY_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::Missing {
                key: "BOOKING_RELAY_TOKEN",
            })?;
        let relay_timeout = seconds("BOOKING_RELAY_TIMEOUT_SECS", DEFAULT_RELAY_TIMEOUT_SECS)?;

        let payment_url = required_url("BOOKING_PAYMENT_URL")?;
        let payment_timeout =
            seconds("BOOKING_PAYMENT_TIMEOUT_SECS", DEFAULT_PAYMENT_TIMEOUT_SECS)?;

        let max_attachment_bytes = max_attachment_bytes()?;
        let allowed_media_types = allowed_media_types()?;

        let policy_version = env::var("BOOKING_POLICY_VERSION")
            .unwrap_or_else(|_| DEFAULT_POLICY_VERSION.to_string());
        let support_contact = env::var("BOOKING_SUPPORT_CONTACT")
            .unwrap_or_else(|_| DEFAULT_SUPPORT_CONTACT.to_string());
        let reuse_correlation_id = env::var("BOOKING_REUSE_CORRELATION_ID")
            .map(|raw| matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            relay: RelayEndpoint {
                url: relay_url,
                token: relay_token,
                timeout: relay_timeout,
            },
            payment: PaymentEndpoint {
                url: payment_url,
                timeout: payment_timeout,
            },
            max_attachment_bytes,
            allowed_media_types,
            policy_version,
            support_contact,
            reuse_correlation_id,
        })
    }

    pub fn attachment_policy(&self) -> AttachmentPolicy {
        AttachmentPolicy::new(self.max_attachment_bytes, self.allowed_media_types.clone())
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            relay_timeout: self.relay.timeout,
            payment_timeout: self.payment.timeout,
            support_contact: self.support_contact.clone(),
        }
    }

    pub fn correlation_policy(&self) -> CorrelationPolicy {
        if self.reuse_correlation_id {
            CorrelationPolicy::ReuseWithinSession
        } else {
            CorrelationPolicy::FreshPerAttempt
        }
    }
}

/// Attachment limits alone, for callers that never talk to the relay or payment provider.
pub fn load_attachment_policy() -> Result<AttachmentPolicy, ConfigError> {
    dotenvy::dotenv().ok();
    Ok(AttachmentPolicy::new(
        max_attachment_bytes()?,
        allowed_media_types()?,
    ))
}

fn max_attachment_bytes() -> Result<u64, ConfigError> {
    match env::var("BOOKING_MAX_ATTACHMENT_BYTES") {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber {
                key: "BOOKING_MAX_ATTACHMENT_BYTES",
            }),
        Err(_) => Ok(DEFAULT_MAX_ATTACHMENT_BYTES),
    }
}

fn allowed_media_types() -> Result<Vec<String>, ConfigError> {
    match env::var("BOOKING_ALLOWED_MEDIA_TYPES") {
        Ok(raw) => {
            let types: Vec<String> = raw
                .split(',')
                .map(|value| value.trim().to_ascii_lowercase())
                .filter(|value| !value.is_empty())
                .collect();
            if types.is_empty() {
                return Err(ConfigError::EmptyMediaTypes);
            }
            Ok(types)
        }
        Err(_) => Ok(DEFAULT_ALLOWED_MEDIA_TYPES
            .iter()
            .map(|value| value.to_string())
            .collect()),
    }
}

fn required_url(key: &'static str) -> Result<Url, ConfigError> {
    let raw = env::var(key).map_err(|_| ConfigError::Missing { key })?;
    let url = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl { key, source })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigError::UnsupportedScheme { key }),
    }
}

fn seconds(key: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(ConfigError::InvalidNumber { key }),
        },
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing { key: &'static str },
    InvalidUrl {
        key: &'static str,
        source: url::ParseError,
    },
    UnsupportedScheme { key: &'static str },
    InvalidNumber { key: &'static str },
    EmptyMediaTypes,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing { key } => write!(f, "{key} must be set"),
            ConfigError::InvalidUrl { key, .. } => write!(f, "{key} must be an absolute URL"),
            ConfigError::UnsupportedScheme { key } => {
                write!(f, "{key} must use http or https")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a positive whole number")
            }
            ConfigError::EmptyMediaTypes => {
                write!(f, "BOOKING_ALLOWED_MEDIA_TYPES must list at least one media type")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidUrl { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_LOG_LEVEL",
            "BOOKING_RELAY_URL",
            "BOOKING_RELAY_TOKEN",
            "BOOKING_RELAY_TIMEOUT_SECS",
            "BOOKING_PAYMENT_URL",
            "BOOKING_PAYMENT_TIMEOUT_SECS",
            "BOOKING_MAX_ATTACHMENT_BYTES",
            "BOOKING_ALLOWED_MEDIA_TYPES",
            "BOOKING_POLICY_VERSION",
            "BOOKING_SUPPORT_CONTACT",
            "BOOKING_REUSE_CORRELATION_ID",
        ] {
            env::remove_var(key);
        }
    }

    fn set_required() {
        env::set_var("BOOKING_RELAY_URL", "https://relay.example.com/exec");
        env::set_var("BOOKING_RELAY_TOKEN", "shared-secret");
        env::set_var("BOOKING_PAYMENT_URL", "https://pay.example.com/session");
    }

    #[test]
    fn load_uses_defaults_when_optional_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        set_required();

        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.booking.relay.timeout, Duration::from_secs(20));
        assert_eq!(config.booking.payment.timeout, Duration::from_secs(10));
        assert_eq!(config.booking.max_attachment_bytes, 5 * 1024 * 1024);
        assert_eq!(
            config.booking.allowed_media_types,
            vec!["application/pdf", "image/jpeg", "image/png"]
        );
        assert_eq!(
            config.booking.correlation_policy(),
            CorrelationPolicy::FreshPerAttempt
        );
    }

    #[test]
    fn missing_relay_token_is_reported() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        set_required();
        env::remove_var("BOOKING_RELAY_TOKEN");

        match AppConfig::load() {
            Err(ConfigError::Missing { key }) => assert_eq!(key, "BOOKING_RELAY_TOKEN"),
            other => panic!("expected missing token, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_http_payment_url() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        set_required();
        env::set_var("BOOKING_PAYMENT_URL", "ftp://pay.example.com");

        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::UnsupportedScheme {
                key: "BOOKING_PAYMENT_URL"
            })
        ));
    }

    #[test]
    fn parses_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        set_required();
        env::set_var("BOOKING_RELAY_TIMEOUT_SECS", "45");
        env::set_var("BOOKING_ALLOWED_MEDIA_TYPES", "Application/PDF, image/webp");
        env::set_var("BOOKING_REUSE_CORRELATION_ID", "true");
        env::set_var("APP_ENV", "prod");

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(config.booking.relay.timeout, Duration::from_secs(45));
        assert_eq!(
            config.booking.allowed_media_types,
            vec!["application/pdf", "image/webp"]
        );
        assert_eq!(
            config.booking.correlation_policy(),
            CorrelationPolicy::ReuseWithinSession
        );
    }

    #[test]
    fn attachment_policy_loads_without_remote_endpoints() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("BOOKING_ALLOWED_MEDIA_TYPES", "application/pdf");
        env::set_var("BOOKING_MAX_ATTACHMENT_BYTES", "2048");

        let policy = load_attachment_policy().expect("policy loads");
        assert_eq!(policy.max_bytes(), 2048);
        assert_eq!(policy.allowed_media_types(), ["application/pdf".to_string()]);
        assert!(!policy.accepts_media_type("image/png"));
    }

    #[test]
    fn attachment_policy_matches_booking_config() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        set_required();
        env::set_var("BOOKING_ALLOWED_MEDIA_TYPES", "image/png, image/webp");

        let standalone = load_attachment_policy().expect("policy loads");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(standalone, config.booking.attachment_policy());
    }

    #[test]
    fn blank_media_type_list_is_rejected() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("BOOKING_ALLOWED_MEDIA_TYPES", " , ");

        assert!(matches!(
            load_attachment_policy(),
            Err(ConfigError::EmptyMediaTypes)
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        set_required();
        env::set_var("BOOKING_PAYMENT_TIMEOUT_SECS", "0");

        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidNumber {
                key: "BOOKING_PAYMENT_TIMEOUT_SECS"
            })
        ));
    }
}
