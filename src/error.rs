//! Error taxonomy for gateway operations
//!
//! Three families of failures are surfaced to callers: validation errors raised
//! while building a request, response errors raised while interpreting what the
//! gateway sent back, and transport errors passed through from the dispatcher.

use serde_json::Value;
use thiserror::Error;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Every failure a gateway operation can surface
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A required request field was empty when the field map was built
    #[error("{message}")]
    RequiredField { field: String, message: String },

    /// The gateway response was malformed or flagged a failure
    #[error("{message}")]
    ApiResponse {
        message: String,
        raw_context: Option<Value>,
    },

    /// Raised by the dispatcher, never reinterpreted
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl GatewayError {
    /// Missing required field; the message reads `"<Field> is required"`
    pub fn required_field(field: impl Into<String>) -> Self {
        let field = field.into();
        let message = format!("{} is required", capitalize(&field));
        Self::RequiredField { field, message }
    }

    /// Malformed or failure-flagged gateway response
    pub fn api_response(message: impl Into<String>, raw_context: Option<Value>) -> Self {
        Self::ApiResponse {
            message: message.into(),
            raw_context,
        }
    }

    /// True for errors detected locally, before any network interaction
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::RequiredField { .. })
    }

    /// Only transport failures are worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// Raw response attached to an `ApiResponse` error, if any
    pub fn raw_context(&self) -> Option<&Value> {
        match self {
            Self::ApiResponse { raw_context, .. } => raw_context.as_ref(),
            _ => None,
        }
    }
}

/// Failures raised while carrying a request to the gateway
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("API token is required for {endpoint}")]
    MissingApiToken { endpoint: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Timeout error: request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("Gateway returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Rate limit exceeded after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl TransportError {
    /// Operation needs an API token and none is configured
    pub fn missing_api_token(endpoint: impl Into<String>) -> Self {
        Self::MissingApiToken {
            endpoint: endpoint.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Network failures, timeouts, rate limits and 5xx responses
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout { .. } | Self::RateLimited { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(feature = "dispatcher")]
impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout {
                endpoint: err
                    .url()
                    .map(|url| url.path().to_string())
                    .unwrap_or_default(),
            }
        } else {
            TransportError::network(format!("Request error: {}", err))
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::serialization(format!("JSON error: {}", err))
    }
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
