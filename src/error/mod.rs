//! Error Types
//!
//! Failures that prevent a round trip from completing. Business-level rejections from the
//! payments API are not errors at this level: they come back as the `Error` variant of
//! [`ApiResponse`](crate::http::ApiResponse).

use std::time::Duration;
use thiserror::Error;

/// Root error type for the TrueLayer integration.
///
/// `Clone` so that a single failed token refresh can be handed to every caller that was
/// waiting on it.
#[derive(Error, Debug, Clone)]
pub enum TrueLayerError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Authentication error: {0}")]
    Authentication(#[from] AuthenticationError),

    #[error("Signing configuration error: {0}")]
    SigningConfiguration(#[from] SigningConfigurationError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl TrueLayerError {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "TL_CONFIG",
            Self::Authentication(_) => "TL_AUTH",
            Self::SigningConfiguration(_) => "TL_SIGNING",
            Self::Transport(_) => "TL_TRANSPORT",
            Self::Timeout { .. } => "TL_TIMEOUT",
            Self::Protocol(_) => "TL_PROTOCOL",
        }
    }

    /// Check if a caller may reasonably retry the failed call.
    ///
    /// The client itself never retries on these; the decision belongs to the caller.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout { .. } => true,
            Self::Authentication(AuthenticationError::TokenRequestFailed { status, .. }) => {
                *status >= 500 || *status == 429
            }
            _ => false,
        }
    }

    /// Check if this is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Configuration error, raised while building the client.
#[derive(Error, Debug, Clone)]
pub enum ConfigurationError {
    #[error("Missing required field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid URL for {field}: {url}")]
    InvalidUrl { field: String, url: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Token issuance failed.
#[derive(Error, Debug, Clone)]
pub enum AuthenticationError {
    #[error("Token request failed with HTTP {status}: {body}")]
    TokenRequestFailed { status: u16, body: String },

    #[error("Malformed token response: {message}")]
    MalformedTokenResponse { message: String, body: String },
}

impl AuthenticationError {
    /// Upstream HTTP status, if the endpoint answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::TokenRequestFailed { status, .. } => Some(*status),
            Self::MalformedTokenResponse { .. } => None,
        }
    }

    /// Upstream response body, kept verbatim for diagnostics.
    pub fn body(&self) -> &str {
        match self {
            Self::TokenRequestFailed { body, .. } | Self::MalformedTokenResponse { body, .. } => {
                body
            }
        }
    }
}

/// Bad signing key material. Fatal and never retryable.
#[derive(Error, Debug, Clone)]
pub enum SigningConfigurationError {
    #[error("Signing key id must not be empty")]
    MissingKeyId,

    #[error("Invalid PEM key material: {message}")]
    InvalidPem { message: String },

    #[error("Unsupported signing key: {message}")]
    UnsupportedKey { message: String },

    #[error("Signing failed: {message}")]
    SigningFailed { message: String },
}

/// Network-level failure.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request failed: {message}")]
    Request { message: String },
}

/// The remote answered with something the transport could not handle.
#[derive(Error, Debug, Clone)]
pub enum ProtocolError {
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Unexpected redirect to: {location}")]
    UnexpectedRedirect { location: String },

    #[error("Response too large: {size} bytes")]
    ResponseTooLarge { size: usize },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
}

/// Result type for TrueLayer operations.
pub type TrueLayerResult<T> = Result<T, TrueLayerError>;
