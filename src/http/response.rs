//! API Response Envelope
//!
//! Uniform success/error result of every API call. Parsing never fails: a non-2xx status, or a
//! 2xx status whose body does not decode into the expected type, becomes [`ApiResponse::Error`]
//! with the raw status and body retained.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;

use crate::core::HttpResponse;
use crate::types::names;

/// RFC 7807 problem details returned by the payments API on errors.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ProblemDetails {
    #[serde(rename = "type", default)]
    pub problem_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub trace_id: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub errors: Option<serde_json::Value>,
}

/// Error half of the envelope.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body, verbatim.
    pub body: String,
    /// Response headers, names lowercased.
    pub headers: HashMap<String, String>,
    /// Problem details, when the body is one.
    pub problem: Option<ProblemDetails>,
}

impl ApiError {
    fn new(status: u16, body: String, headers: HashMap<String, String>) -> Self {
        let problem = serde_json::from_str::<ProblemDetails>(&body)
            .ok()
            .filter(|p| p.title.is_some() || p.problem_type.is_some());
        Self {
            status,
            body,
            headers,
            problem,
        }
    }

    /// `X-Tl-Correlation-Id` of the failed call.
    pub fn correlation_id(&self) -> Option<&str> {
        correlation_id(&self.headers)
    }

    /// Whether the status is in the success range, i.e. the body failed to decode.
    pub fn is_decoding_failure(&self) -> bool {
        is_success(self.status)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.problem.as_ref().and_then(|p| p.title.as_deref()) {
            Some(title) => write!(f, "API error {}: {}", self.status, title),
            None => write!(f, "API error {}: {}", self.status, self.body),
        }
    }
}

impl std::error::Error for ApiError {}

/// Response envelope: exactly one of success or error.
#[derive(Clone, Debug, PartialEq)]
pub enum ApiResponse<T> {
    Success {
        status: u16,
        data: T,
        headers: HashMap<String, String>,
    },
    Error(ApiError),
}

impl<T: DeserializeOwned> ApiResponse<T> {
    /// Classify a raw response.
    pub fn parse(status: u16, body: String, headers: HashMap<String, String>) -> Self {
        if !is_success(status) {
            return Self::Error(ApiError::new(status, body, headers));
        }

        // Empty bodies (204) decode as JSON null, which fits `()` and `Option<_>`.
        let decoded = if body.trim().is_empty() {
            serde_json::from_str::<T>("null")
        } else {
            serde_json::from_str::<T>(&body)
        };

        match decoded {
            Ok(data) => Self::Success {
                status,
                data,
                headers,
            },
            Err(e) => {
                tracing::warn!(status, error = %e, "success response body could not be decoded");
                Self::Error(ApiError::new(status, body, headers))
            }
        }
    }

    /// Classify a transport response.
    pub fn from_http_response(response: HttpResponse) -> Self {
        Self::parse(response.status, response.body, response.headers)
    }
}

impl<T> ApiResponse<T> {
    /// Whether the call succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Whether the call failed.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        match self {
            Self::Success { status, .. } => *status,
            Self::Error(error) => error.status,
        }
    }

    /// Response headers, lowercase names.
    pub fn headers(&self) -> &HashMap<String, String> {
        match self {
            Self::Success { headers, .. } => headers,
            Self::Error(error) => &error.headers,
        }
    }

    /// `X-Tl-Correlation-Id` assigned by the server.
    pub fn correlation_id(&self) -> Option<&str> {
        correlation_id(self.headers())
    }

    /// Decoded payload on success.
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Error(_) => None,
        }
    }

    /// Error details on failure.
    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Self::Success { .. } => None,
            Self::Error(error) => Some(error),
        }
    }

    /// Convert into a `Result`.
    pub fn into_result(self) -> Result<T, ApiError> {
        match self {
            Self::Success { data, .. } => Ok(data),
            Self::Error(error) => Err(error),
        }
    }

    /// Transform the success payload.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        match self {
            Self::Success {
                status,
                data,
                headers,
            } => ApiResponse::Success {
                status,
                data: f(data),
                headers,
            },
            Self::Error(error) => ApiResponse::Error(error),
        }
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn correlation_id(headers: &HashMap<String, String>) -> Option<&str> {
    headers
        .get(&names::TL_CORRELATION_ID.to_ascii_lowercase())
        .map(String::as_str)
}
