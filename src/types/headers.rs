//! Header Types
//!
//! Header names used on the wire and the optional headers a caller may attach to a call.

/// Header names.
pub mod names {
    /// Library identification, `name/version`.
    pub const TL_AGENT: &str = "TL-Agent";
    /// Idempotency key of a mutating request.
    pub const IDEMPOTENCY_KEY: &str = "Idempotency-Key";
    /// Detached JWS request signature.
    pub const TL_SIGNATURE: &str = "Tl-Signature";
    /// Bearer access token.
    pub const AUTHORIZATION: &str = "Authorization";
    /// End-user IP address.
    pub const X_FORWARDED_FOR: &str = "X-Forwarded-For";
    /// End-user device user agent.
    pub const X_DEVICE_USER_AGENT: &str = "X-Device-User-Agent";
    /// Correlation id echoed by the API, sent on requests when the caller sets one.
    pub const TL_CORRELATION_ID: &str = "X-Tl-Correlation-Id";
    /// Body media type.
    pub const CONTENT_TYPE: &str = "Content-Type";
    /// Accepted response media type.
    pub const ACCEPT: &str = "Accept";
}

/// Optional per-call headers supplied by the caller.
///
/// Every field is passed through to the request unchanged when set. A caller-supplied
/// idempotency key replaces the generated one; a caller-supplied signature suppresses
/// request signing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers {
    /// `Idempotency-Key`.
    pub idempotency_key: Option<String>,
    /// Precomputed `Tl-Signature`.
    pub signature: Option<String>,
    /// `X-Tl-Correlation-Id`.
    pub correlation_id: Option<String>,
    /// `X-Forwarded-For`.
    pub x_forwarded_for: Option<String>,
    /// `X-Device-User-Agent`.
    pub x_device_user_agent: Option<String>,
}

impl Headers {
    /// Empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `key` instead of a generated idempotency key.
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Send `signature` as is; the request is not signed again.
    pub fn signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Set the correlation id.
    pub fn correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Set the end-user IP address.
    pub fn x_forwarded_for(mut self, address: impl Into<String>) -> Self {
        self.x_forwarded_for = Some(address.into());
        self
    }

    /// Set the end-user device user agent.
    pub fn x_device_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.x_device_user_agent = Some(user_agent.into());
        self
    }

    /// Header name/value pairs for every field that is set.
    pub fn to_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            (names::IDEMPOTENCY_KEY, &self.idempotency_key),
            (names::TL_SIGNATURE, &self.signature),
            (names::TL_CORRELATION_ID, &self.correlation_id),
            (names::X_FORWARDED_FOR, &self.x_forwarded_for),
            (names::X_DEVICE_USER_AGENT, &self.x_device_user_agent),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }
}
