//! Token Types
//!
//! Access token wire format and the cached token value.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Token response from the authentication server.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
    /// Token type (usually "Bearer").
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Refresh token, rarely issued for client credentials.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
}

// Ten years; anything longer is clamped.
const MAX_LIFETIME_SECS: i64 = 10 * 365 * 24 * 3600;

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Access token with absolute expiry.
///
/// Replaced wholesale on refresh, never updated in place.
#[derive(Clone)]
pub struct AccessToken {
    value: SecretString,
    /// Token type.
    pub token_type: String,
    /// Absolute expiration time.
    pub expires_at: DateTime<Utc>,
    /// Refresh token, if any.
    pub refresh_token: Option<String>,
    /// Granted scope.
    pub scope: String,
}

impl AccessToken {
    /// Create new access token.
    pub fn new(
        value: impl Into<String>,
        token_type: impl Into<String>,
        expires_at: DateTime<Utc>,
        refresh_token: Option<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            value: SecretString::new(value.into()),
            token_type: token_type.into(),
            expires_at,
            refresh_token,
            scope: scope.into(),
        }
    }

    /// Build a token from a response received at `issued_at`.
    pub fn from_response(response: TokenResponse, issued_at: DateTime<Utc>) -> Self {
        let seconds = i64::try_from(response.expires_in)
            .unwrap_or(MAX_LIFETIME_SECS)
            .min(MAX_LIFETIME_SECS);
        let expires_at = issued_at
            .checked_add_signed(Duration::seconds(seconds))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self::new(
            response.access_token,
            response.token_type,
            expires_at,
            response.refresh_token,
            response.scope.unwrap_or_default(),
        )
    }

    /// Token value (for the Authorization header).
    pub fn secret(&self) -> &str {
        self.value.expose_secret()
    }

    /// Check whether the token can still be used at `now`, keeping `safety_margin` in reserve.
    pub fn is_valid_at(&self, now: DateTime<Utc>, safety_margin: std::time::Duration) -> bool {
        Duration::from_std(safety_margin)
            .ok()
            .and_then(|margin| self.expires_at.checked_sub_signed(margin))
            .is_some_and(|deadline| now < deadline)
    }

    /// Check if token is expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Format as Authorization header value.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.value.expose_secret())
    }
}

impl PartialEq for AccessToken {
    fn eq(&self, other: &Self) -> bool {
        self.secret() == other.secret() && self.expires_at == other.expires_at
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish()
    }
}
