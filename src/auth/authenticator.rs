//! Authenticator
//!
//! Client Credentials grant against the TrueLayer authentication server.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use secrecy::ExposeSecret;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::core::{HttpMethod, HttpRequest, HttpTransport};
use crate::error::{AuthenticationError, ConfigurationError, TrueLayerError, TrueLayerResult};
use crate::types::config::append_path;
use crate::types::{names, AccessToken, Credentials, TokenResponse, VersionInfo};

const TOKEN_PATH: &str = "connect/token";

/// Source of fresh access tokens.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Request a new access token. Never cached at this level.
    async fn authenticate(&self) -> TrueLayerResult<AccessToken>;
}

/// Client Credentials Authenticator.
pub struct ClientCredentialsAuthenticator {
    credentials: Credentials,
    token_url: Url,
    version_info: VersionInfo,
    transport: Arc<dyn HttpTransport>,
    timeout: Option<Duration>,
}

impl ClientCredentialsAuthenticator {
    /// Create new authenticator posting to `<auth_url>/connect/token`.
    pub fn new(
        credentials: Credentials,
        auth_url: &Url,
        version_info: VersionInfo,
        transport: Arc<dyn HttpTransport>,
    ) -> TrueLayerResult<Self> {
        credentials.validate()?;
        let token_url =
            append_path(auth_url, TOKEN_PATH).ok_or_else(|| ConfigurationError::InvalidUrl {
                field: "auth_url".to_string(),
                url: auth_url.to_string(),
            })?;

        Ok(Self {
            credentials,
            token_url,
            version_info,
            transport,
            timeout: None,
        })
    }

    /// Set a per-request timeout for the token call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Token endpoint URL.
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    fn build_request_body(&self) -> String {
        let mut form = url::form_urlencoded::Serializer::new(String::new());
        form.append_pair("grant_type", "client_credentials")
            .append_pair("client_id", &self.credentials.client_id)
            .append_pair(
                "client_secret",
                self.credentials.client_secret.expose_secret(),
            );
        if !self.credentials.scopes.is_empty() {
            form.append_pair("scope", &self.credentials.scopes.join(" "));
        }
        form.finish()
    }

    fn build_request_headers(&self) -> HashMap<String, String> {
        [
            (
                names::CONTENT_TYPE.to_string(),
                "application/x-www-form-urlencoded".to_string(),
            ),
            (names::ACCEPT.to_string(), "application/json".to_string()),
            (names::TL_AGENT.to_string(), self.version_info.agent()),
        ]
        .into_iter()
        .collect()
    }
}

#[async_trait]
impl Authenticator for ClientCredentialsAuthenticator {
    async fn authenticate(&self) -> TrueLayerResult<AccessToken> {
        let http_request = HttpRequest {
            method: HttpMethod::Post,
            url: self.token_url.to_string(),
            headers: self.build_request_headers(),
            body: Some(self.build_request_body()),
            timeout: self.timeout,
        };

        let issued_at = Utc::now();
        let response = self.transport.send(http_request).await?;

        if !(200..300).contains(&response.status) {
            warn!(
                status = response.status,
                client_id = %self.credentials.client_id,
                "token request rejected"
            );
            return Err(AuthenticationError::TokenRequestFailed {
                status: response.status,
                body: response.body,
            }
            .into());
        }

        let token_response: TokenResponse = serde_json::from_str(&response.body).map_err(|e| {
            AuthenticationError::MalformedTokenResponse {
                message: e.to_string(),
                body: response.body.clone(),
            }
        })?;

        if token_response.access_token.is_empty() {
            return Err(AuthenticationError::MalformedTokenResponse {
                message: "empty access_token".to_string(),
                body: response.body,
            }
            .into());
        }

        let token = AccessToken::from_response(token_response, issued_at);
        debug!(expires_at = %token.expires_at, "access token issued");
        Ok(token)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock Authenticator for testing.
///
/// Returns queued results first, then fresh `mock-token-<n>` tokens valid for an hour.
#[derive(Default)]
pub struct MockAuthenticator {
    results: Mutex<VecDeque<TrueLayerResult<AccessToken>>>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl MockAuthenticator {
    /// Create new mock authenticator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a token to return.
    pub fn queue_token(&self, token: AccessToken) -> &Self {
        lock(&self.results).push_back(Ok(token));
        self
    }

    /// Queue an error to return.
    pub fn queue_error(&self, error: TrueLayerError) -> &Self {
        lock(&self.results).push_back(Err(error));
        self
    }

    /// Delay every call by `delay`.
    pub fn set_delay(&self, delay: Duration) -> &Self {
        *lock(&self.delay) = Some(delay);
        self
    }

    /// Number of `authenticate` calls observed.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authenticator for MockAuthenticator {
    async fn authenticate(&self) -> TrueLayerResult<AccessToken> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let queued = lock(&self.results).pop_front();
        queued.unwrap_or_else(|| {
            Ok(AccessToken::new(
                format!("mock-token-{call}"),
                "Bearer",
                Utc::now() + ChronoDuration::seconds(3600),
                None,
                "payments",
            ))
        })
    }
}
