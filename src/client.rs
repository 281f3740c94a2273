//! TrueLayer Client
//!
//! Single entry point composing the token cache, interceptor chain, transport and response
//! envelope. Domain sub-clients borrow it to issue their calls.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::auth::TokenCache;
use crate::builders::TrueLayerClientBuilder;
use crate::core::{HttpResponse, HttpTransport};
use crate::error::{ConfigurationError, TrueLayerError, TrueLayerResult};
use crate::http::{ApiRequest, ApiResponse, InterceptorChain};
use crate::payments::{HostedPaymentPageLinkBuilder, PaymentsClient};
use crate::signing::RequestSigner;
use crate::types::{names, AccessToken, Credentials, Environment};

const UNAUTHORIZED: u16 = 401;

/// TrueLayer API client.
///
/// Cheap to clone; clones share the token cache, so concurrent callers across clones still
/// trigger at most one token request at a time.
#[derive(Clone)]
pub struct TrueLayerClient {
    environment: Environment,
    transport: Arc<dyn HttpTransport>,
    token_cache: Arc<TokenCache>,
    chain: InterceptorChain,
    signer: Option<Arc<RequestSigner>>,
    timeout: Duration,
    retry_on_unauthorized: bool,
}

impl TrueLayerClient {
    /// Start building a client.
    pub fn builder(credentials: Credentials) -> TrueLayerClientBuilder {
        TrueLayerClientBuilder::new(credentials)
    }

    pub(crate) fn from_parts(
        environment: Environment,
        transport: Arc<dyn HttpTransport>,
        token_cache: Arc<TokenCache>,
        chain: InterceptorChain,
        signer: Option<Arc<RequestSigner>>,
        timeout: Duration,
        retry_on_unauthorized: bool,
    ) -> Self {
        Self {
            environment,
            transport,
            token_cache,
            chain,
            signer,
            timeout,
            retry_on_unauthorized,
        }
    }

    /// Configured base URLs.
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether signing options were configured.
    pub fn has_signer(&self) -> bool {
        self.signer.is_some()
    }

    /// Shared token cache.
    pub fn token_cache(&self) -> &Arc<TokenCache> {
        &self.token_cache
    }

    /// Payments API.
    pub fn payments(&self) -> PaymentsClient<'_> {
        PaymentsClient::new(self)
    }

    /// Hosted payment page links.
    pub fn hpp(&self) -> HostedPaymentPageLinkBuilder {
        HostedPaymentPageLinkBuilder::new(self.environment.hpp_url.clone())
    }

    /// Current access token, requesting a new one when none is valid.
    pub async fn get_access_token(&self) -> TrueLayerResult<AccessToken> {
        let timeout = self.timeout;
        tokio::time::timeout(timeout, self.token_cache.get_valid_token())
            .await
            .map_err(|_| TrueLayerError::Timeout { timeout })?
    }

    /// Send an API request through the interceptor chain.
    ///
    /// Business-level rejections come back as [`ApiResponse::Error`]; the `Err` side is reserved
    /// for calls that could not complete (authentication, transport, timeout, configuration).
    pub async fn send<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> TrueLayerResult<ApiResponse<T>> {
        let span = info_span!(
            "truelayer.request",
            method = %request.method(),
            path = request.path()
        );
        let timeout = self.timeout;

        match tokio::time::timeout(timeout, self.execute(request))
            .instrument(span)
            .await
        {
            Ok(result) => result.map(ApiResponse::from_http_response),
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "request timed out");
                Err(TrueLayerError::Timeout { timeout })
            }
        }
    }

    async fn execute(&self, request: ApiRequest) -> TrueLayerResult<HttpResponse> {
        if request.is_signed() && self.signer.is_none() && !request.has_header(names::TL_SIGNATURE)
        {
            return Err(ConfigurationError::MissingRequired {
                field: "signing_options".to_string(),
            }
            .into());
        }

        let original = self.retry_on_unauthorized.then(|| request.clone());
        let prepared = self.chain.apply(request).await?;
        let authorization = prepared
            .get_header(names::AUTHORIZATION)
            .map(str::to_owned);
        let idempotency_key = prepared
            .get_header(names::IDEMPOTENCY_KEY)
            .map(str::to_owned);

        let response = self.dispatch(prepared).await?;

        match original {
            Some(original) if response.status == UNAUTHORIZED && original.is_authenticated() => {
                info!("request rejected with 401, replaying once with a fresh token");
                self.invalidate_used_token(authorization.as_deref());

                let original = match idempotency_key {
                    Some(key) => original.header(names::IDEMPOTENCY_KEY, key),
                    None => original,
                };
                let replay = self.chain.apply(original).await?;
                self.dispatch(replay).await
            }
            _ => Ok(response),
        }
    }

    fn invalidate_used_token(&self, authorization: Option<&str>) {
        let Some(sent) = authorization else {
            return;
        };
        if let Some(token) = self.token_cache.cached_token() {
            if token.authorization_header() == sent {
                self.token_cache.invalidate(&token);
            }
        }
    }

    async fn dispatch(&self, request: ApiRequest) -> TrueLayerResult<HttpResponse> {
        let method = request.method();
        let http_request = request.into_http_request(&self.environment.api_url, Some(self.timeout))?;
        let url = http_request.url.clone();

        let response = self.transport.send(http_request).await?;

        debug!(
            %method,
            url = %url,
            status = response.status,
            correlation_id = ?response.headers.get(&names::TL_CORRELATION_ID.to_ascii_lowercase()),
            "request completed"
        );
        Ok(response)
    }
}

impl std::fmt::Debug for TrueLayerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrueLayerClient")
            .field("environment", &self.environment)
            .field("chain", &self.chain)
            .field("signer", &self.signer)
            .field("timeout", &self.timeout)
            .field("retry_on_unauthorized", &self.retry_on_unauthorized)
            .finish_non_exhaustive()
    }
}
