//! Interceptor Chain
//!
//! Ordered request transformers applied to every outgoing API request. Each interceptor takes
//! the request by value and returns the transformed copy; a failure ends the chain and the
//! request is dropped unsent.
//!
//! [`InterceptorChain::standard`] builds the fixed order the signature depends on:
//!
//! 1. [`LibraryInfoInterceptor`] sets `TL-Agent`
//! 2. [`IdempotencyKeyInterceptor`] adds a fresh key to mutating requests that lack one
//! 3. [`AuthorizationInterceptor`] adds the bearer token
//! 4. [`SignatureInterceptor`] signs over the final idempotency key and body

use async_trait::async_trait;
use std::sync::Arc;
use tracing::trace;
use uuid::Uuid;

use crate::auth::TokenCache;
use crate::error::TrueLayerResult;
use crate::http::ApiRequest;
use crate::signing::{RequestSigner, SignedRequestContext};
use crate::types::{names, VersionInfo};

/// Request transformer.
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Transform `request`.
    async fn intercept(&self, request: ApiRequest) -> TrueLayerResult<ApiRequest>;
}

/// Sets the library identification header.
#[derive(Debug, Clone)]
pub struct LibraryInfoInterceptor {
    agent: String,
}

impl LibraryInfoInterceptor {
    /// Interceptor sending `version_info` as the agent.
    pub fn new(version_info: &VersionInfo) -> Self {
        Self {
            agent: version_info.agent(),
        }
    }
}

#[async_trait]
impl Interceptor for LibraryInfoInterceptor {
    fn name(&self) -> &'static str {
        "library_info"
    }

    async fn intercept(&self, request: ApiRequest) -> TrueLayerResult<ApiRequest> {
        Ok(request.header(names::TL_AGENT, self.agent.as_str()))
    }
}

/// Adds a UUID v4 `Idempotency-Key` to mutating requests without a caller-supplied one.
#[derive(Debug, Clone, Default)]
pub struct IdempotencyKeyInterceptor;

#[async_trait]
impl Interceptor for IdempotencyKeyInterceptor {
    fn name(&self) -> &'static str {
        "idempotency_key"
    }

    async fn intercept(&self, request: ApiRequest) -> TrueLayerResult<ApiRequest> {
        if !request.method().is_mutating() || request.has_header(names::IDEMPOTENCY_KEY) {
            return Ok(request);
        }
        Ok(request.header(names::IDEMPOTENCY_KEY, Uuid::new_v4().to_string()))
    }
}

/// Adds `Authorization: Bearer <token>` to authenticated requests.
pub struct AuthorizationInterceptor {
    token_cache: Arc<TokenCache>,
}

impl AuthorizationInterceptor {
    /// Interceptor drawing tokens from `token_cache`.
    pub fn new(token_cache: Arc<TokenCache>) -> Self {
        Self { token_cache }
    }
}

#[async_trait]
impl Interceptor for AuthorizationInterceptor {
    fn name(&self) -> &'static str {
        "authorization"
    }

    async fn intercept(&self, request: ApiRequest) -> TrueLayerResult<ApiRequest> {
        if !request.is_authenticated() {
            return Ok(request);
        }
        let token = self.token_cache.get_valid_token().await?;
        Ok(request.header(names::AUTHORIZATION, token.authorization_header()))
    }
}

/// Adds `Tl-Signature` to requests flagged as signed.
///
/// A caller-supplied signature is left untouched.
pub struct SignatureInterceptor {
    signer: Arc<RequestSigner>,
}

impl SignatureInterceptor {
    /// Interceptor signing with `signer`.
    pub fn new(signer: Arc<RequestSigner>) -> Self {
        Self { signer }
    }
}

#[async_trait]
impl Interceptor for SignatureInterceptor {
    fn name(&self) -> &'static str {
        "signature"
    }

    async fn intercept(&self, request: ApiRequest) -> TrueLayerResult<ApiRequest> {
        if !request.is_signed() || request.has_header(names::TL_SIGNATURE) {
            return Ok(request);
        }

        let mut context =
            SignedRequestContext::new(request.method(), request.path(), request.body_bytes());
        if let Some(key) = request.get_header(names::IDEMPOTENCY_KEY) {
            context = context.idempotency_key(key);
        }
        let signature = self.signer.sign(context)?;

        Ok(request.header(names::TL_SIGNATURE, signature))
    }
}

/// Ordered interceptor list, composed once at client construction.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    /// Empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain in the order required for signing.
    pub fn standard(
        version_info: &VersionInfo,
        token_cache: Arc<TokenCache>,
        signer: Option<Arc<RequestSigner>>,
    ) -> Self {
        let chain = Self::new()
            .with(LibraryInfoInterceptor::new(version_info))
            .with(IdempotencyKeyInterceptor)
            .with(AuthorizationInterceptor::new(token_cache));

        match signer {
            Some(signer) => chain.with(SignatureInterceptor::new(signer)),
            None => chain,
        }
    }

    /// Append an interceptor.
    pub fn with(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Names in application order.
    pub fn names(&self) -> Vec<&'static str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    /// Run every interceptor in order.
    pub async fn apply(&self, request: ApiRequest) -> TrueLayerResult<ApiRequest> {
        let mut request = request;
        for interceptor in &self.interceptors {
            request = interceptor.intercept(request).await?;
            trace!(interceptor = interceptor.name(), "interceptor applied");
        }
        Ok(request)
    }
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("interceptors", &self.names())
            .finish()
    }
}
