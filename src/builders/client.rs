//! Client Builder
//!
//! Fluent builder for [`TrueLayerClient`]. Every configuration error (credential shape, URLs,
//! signing key material) surfaces from [`TrueLayerClientBuilder::build`], never on first call.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{Authenticator, ClientCredentialsAuthenticator, TokenCache, DEFAULT_SAFETY_MARGIN};
use crate::client::TrueLayerClient;
use crate::core::{HttpTransport, ReqwestHttpTransport};
use crate::error::TrueLayerResult;
use crate::http::InterceptorChain;
use crate::signing::RequestSigner;
use crate::types::{Credentials, Environment, SigningOptions, VersionInfo};

/// Default per-call deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// TrueLayer client builder.
pub struct TrueLayerClientBuilder {
    credentials: Credentials,
    signing_options: Option<SigningOptions>,
    environment: Environment,
    version_info: VersionInfo,
    transport: Option<Arc<dyn HttpTransport>>,
    authenticator: Option<Arc<dyn Authenticator>>,
    timeout: Duration,
    token_safety_margin: Duration,
    retry_on_unauthorized: bool,
}

impl TrueLayerClientBuilder {
    /// Create new builder for the live environment.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            signing_options: None,
            environment: Environment::live(),
            version_info: VersionInfo::default(),
            transport: None,
            authenticator: None,
            timeout: DEFAULT_TIMEOUT,
            token_safety_margin: DEFAULT_SAFETY_MARGIN,
            retry_on_unauthorized: false,
        }
    }

    /// Set the signing key. Required for signed requests such as payment creation.
    pub fn with_signing_options(mut self, signing_options: SigningOptions) -> Self {
        self.signing_options = Some(signing_options);
        self
    }

    /// Set the target environment.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Set the library identification sent as `TL-Agent`.
    pub fn with_version_info(mut self, version_info: VersionInfo) -> Self {
        self.version_info = version_info;
        self
    }

    /// Set the HTTP transport.
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the client credentials authenticator.
    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Set the per-call deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how long before expiry a cached token stops being used.
    pub fn with_token_safety_margin(mut self, margin: Duration) -> Self {
        self.token_safety_margin = margin;
        self
    }

    /// Replay a request once with a fresh token when it is rejected with 401.
    pub fn with_retry_on_unauthorized(mut self, enable: bool) -> Self {
        self.retry_on_unauthorized = enable;
        self
    }

    /// Build the client.
    pub fn build(self) -> TrueLayerResult<TrueLayerClient> {
        self.credentials.validate()?;

        let signer = self
            .signing_options
            .as_ref()
            .map(RequestSigner::new)
            .transpose()?
            .map(Arc::new);

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestHttpTransport::with_options(
                self.timeout,
                crate::core::DEFAULT_MAX_RESPONSE_SIZE,
            )?),
        };

        let authenticator: Arc<dyn Authenticator> = match self.authenticator {
            Some(authenticator) => authenticator,
            None => Arc::new(
                ClientCredentialsAuthenticator::new(
                    self.credentials,
                    &self.environment.auth_url,
                    self.version_info.clone(),
                    transport.clone(),
                )?
                .with_timeout(self.timeout),
            ),
        };

        let token_cache = Arc::new(TokenCache::with_safety_margin(
            authenticator,
            self.token_safety_margin,
        ));
        let chain = InterceptorChain::standard(&self.version_info, token_cache.clone(), signer.clone());

        Ok(TrueLayerClient::from_parts(
            self.environment,
            transport,
            token_cache,
            chain,
            signer,
            self.timeout,
            self.retry_on_unauthorized,
        ))
    }
}

impl std::fmt::Debug for TrueLayerClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrueLayerClientBuilder")
            .field("credentials", &self.credentials)
            .field("signing_options", &self.signing_options)
            .field("environment", &self.environment)
            .field("version_info", &self.version_info)
            .field("timeout", &self.timeout)
            .field("token_safety_margin", &self.token_safety_margin)
            .field("retry_on_unauthorized", &self.retry_on_unauthorized)
            .finish_non_exhaustive()
    }
}
