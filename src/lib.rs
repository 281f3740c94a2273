//! TrueLayer Integration Module
//!
//! Authenticated, signed HTTP request pipeline for the TrueLayer payments API.
//!
//! # Features
//!
//! - Client Credentials token acquisition with a single-flight token cache
//! - Detached JWS request signing (`Tl-Signature`, ES512 and EdDSA keys)
//! - Idempotency keys on every mutating request
//! - Uniform success/error response envelope
//! - Hosted payment page links
//!
//! # Example
//!
//! ```rust,ignore
//! use truelayer_integration::{Credentials, Environment, SigningOptions, TrueLayerClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = TrueLayerClient::builder(Credentials::new("my-client-id", "my-secret"))
//!         .with_signing_options(SigningOptions::new("my-key-id", std::fs::read("ec512.pem")?))
//!         .with_environment(Environment::sandbox())
//!         .build()?;
//!
//!     let payment = client
//!         .payments()
//!         .create_payment(&serde_json::json!({"amount_in_minor": 100, "currency": "GBP"}), None)
//!         .await?
//!         .into_result()?;
//!
//!     let link = client
//!         .hpp()
//!         .link(&payment.id, &payment.resource_token, "https://myapp.com/return");
//!     println!("Hosted payment page: {link}");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: credentials, environment, tokens and header names
//! - `error`: error hierarchy
//! - `core`: HTTP transport
//! - `auth`: authenticator and token cache
//! - `signing`: request signer and key loading
//! - `http`: request builder, interceptor chain and response envelope
//! - `builders`: client builder
//! - `client`: client facade
//! - `payments`: payments sub-client and hosted payment page links
//! - `telemetry`: logging setup

pub mod auth;
pub mod builders;
pub mod client;
pub mod core;
pub mod error;
pub mod http;
pub mod payments;
pub mod signing;
pub mod telemetry;
pub mod types;

// Re-export main client
pub use client::TrueLayerClient;

// Re-export builders
pub use builders::TrueLayerClientBuilder;

// Re-export core types
pub use crate::core::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestHttpTransport};

// Re-export errors
pub use error::{
    AuthenticationError, ConfigurationError, ProtocolError, SigningConfigurationError,
    TransportError, TrueLayerError, TrueLayerResult,
};

// Re-export auth
pub use auth::{Authenticator, ClientCredentialsAuthenticator, TokenCache};

// Re-export signing
pub use signing::{RequestSigner, SignedRequestContext, SigningAlgorithm};

// Re-export http pipeline
pub use http::{ApiError, ApiRequest, ApiResponse, Interceptor, InterceptorChain, ProblemDetails};

// Re-export payments
pub use payments::{CreatePaymentResponse, HostedPaymentPageLinkBuilder, PaymentUser, PaymentsClient};

// Re-export types
pub use types::{AccessToken, Credentials, Environment, Headers, SigningOptions, VersionInfo};

// Re-export mocks for testing
pub use auth::MockAuthenticator;
pub use crate::core::MockHttpTransport;
