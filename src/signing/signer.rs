//! Request Signer
//!
//! Detached JWS over a request's method, path, idempotency key and body, sent in the
//! `Tl-Signature` header.
//!
//! Layout of the produced value: `base64url(header)..base64url(signature)`, where the
//! signature covers `base64url(header).base64url(payload)` and the payload is
//!
//! ```text
//! POST /v3/payments
//! Idempotency-Key: 8d9a3f5c-...
//! {"amount_in_minor":100,...}
//! ```

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::trace;

use crate::core::HttpMethod;
use crate::error::SigningConfigurationError;
use crate::signing::key::{PrivateKey, SigningAlgorithm};
use crate::types::{names, SigningOptions};

const TL_VERSION: &str = "2";

/// Inputs of one signature. Built per mutating request and consumed by [`RequestSigner::sign`].
#[derive(Clone, Debug)]
pub struct SignedRequestContext<'a> {
    pub method: HttpMethod,
    pub path: &'a str,
    pub body: &'a [u8],
    pub timestamp: DateTime<Utc>,
    pub idempotency_key: Option<&'a str>,
}

impl<'a> SignedRequestContext<'a> {
    /// Context for a request without idempotency key.
    pub fn new(method: HttpMethod, path: &'a str, body: &'a [u8]) -> Self {
        Self {
            method,
            path,
            body,
            timestamp: Utc::now(),
            idempotency_key: None,
        }
    }

    /// Cover `key` with the signature.
    pub fn idempotency_key(mut self, key: &'a str) -> Self {
        self.idempotency_key = Some(key);
        self
    }

    fn payload(&self) -> Vec<u8> {
        let mut payload = format!("{} {}\n", self.method.as_str(), self.path).into_bytes();
        if let Some(key) = self.idempotency_key {
            payload.extend_from_slice(format!("{}: {}\n", names::IDEMPOTENCY_KEY, key).as_bytes());
        }
        payload.extend_from_slice(self.body);
        payload
    }
}

#[derive(Serialize)]
struct JwsHeader<'a> {
    alg: &'static str,
    kid: &'a str,
    tl_version: &'static str,
    tl_headers: &'static str,
}

/// Request Signer.
///
/// Key material is parsed once here; a key that cannot sign is rejected at construction.
pub struct RequestSigner {
    key_id: String,
    key: PrivateKey,
}

impl RequestSigner {
    /// Create a signer from PEM key material.
    pub fn new(options: &SigningOptions) -> Result<Self, SigningConfigurationError> {
        if options.key_id.trim().is_empty() {
            return Err(SigningConfigurationError::MissingKeyId);
        }
        let key = PrivateKey::from_pem(options.private_key.expose_secret())?;

        Ok(Self {
            key_id: options.key_id.clone(),
            key,
        })
    }

    /// Key identifier embedded as `kid`.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Algorithm selected from the key material.
    pub fn algorithm(&self) -> SigningAlgorithm {
        self.key.algorithm()
    }

    /// Produce the `Tl-Signature` header value for `context`.
    pub fn sign(&self, context: SignedRequestContext<'_>) -> Result<String, SigningConfigurationError> {
        let header = JwsHeader {
            alg: self.key.algorithm().as_str(),
            kid: &self.key_id,
            tl_version: TL_VERSION,
            tl_headers: if context.idempotency_key.is_some() {
                names::IDEMPOTENCY_KEY
            } else {
                ""
            },
        };
        let header_json =
            serde_json::to_vec(&header).map_err(|e| SigningConfigurationError::SigningFailed {
                message: e.to_string(),
            })?;

        let encoded_header = URL_SAFE_NO_PAD.encode(header_json);
        let encoded_payload = URL_SAFE_NO_PAD.encode(context.payload());
        let signing_input = format!("{encoded_header}.{encoded_payload}");

        let signature = self.key.sign(signing_input.as_bytes())?;

        trace!(
            method = %context.method,
            path = context.path,
            timestamp = %context.timestamp,
            "request signed"
        );

        Ok(format!(
            "{encoded_header}..{}",
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm())
            .finish()
    }
}
