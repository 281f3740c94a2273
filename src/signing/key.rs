//! Signing Keys
//!
//! PEM key loading. The key format decides the JWS algorithm:
//!
//! - `EC PRIVATE KEY` (SEC1) or `PRIVATE KEY` (PKCS#8) on curve P-521 signs `ES512`
//! - `PRIVATE KEY` (PKCS#8) holding an Ed25519 key signs `EdDSA`
//!
//! Other PEM sections, such as the `EC PARAMETERS` block OpenSSL writes ahead of an EC key,
//! are skipped. Both algorithms produce deterministic signatures.

use ecdsa::hazmat::{bits2field, sign_prehashed};
use p521::elliptic_curve::PrimeField;
use p521::pkcs8::DecodePrivateKey;
use p521::{FieldBytes, NistP521, Scalar};
use rfc6979::HmacDrbg;
use ring::signature::Ed25519KeyPair;
use rustls_pemfile::Item;
use sha2::{Digest, Sha512};

use crate::error::SigningConfigurationError;

/// JWS algorithm of a signing key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SigningAlgorithm {
    /// ECDSA on P-521 with SHA-512.
    Es512,
    /// Ed25519.
    EdDsa,
}

impl SigningAlgorithm {
    /// Value of the JWS `alg` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Es512 => "ES512",
            Self::EdDsa => "EdDSA",
        }
    }
}

/// Parsed private key.
pub(crate) enum PrivateKey {
    Es512(p521::ecdsa::SigningKey),
    Ed25519(Ed25519KeyPair),
}

impl PrivateKey {
    /// Load the first private key found in a PEM document.
    pub(crate) fn from_pem(pem: &[u8]) -> Result<Self, SigningConfigurationError> {
        let mut reader = pem;
        let mut unsupported = None;

        for item in rustls_pemfile::read_all(&mut reader) {
            let item = item.map_err(|e| SigningConfigurationError::InvalidPem {
                message: e.to_string(),
            })?;

            match item {
                Item::Sec1Key(key) => return Self::from_sec1_der(key.secret_sec1_der()),
                Item::Pkcs8Key(key) => return Self::from_pkcs8_der(key.secret_pkcs8_der()),
                Item::Pkcs1Key(_) => unsupported = Some("RSA keys are not supported"),
                _ => {
                    unsupported = unsupported.or(Some("PEM document holds no private key"));
                }
            }
        }

        Err(match unsupported {
            Some(message) => SigningConfigurationError::UnsupportedKey {
                message: message.to_string(),
            },
            None => SigningConfigurationError::InvalidPem {
                message: "no PEM section found".to_string(),
            },
        })
    }

    fn from_sec1_der(der: &[u8]) -> Result<Self, SigningConfigurationError> {
        let secret = p521::SecretKey::from_sec1_der(der).map_err(|_| {
            SigningConfigurationError::UnsupportedKey {
                message: "EC key is not on curve P-521".to_string(),
            }
        })?;
        es512(secret)
    }

    fn from_pkcs8_der(der: &[u8]) -> Result<Self, SigningConfigurationError> {
        if let Ok(secret) = p521::SecretKey::from_pkcs8_der(der) {
            es512(secret)
        } else if let Ok(pair) = Ed25519KeyPair::from_pkcs8_maybe_unchecked(der) {
            Ok(Self::Ed25519(pair))
        } else {
            Err(SigningConfigurationError::UnsupportedKey {
                message: "PKCS#8 key is neither P-521 nor Ed25519".to_string(),
            })
        }
    }

    pub(crate) fn algorithm(&self) -> SigningAlgorithm {
        match self {
            Self::Es512(_) => SigningAlgorithm::Es512,
            Self::Ed25519(_) => SigningAlgorithm::EdDsa,
        }
    }

    /// Sign `message`, returning the raw JWS signature bytes.
    pub(crate) fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SigningConfigurationError> {
        match self {
            Self::Es512(key) => sign_es512(key, message)
                .map(|signature| signature.to_bytes().to_vec())
                .map_err(|e| SigningConfigurationError::SigningFailed {
                    message: e.to_string(),
                }),
            Self::Ed25519(pair) => Ok(pair.sign(message).as_ref().to_vec()),
        }
    }
}

fn es512(secret: p521::SecretKey) -> Result<PrivateKey, SigningConfigurationError> {
    p521::ecdsa::SigningKey::from_bytes(&secret.to_bytes())
        .map(PrivateKey::Es512)
        .map_err(|e| SigningConfigurationError::UnsupportedKey {
            message: e.to_string(),
        })
}

/// ECDSA P-521 over SHA-512 with the nonce drawn from an RFC 6979 HMAC-DRBG seeded by the
/// key and the digest.
///
/// The DRBG output is cut to the 521-bit order length before the range check, so a
/// candidate is rarely rejected.
fn sign_es512(
    key: &p521::ecdsa::SigningKey,
    message: &[u8],
) -> Result<p521::ecdsa::Signature, ecdsa::Error> {
    let z = bits2field::<NistP521>(&Sha512::digest(message))?;
    let d: &Scalar = key.as_nonzero_scalar().as_ref();
    let mut drbg = HmacDrbg::<Sha512>::new(&key.to_bytes(), &z, &[]);

    loop {
        let mut candidate = FieldBytes::default();
        drbg.fill_bytes(&mut candidate);
        candidate[0] &= 0x01;

        let Some(k) = Option::<Scalar>::from(Scalar::from_repr(candidate)) else {
            continue;
        };
        if let Ok((signature, _)) = sign_prehashed::<NistP521, _>(d, k, &z) {
            return Ok(signature);
        }
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PrivateKey")
            .field(&self.algorithm())
            .finish()
    }
}
