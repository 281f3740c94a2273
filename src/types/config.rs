//! Configuration Types
//!
//! Credentials, signing material and endpoint configuration consumed by the client.

use secrecy::{SecretString, SecretVec};
use url::Url;

use crate::error::{ConfigurationError, TrueLayerError};

/// Scope requested when the caller does not set one.
pub const DEFAULT_SCOPE: &str = "payments";

/// Client credentials for the client-credentials grant.
#[derive(Clone)]
pub struct Credentials {
    /// Client identifier.
    pub client_id: String,
    /// Client secret.
    pub client_secret: SecretString,
    /// Scopes to request with each token.
    pub scopes: Vec<String>,
}

impl Credentials {
    /// Create credentials requesting the default `payments` scope.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
            scopes: vec![DEFAULT_SCOPE.to_string()],
        }
    }

    /// Replace the requested scopes.
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigurationError> {
        use secrecy::ExposeSecret;

        if self.client_id.trim().is_empty() {
            return Err(ConfigurationError::MissingRequired {
                field: "client_id".to_string(),
            });
        }
        if self.client_secret.expose_secret().is_empty() {
            return Err(ConfigurationError::MissingRequired {
                field: "client_secret".to_string(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Key material used to sign mutating requests.
pub struct SigningOptions {
    /// Key identifier registered with TrueLayer, embedded as `kid`.
    pub key_id: String,
    /// PEM-encoded private key.
    pub private_key: SecretVec<u8>,
}

impl SigningOptions {
    /// Create signing options from a key id and PEM bytes.
    pub fn new(key_id: impl Into<String>, private_key: impl Into<Vec<u8>>) -> Self {
        Self {
            key_id: key_id.into(),
            private_key: SecretVec::new(private_key.into()),
        }
    }
}

impl std::fmt::Debug for SigningOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningOptions")
            .field("key_id", &self.key_id)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Base URLs of the TrueLayer services.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Environment {
    /// Authentication server (token endpoint host).
    pub auth_url: Url,
    /// Payments API.
    pub api_url: Url,
    /// Hosted payment page.
    pub hpp_url: Url,
}

impl Environment {
    /// Production environment.
    pub fn live() -> Self {
        Self::from_static(
            "https://auth.truelayer.com",
            "https://api.truelayer.com",
            "https://payment.truelayer.com",
        )
    }

    /// Sandbox environment.
    pub fn sandbox() -> Self {
        Self::from_static(
            "https://auth.truelayer-sandbox.com",
            "https://api.truelayer-sandbox.com",
            "https://payment.truelayer-sandbox.com",
        )
    }

    /// Custom environment, e.g. a mock server in tests.
    pub fn custom(auth_url: &str, api_url: &str, hpp_url: &str) -> Result<Self, TrueLayerError> {
        Ok(Self {
            auth_url: parse_url("auth_url", auth_url)?,
            api_url: parse_url("api_url", api_url)?,
            hpp_url: parse_url("hpp_url", hpp_url)?,
        })
    }

    fn from_static(auth_url: &str, api_url: &str, hpp_url: &str) -> Self {
        // Only called with the literals above, which always parse.
        let parse = |u: &str| Url::parse(u).unwrap_or_else(|_| unreachable!("static URL {u}"));
        Self {
            auth_url: parse(auth_url),
            api_url: parse(api_url),
            hpp_url: parse(hpp_url),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::live()
    }
}

fn parse_url(field: &str, url: &str) -> Result<Url, ConfigurationError> {
    Url::parse(url).map_err(|_| ConfigurationError::InvalidUrl {
        field: field.to_string(),
        url: url.to_string(),
    })
}

/// Append `path` (optionally with a `?query`) to the path of `base`.
///
/// Unlike `Url::join`, a base path such as `https://host/gateway` is kept. `None` when `base`
/// cannot carry a path.
pub(crate) fn append_path(base: &Url, path: &str) -> Option<Url> {
    let (path, query) = match path.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path, None),
    };

    let mut url = base.clone();
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .extend(path.split('/').filter(|segment| !segment.is_empty()));
    url.set_query(query);
    url.set_fragment(None);
    Some(url)
}

/// Library identification sent in the `TL-Agent` header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionInfo {
    /// Library name, e.g. `truelayer-integration`.
    pub library_name: String,
    /// Library version.
    pub library_version: String,
}

impl VersionInfo {
    /// Create version info from a name and version.
    pub fn new(library_name: impl Into<String>, library_version: impl Into<String>) -> Self {
        Self {
            library_name: library_name.into(),
            library_version: library_version.into(),
        }
    }

    /// Header value, `name/version`.
    pub fn agent(&self) -> String {
        format!("{}/{}", self.library_name, self.library_version)
    }
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }
}
