//! Integration tests using WireMock
//!
//! These tests drive the client end to end against a mock server standing in for the
//! authentication server, the payments API and the hosted payment page.

mod auth;
mod payments;

use serde_json::json;
use std::time::Duration;
use truelayer_integration::{
    Credentials, Environment, SigningOptions, TrueLayerClient, TrueLayerClientBuilder,
    VersionInfo,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const EC512: &[u8] = include_bytes!("../resources/keys/ec512-private-key.pem");
pub const EC512_WITH_PARAMS: &[u8] =
    include_bytes!("../resources/keys/ec512-private-key-with-params.pem");
pub const EC256: &[u8] = include_bytes!("../resources/keys/ec256-private-key.pem");
pub const ED25519: &[u8] = include_bytes!("../resources/keys/ed25519-private-key.pem");

pub const TOKEN_PATH: &str = "/connect/token";

/// Builder pointing every endpoint at `server`.
pub fn client_builder(server: &MockServer) -> TrueLayerClientBuilder {
    let uri = server.uri();
    TrueLayerClient::builder(Credentials::new("a-client-id", "a-secret"))
        .with_environment(Environment::custom(&uri, &uri, &uri).expect("mock server URI"))
        .with_signing_options(SigningOptions::new("a-key-id", EC512))
        .with_version_info(VersionInfo::new("truelayer-integration", "DEVELOPMENT"))
        .with_timeout(Duration::from_secs(5))
}

pub fn token_response(access_token: &str, expires_in: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": access_token,
        "expires_in": expires_in,
        "token_type": "Bearer",
        "scope": "payments"
    }))
}

/// Token endpoint answering every call with `tok1`.
pub async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("tok1", 3600))
        .mount(server)
        .await;
}

/// Requests the server received on `request_path`.
pub async fn requests_to(server: &MockServer, request_path: &str) -> Vec<wiremock::Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == request_path)
        .collect()
}

pub fn header_value<'a>(request: &'a wiremock::Request, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|v| v.to_str().ok())
}
