//! Integration tests for token acquisition and caching

use super::*;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};
use truelayer_integration::{AuthenticationError, TrueLayerError};
use wiremock::matchers::{body_string_contains, header};

#[tokio::test]
async fn test_token_is_requested_with_client_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(header("tl-agent", "truelayer-integration/DEVELOPMENT"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=a-client-id"))
        .and(body_string_contains("client_secret=a-secret"))
        .and(body_string_contains("scope=payments"))
        .respond_with(token_response("tok1", 3600))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_builder(&server).build().unwrap();
    let token = assert_ok!(client.get_access_token().await);

    assert_eq!(token.secret(), "tok1");
    assert_eq!(token.scope, "payments");
}

#[tokio::test]
async fn test_token_is_cached_while_valid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("tok1", 3600))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_builder(&server).build().unwrap();
    let first = assert_ok!(client.get_access_token().await);
    let second = assert_ok!(client.get_access_token().await);

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_expired_token_is_replaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("tok1", 1))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("tok2", 3600))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_builder(&server)
        .with_token_safety_margin(Duration::ZERO)
        .build()
        .unwrap();

    let first = assert_ok!(client.get_access_token().await);
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let second = assert_ok!(client.get_access_token().await);

    assert_eq!(first.secret(), "tok1");
    assert_eq!(second.secret(), "tok2");
}

#[tokio::test]
async fn test_concurrent_callers_share_one_token_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("tok1", 3600).set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    let client = Arc::new(client_builder(&server).build().unwrap());
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.get_access_token().await })
        })
        .collect();

    for handle in handles {
        let token = assert_ok!(handle.await.unwrap());
        assert_eq!(token.secret(), "tok1");
    }
}

#[tokio::test]
async fn test_token_endpoint_error_keeps_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_client"}"#))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_builder(&server).build().unwrap();
    let error = assert_err!(client.get_access_token().await);

    match error {
        TrueLayerError::Authentication(AuthenticationError::TokenRequestFailed { status, body }) => {
            assert_eq!(status, 400);
            assert_eq!(body, r#"{"error":"invalid_client"}"#);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Failures are not cached.
    assert_err!(client.get_access_token().await);
}

#[tokio::test]
async fn test_malformed_token_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client_builder(&server).build().unwrap();
    let error = assert_err!(client.get_access_token().await);

    assert!(matches!(
        error,
        TrueLayerError::Authentication(AuthenticationError::MalformedTokenResponse { .. })
    ));
}
