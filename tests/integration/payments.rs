//! Integration tests for the payments API and hosted payment page

use super::*;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tokio_test::{assert_err, assert_ok};
use truelayer_integration::{Headers, SigningConfigurationError, TrueLayerError};
use wiremock::matchers::{header, header_exists};

const PAYMENTS_PATH: &str = "/v3/payments";

fn payment_request() -> serde_json::Value {
    json!({
        "amount_in_minor": 100,
        "currency": "GBP",
        "payment_method": {
            "type": "bank_transfer",
            "provider_selection": {"type": "user_selected"},
            "beneficiary": {
                "type": "merchant_account",
                "merchant_account_id": "e83c4c20-b2ad-4b73-8a32-ee855362d72a"
            }
        },
        "user": {"name": "Andrea Di Lisio", "email": "andrea@truelayer.com"}
    })
}

fn created_payment() -> serde_json::Value {
    json!({
        "id": "1c2d3e4f-5a6b-7c8d-9e0f-a1b2c3d4e5f6",
        "resource_token": "a-resource-token",
        "user": {"id": "ec01db2d-9c57-4a1a-b0b1-f2dc46ab4d6b"},
        "status": "authorization_required"
    })
}

#[tokio::test]
async fn test_create_payment_sends_required_headers() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("POST"))
        .and(path(PAYMENTS_PATH))
        .and(header("authorization", "Bearer tok1"))
        .and(header("tl-agent", "truelayer-integration/DEVELOPMENT"))
        .and(header("content-type", "application/json"))
        .and(header_exists("idempotency-key"))
        .and(header_exists("tl-signature"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(created_payment())
                .insert_header("X-Tl-Correlation-Id", "a-correlation-id"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_builder(&server).build().unwrap();
    let response = assert_ok!(client.payments().create_payment(&payment_request(), None).await);

    assert_eq!(response.status(), 201);
    assert_eq!(response.correlation_id(), Some("a-correlation-id"));
    let payment = response.into_result().unwrap();
    assert_eq!(payment.resource_token, "a-resource-token");
    assert_eq!(payment.status, "authorization_required");

    let sent = requests_to(&server, PAYMENTS_PATH).await;
    let signature = header_value(&sent[0], "tl-signature").unwrap();
    let (jws_header, _) = signature.split_once("..").unwrap();
    let jws_header: serde_json::Value =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(jws_header).unwrap()).unwrap();
    assert_eq!(jws_header["alg"], "ES512");
    assert_eq!(jws_header["kid"], "a-key-id");
    assert_eq!(jws_header["tl_headers"], "Idempotency-Key");
}

#[tokio::test]
async fn test_create_payment_with_ed25519_key() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("POST"))
        .and(path(PAYMENTS_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(created_payment()))
        .mount(&server)
        .await;

    let client = client_builder(&server)
        .with_signing_options(SigningOptions::new("an-ed25519-key", ED25519))
        .build()
        .unwrap();
    assert_ok!(client.payments().create_payment(&payment_request(), None).await);

    let sent = requests_to(&server, PAYMENTS_PATH).await;
    let signature = header_value(&sent[0], "tl-signature").unwrap();
    let (jws_header, _) = signature.split_once("..").unwrap();
    let jws_header: serde_json::Value =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(jws_header).unwrap()).unwrap();
    assert_eq!(jws_header["alg"], "EdDSA");
    assert_eq!(jws_header["kid"], "an-ed25519-key");
}

#[tokio::test]
async fn test_create_payment_with_openssl_generated_key() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("POST"))
        .and(path(PAYMENTS_PATH))
        .and(header_exists("tl-signature"))
        .respond_with(ResponseTemplate::new(201).set_body_json(created_payment()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_builder(&server)
        .with_signing_options(SigningOptions::new("a-key-id", EC512_WITH_PARAMS))
        .build()
        .unwrap();
    let response = assert_ok!(client.payments().create_payment(&payment_request(), None).await);
    assert!(response.is_success());
}

#[tokio::test]
async fn test_base_url_paths_are_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gateway/auth/connect/token"))
        .respond_with(token_response("tok1", 3600))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gateway/v3/payments/p1"))
        .and(header("authorization", "Bearer tok1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "p1"})))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let environment = Environment::custom(
        &format!("{uri}/gateway/auth"),
        &format!("{uri}/gateway"),
        &uri,
    )
    .unwrap();
    let client = client_builder(&server)
        .with_environment(environment)
        .build()
        .unwrap();

    let response = assert_ok!(client.payments().get_payment("p1").await);
    assert_eq!(response.data().unwrap()["id"], "p1");
}

#[tokio::test]
async fn test_create_payment_forwards_caller_headers() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("POST"))
        .and(path(PAYMENTS_PATH))
        .and(header("idempotency-key", "a-custom-key"))
        .and(header("x-forwarded-for", "1.2.3.4"))
        .and(header("x-device-user-agent", "ADummyUserAgent"))
        .respond_with(ResponseTemplate::new(201).set_body_json(created_payment()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_builder(&server).build().unwrap();
    let headers = Headers::new()
        .idempotency_key("a-custom-key")
        .x_forwarded_for("1.2.3.4")
        .x_device_user_agent("ADummyUserAgent");

    let response = assert_ok!(
        client
            .payments()
            .create_payment(&payment_request(), Some(headers))
            .await
    );
    assert!(response.is_success());
}

#[tokio::test]
async fn test_each_create_payment_gets_a_fresh_idempotency_key() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("POST"))
        .and(path(PAYMENTS_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(created_payment()))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_builder(&server).build().unwrap();
    assert_ok!(client.payments().create_payment(&payment_request(), None).await);
    assert_ok!(client.payments().create_payment(&payment_request(), None).await);

    let sent = requests_to(&server, PAYMENTS_PATH).await;
    assert_ne!(
        header_value(&sent[0], "idempotency-key"),
        header_value(&sent[1], "idempotency-key")
    );
}

#[tokio::test]
async fn test_get_payment_is_not_idempotent_or_signed() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    let payment_path = "/v3/payments/1c2d3e4f";
    Mock::given(method("GET"))
        .and(path(payment_path))
        .and(header("authorization", "Bearer tok1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "1c2d3e4f", "status": "executed"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_builder(&server).build().unwrap();
    let response = assert_ok!(client.payments().get_payment("1c2d3e4f").await);
    assert_eq!(response.data().unwrap()["status"], "executed");

    let sent = requests_to(&server, payment_path).await;
    assert!(header_value(&sent[0], "idempotency-key").is_none());
    assert!(header_value(&sent[0], "tl-signature").is_none());
}

#[tokio::test]
async fn test_validation_error_is_returned_in_envelope() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    let problem = r#"{"type":"https://docs.truelayer.com/docs/error-types#invalid-parameters","title":"Invalid Parameters","status":422,"trace_id":"a-trace-id","detail":"Some fields are invalid.","errors":{"currency":["must be GBP or EUR"]}}"#;
    Mock::given(method("POST"))
        .and(path(PAYMENTS_PATH))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_raw(problem, "application/problem+json")
                .insert_header("X-Tl-Correlation-Id", "a-correlation-id"),
        )
        .mount(&server)
        .await;

    let client = client_builder(&server).build().unwrap();
    let response = assert_ok!(client.payments().create_payment(&payment_request(), None).await);

    let error = response.into_result().unwrap_err();
    assert_eq!(error.status, 422);
    assert_eq!(error.body, problem);
    assert_eq!(error.correlation_id(), Some("a-correlation-id"));
    let details = error.problem.unwrap();
    assert_eq!(details.title.as_deref(), Some("Invalid Parameters"));
    assert_eq!(details.trace_id.as_deref(), Some("a-trace-id"));
}

#[tokio::test]
async fn test_unparseable_success_body_is_returned_as_error() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("POST"))
        .and(path(PAYMENTS_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"unexpected": true})))
        .mount(&server)
        .await;

    let client = client_builder(&server).build().unwrap();
    let response = assert_ok!(client.payments().create_payment(&payment_request(), None).await);

    let error = response.error().unwrap();
    assert_eq!(error.status, 201);
    assert_eq!(error.body, r#"{"unexpected":true}"#);
}

#[tokio::test]
async fn test_unauthorized_is_replayed_with_same_idempotency_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("tok1", 3600))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("tok2", 3600))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(PAYMENTS_PATH))
        .and(header("authorization", "Bearer tok1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(PAYMENTS_PATH))
        .and(header("authorization", "Bearer tok2"))
        .respond_with(ResponseTemplate::new(201).set_body_json(created_payment()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_builder(&server)
        .with_retry_on_unauthorized(true)
        .build()
        .unwrap();
    let response = assert_ok!(client.payments().create_payment(&payment_request(), None).await);
    assert!(response.is_success());

    let sent = requests_to(&server, PAYMENTS_PATH).await;
    assert_eq!(sent.len(), 2);
    assert_eq!(
        header_value(&sent[0], "idempotency-key"),
        header_value(&sent[1], "idempotency-key")
    );
    // Same request, key and body: the deterministic signature does not change.
    assert_eq!(
        header_value(&sent[0], "tl-signature"),
        header_value(&sent[1], "tl-signature")
    );
}

#[tokio::test]
async fn test_unauthorized_without_replay_is_returned() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("POST"))
        .and(path(PAYMENTS_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_builder(&server).build().unwrap();
    let response = assert_ok!(client.payments().create_payment(&payment_request(), None).await);
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("GET"))
        .and(path("/v3/payments/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = client_builder(&server)
        .with_timeout(Duration::from_millis(300))
        .build()
        .unwrap();
    let error = assert_err!(client.payments().get_payment("slow").await);

    assert!(error.is_timeout());
    assert!(matches!(error, TrueLayerError::Timeout { .. }));
}

#[tokio::test]
async fn test_unsupported_key_fails_at_build() {
    let server = MockServer::start().await;

    let result = client_builder(&server)
        .with_signing_options(SigningOptions::new("a-key-id", EC256))
        .build();

    assert!(matches!(
        result,
        Err(TrueLayerError::SigningConfiguration(
            SigningConfigurationError::UnsupportedKey { .. }
        ))
    ));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_hosted_payment_page_link() {
    let server = MockServer::start().await;
    let client = client_builder(&server).build().unwrap();

    let link = client
        .hpp()
        .link("a-payment-id", "a-resource-token", "https://my.return.uri");

    assert_eq!(
        link.as_str(),
        format!(
            "{}/payments#payment_id=a-payment-id&resource_token=a-resource-token&return_uri=https%3A%2F%2Fmy.return.uri",
            server.uri()
        )
    );
}
