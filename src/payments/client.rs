//! Payments Client

use serde::Serialize;

use crate::client::TrueLayerClient;
use crate::error::{ProtocolError, TrueLayerResult};
use crate::http::{ApiRequest, ApiResponse};
use crate::payments::CreatePaymentResponse;
use crate::types::Headers;

const PAYMENTS_PATH: &str = "/v3/payments";

/// Payments API sub-client, borrowed from [`TrueLayerClient::payments`].
#[derive(Clone, Copy, Debug)]
pub struct PaymentsClient<'a> {
    client: &'a TrueLayerClient,
}

impl<'a> PaymentsClient<'a> {
    pub(crate) fn new(client: &'a TrueLayerClient) -> Self {
        Self { client }
    }

    /// Create a payment.
    ///
    /// The request is authenticated, carries an idempotency key (a fresh one unless `headers`
    /// supplies it) and is signed, so the client must have signing options.
    pub async fn create_payment<R: Serialize + ?Sized>(
        &self,
        request: &R,
        headers: Option<Headers>,
    ) -> TrueLayerResult<ApiResponse<CreatePaymentResponse>> {
        let mut api_request = ApiRequest::post(PAYMENTS_PATH).json(request)?.signed(true);
        if let Some(headers) = headers {
            api_request = api_request.headers(&headers);
        }
        self.client.send(api_request).await
    }

    /// Fetch a payment by id.
    pub async fn get_payment(
        &self,
        payment_id: &str,
    ) -> TrueLayerResult<ApiResponse<serde_json::Value>> {
        if payment_id.trim().is_empty() || payment_id.contains(['/', '?', '#']) {
            return Err(ProtocolError::InvalidRequest {
                message: format!("invalid payment id '{payment_id}'"),
            }
            .into());
        }
        self.client
            .send(ApiRequest::get(format!("{PAYMENTS_PATH}/{payment_id}")))
            .await
    }
}
