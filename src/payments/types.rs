//! Payment Types

use serde::{Deserialize, Serialize};

/// Response of `POST /v3/payments`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePaymentResponse {
    /// Payment identifier.
    pub id: String,
    /// Token the hosted payment page uses to act on the payment.
    pub resource_token: String,
    /// Payer, as registered by TrueLayer.
    pub user: PaymentUser,
    /// Initial payment status, e.g. `authorization_required`.
    pub status: String,
}

/// User a payment was created for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentUser {
    pub id: String,
}
