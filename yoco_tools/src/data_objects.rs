use lps_common::Cents;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Checkout status values as reported by the gateway.
///
/// Yoco reports statuses as free-form lowercase strings; only the three below drive state transitions on our side.
/// Everything else is "still in progress" and is passed through to callers verbatim.
pub mod checkout_status {
    pub const COMPLETED: &str = "completed";
    pub const EXPIRED: &str = "expired";
    pub const FAILED: &str = "failed";
}

//--------------------------------------      Checkout      ----------------------------------------------------------
/// A checkout session as returned by `GET /checkouts/{id}` and `POST /checkouts`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub amount: Option<Cents>,
    #[serde(default)]
    pub currency: Option<String>,
    /// Set once a payment has been made against the checkout.
    #[serde(default)]
    pub payment_id: Option<String>,
    /// The URL the customer must be redirected to in order to complete payment.
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl Checkout {
    pub fn is_completed(&self) -> bool {
        self.status == checkout_status::COMPLETED
    }

    pub fn is_terminated(&self) -> bool {
        self.status == checkout_status::EXPIRED || self.status == checkout_status::FAILED
    }
}

//--------------------------------------  NewCheckoutRequest  --------------------------------------------------------
/// Request body for creating a checkout session.
///
/// The amount is always computed server-side from the stored order total. Client-supplied amounts are never
/// forwarded to the gateway.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCheckoutRequest {
    pub amount: Cents,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    pub failure_url: String,
    pub metadata: CheckoutMetadata,
}

/// Metadata echoed back by the gateway in webhook events. `order_id` is the field the reconciliation flow keys on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutMetadata {
    pub order_id: String,
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub item_description: String,
}
