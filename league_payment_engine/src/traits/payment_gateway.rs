use lps_common::Cents;
use thiserror::Error;

/// Checkout statuses the engine acts on. Anything else is treated as "still in progress" and echoed to the caller.
pub const CHECKOUT_COMPLETED: &str = "completed";
pub const CHECKOUT_EXPIRED: &str = "expired";
pub const CHECKOUT_FAILED: &str = "failed";

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The gateway could not be reached at all (network error, timeout).
    #[error("The payment gateway could not be reached. {0}")]
    Unavailable(String),
    /// The gateway answered with a well-formed non-2xx response.
    #[error("The payment gateway rejected the request with status {status}. {message}")]
    Rejected { status: u16, message: String },
    #[error("The payment gateway returned an unusable response. {0}")]
    InvalidResponse(String),
}

/// The state of a checkout session as reported by the gateway.
#[derive(Debug, Clone)]
pub struct CheckoutState {
    pub checkout_id: String,
    pub status: String,
    /// The settled amount in minor units, when the gateway reports one.
    pub amount: Option<Cents>,
    pub payment_id: Option<String>,
}

impl CheckoutState {
    pub fn is_completed(&self) -> bool {
        self.status == CHECKOUT_COMPLETED
    }

    pub fn is_terminated(&self) -> bool {
        self.status == CHECKOUT_EXPIRED || self.status == CHECKOUT_FAILED
    }
}

/// Checkout-status lookup at the payment gateway.
///
/// Both failure modes ([`GatewayError::Unavailable`] and [`GatewayError::Rejected`]) mean the same thing to the
/// reconciliation flow: no confirmation. Callers resolve either to "pending", never to success or failure.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Whether the client holds usable credentials. When this is `false`, verification is impossible and the flow
    /// must resolve to pending without calling [`Self::fetch_checkout`].
    fn is_configured(&self) -> bool;

    async fn fetch_checkout(&self, checkout_id: &str) -> Result<CheckoutState, GatewayError>;
}
