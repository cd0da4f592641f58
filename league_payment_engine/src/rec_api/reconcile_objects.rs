use std::fmt::Display;

use lps_common::Cents;

use crate::db_types::OrderNumber;

//--------------------------------------    VerifyOutcome     ---------------------------------------------------------
/// The result of a poll-path verification.
///
/// There is deliberately no "failed" outcome here. The absence of gateway confirmation always resolves to
/// [`VerifyOutcome::Pending`]; a checkout that the gateway reports as expired or failed is still only "pending" to
/// the polling client, and is cancelled by the webhook or sweep paths instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The order was already paid before this verification started. Nothing was written.
    AlreadyPaid,
    /// The gateway confirmed completion and this call applied the `paid` transition.
    Confirmed,
    /// No confirmation. `gateway_status` carries the gateway's verbatim status when one was obtained.
    Pending { gateway_status: Option<String> },
}

impl VerifyOutcome {
    /// The status label reported to clients: `paid`, the gateway's own status, or `pending`.
    pub fn status_label(&self) -> &str {
        match self {
            VerifyOutcome::AlreadyPaid | VerifyOutcome::Confirmed => "paid",
            VerifyOutcome::Pending { gateway_status: Some(status) } => status.as_str(),
            VerifyOutcome::Pending { gateway_status: None } => "pending",
        }
    }
}

//--------------------------------------   GatewayEventKind   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEventKind {
    PaymentSucceeded,
    PaymentFailed,
    CheckoutExpired,
    Other(String),
}

impl From<&str> for GatewayEventKind {
    fn from(value: &str) -> Self {
        match value {
            "payment.succeeded" => Self::PaymentSucceeded,
            "payment.failed" => Self::PaymentFailed,
            "checkout.expired" => Self::CheckoutExpired,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Display for GatewayEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayEventKind::PaymentSucceeded => write!(f, "payment.succeeded"),
            GatewayEventKind::PaymentFailed => write!(f, "payment.failed"),
            GatewayEventKind::CheckoutExpired => write!(f, "checkout.expired"),
            GatewayEventKind::Other(t) => write!(f, "{t}"),
        }
    }
}

//--------------------------------------     GatewayEvent     ---------------------------------------------------------
/// A webhook notification after lenient parsing and order-number validation.
///
/// Conversion from the raw wire format happens at the server boundary; by the time an event reaches the engine its
/// order number is canonical. Events that cannot be converted are acknowledged and dropped before they get here.
#[derive(Debug, Clone)]
pub struct GatewayEvent {
    pub kind: GatewayEventKind,
    pub event_id: Option<String>,
    pub order_number: OrderNumber,
    /// For success events: the settled amount in minor units, when reported.
    pub amount: Option<Cents>,
    pub payment_id: Option<String>,
}

//--------------------------------------     EventOutcome     ---------------------------------------------------------
/// What the webhook path did with an event. Every variant is acknowledged with HTTP 200 by the caller; the variants
/// exist for logging and tests, not for flow control at the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// The `paid` transition was applied.
    Confirmed,
    /// A cancel was attempted; `applied` is false when the guard rejected it (the order was already paid, or does
    /// not exist).
    Cancelled { applied: bool },
    /// Duplicate delivery of a success event for an order that is already paid. Skipped.
    AlreadyPaid,
    /// Success event for an order we have no record of. Cannot reconcile; logged and skipped.
    UnknownOrder,
    /// The reported amount does not match the stored order total. Treated as a security anomaly; the order is left
    /// untouched.
    AmountMismatch,
    /// An event type this handler does not act on.
    Ignored(String),
}

//--------------------------------------   ReconcileSummary   ---------------------------------------------------------
/// Bookkeeping for one pass of the pending-order sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub checked: usize,
    pub confirmed: usize,
    pub cancelled: usize,
    pub errors: usize,
}

impl Display for ReconcileSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Checked: {}, Confirmed: {}, Cancelled: {}, Errors: {}",
            self.checked, self.confirmed, self.cancelled, self.errors
        )
    }
}
