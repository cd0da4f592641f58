use std::{fmt::Display, str::FromStr, sync::OnceLock};

use chrono::{DateTime, Utc};
use log::error;
use lps_common::{Cents, ZAR_CURRENCY_CODE};
use regex::Regex;
use serde::{Deserialize, Serialize};
pub use sqlx::types::Json;
use sqlx::{FromRow, Type};
use thiserror::Error;

/// Order numbers are issued by the storefront as `ORD` followed by a millisecond timestamp.
const MAX_ORDER_NUMBER_LEN: usize = 50;

//--------------------------------------     OrderNumber      ---------------------------------------------------------
/// The externally visible order identifier, format `ORD<digits>`.
///
/// Construction goes through [`FromStr`], which enforces the canonical format. Both the poll-verify path and the
/// webhook path parse incoming identifiers through this type, so malformed identifiers are rejected before any
/// database work happens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(String);

#[derive(Debug, Clone, Error)]
#[error("Invalid order number: {0}")]
pub struct OrderNumberError(String);

fn order_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^ORD[0-9]+$").expect("order number regex is valid"))
}

impl FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > MAX_ORDER_NUMBER_LEN || !order_number_regex().is_match(s) {
            return Err(OrderNumberError(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------    PaymentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// No confirmation from the gateway yet. The default resolution for every inconclusive outcome.
    Pending,
    /// The gateway has confirmed settlement. Terminal; no reconciliation path may overwrite it.
    Paid,
    /// The payment failed or the checkout expired.
    Cancelled,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid status value: {0}")]
pub struct StatusConversionError(String);

impl FromStr for PaymentStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid payment status: {value}. But this conversion cannot fail. Defaulting to pending");
            PaymentStatus::Pending
        })
    }
}

//--------------------------------------     OrderStatus      ---------------------------------------------------------
/// The order lifecycle status. Moves in lockstep with [`PaymentStatus`] on payment events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Confirmed => write!(f, "confirmed"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to pending");
            OrderStatus::Pending
        })
    }
}

//--------------------------------------  StatusHistoryEntry  ---------------------------------------------------------
/// One entry in an order's append-only audit trail. Entries are only ever appended, and the append rides in the same
/// SQL statement as the guarded status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub timestamp: DateTime<Utc>,
    pub note: String,
}

//--------------------------------------        Order         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    pub order_number: OrderNumber,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    /// The order total in major currency units (Rand). Immutable after creation.
    pub total_amount: f64,
    pub currency: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    /// External checkout reference at the gateway. Without it, verification cannot be performed and always
    /// resolves to pending.
    pub gateway_checkout_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub status_notes: Option<String>,
    pub status_history: Json<Vec<StatusHistoryEntry>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The amount the gateway must report for this order, in minor units.
    pub fn expected_cents(&self) -> Cents {
        Cents::from_rands(self.total_amount)
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }
}

//--------------------------------------       NewOrder       ---------------------------------------------------------
/// A not-yet-persisted order. Orders are created by the storefront checkout flow; the engine only ever mutates them
/// through the guarded reconciliation transitions.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub total_amount: f64,
    pub currency: String,
    pub payment_method: Option<String>,
    pub gateway_checkout_id: Option<String>,
}

impl NewOrder {
    pub fn new(order_number: OrderNumber, total_amount: f64) -> Self {
        Self {
            order_number,
            customer_email: None,
            customer_name: None,
            total_amount,
            currency: ZAR_CURRENCY_CODE.to_string(),
            payment_method: None,
            gateway_checkout_id: None,
        }
    }

    pub fn with_customer(mut self, email: &str, name: &str) -> Self {
        self.customer_email = Some(email.to_string());
        self.customer_name = Some(name.to_string());
        self
    }

    pub fn with_payment_method(mut self, method: &str) -> Self {
        self.payment_method = Some(method.to_string());
        self
    }

    pub fn with_checkout_id(mut self, checkout_id: &str) -> Self {
        self.gateway_checkout_id = Some(checkout_id.to_string());
        self
    }
}

//--------------------------------------    PaymentEvent      ---------------------------------------------------------
/// A row in the reconciliation audit trail. Unlike order status history, this log also records activity that did not
/// change any order (duplicate webhooks, amount mismatches, inconclusive verifications).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PaymentEvent {
    pub id: i64,
    pub order_number: String,
    pub gateway: String,
    pub status: String,
    pub amount: Option<f64>,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPaymentEvent {
    /// Usually an order number, but sweep bookkeeping entries use `SYSTEM`.
    pub order_number: String,
    pub gateway: String,
    pub status: String,
    pub amount: Option<f64>,
    pub details: Option<String>,
}

impl NewPaymentEvent {
    pub fn yoco(order_number: &str, status: &str) -> Self {
        Self {
            order_number: order_number.to_string(),
            gateway: crate::rec_api::YOCO_GATEWAY.to_string(),
            status: status.to_string(),
            amount: None,
            details: None,
        }
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_details<S: Into<String>>(mut self, details: S) -> Self {
        self.details = Some(details.into());
        self
    }
}
