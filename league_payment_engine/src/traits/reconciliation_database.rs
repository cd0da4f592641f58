use chrono::Duration;
use thiserror::Error;

use crate::db_types::{NewOrder, NewPaymentEvent, Order, OrderNumber};

#[derive(Debug, Error)]
pub enum ReconciliationError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderNumber),
}

impl From<sqlx::Error> for ReconciliationError {
    fn from(e: sqlx::Error) -> Self {
        ReconciliationError::DatabaseError(e.to_string())
    }
}

/// The order-store contract for reconciliation backends.
///
/// The two transition methods are the *only* way payment state changes. Both carry the `payment_status != 'paid'`
/// guard inside the update statement itself, which is what makes concurrent webhook delivery and poll verification
/// safe without any in-process locking: of two racing writers, only one can satisfy the predicate at commit time.
/// The loser sees "zero rows changed", reported here as `Ok(false)`, and must treat it as a normal idempotent no-op.
#[allow(async_fn_in_trait)]
pub trait ReconciliationDatabase {
    /// Returns the order with the given order number, if it exists.
    async fn fetch_order(&self, order_number: &OrderNumber) -> Result<Option<Order>, ReconciliationError>;

    /// Stores a new order. Idempotent: if an order with the same order number already exists, it is returned
    /// unchanged and the second element is `false`.
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), ReconciliationError>;

    /// Transitions the order to `paid`/`confirmed` and appends an audit entry, guarded by
    /// `payment_status != 'paid'`.
    ///
    /// Returns `true` if the transition was applied, and `false` if the guard rejected it (the order was already
    /// paid by a concurrent writer, or does not exist).
    async fn confirm_order_paid(
        &self,
        order_number: &OrderNumber,
        payment_method: &str,
        gateway_payment_id: Option<&str>,
        note: &str,
        history_note: &str,
    ) -> Result<bool, ReconciliationError>;

    /// Transitions the order to `cancelled` and appends an audit entry, guarded by `payment_status != 'paid'`.
    ///
    /// A `paid` order is never overwritten: the guard makes a late failure or expiry notification for a settled
    /// order a no-op, reported as `Ok(false)`.
    async fn cancel_order(
        &self,
        order_number: &OrderNumber,
        note: &str,
        history_note: &str,
    ) -> Result<bool, ReconciliationError>;

    /// Records the gateway checkout reference on an order after a checkout session has been created for it.
    async fn set_gateway_checkout_id(
        &self,
        order_number: &OrderNumber,
        checkout_id: &str,
    ) -> Result<(), ReconciliationError>;

    /// Returns the orders eligible for the periodic reconciliation sweep: still pending, settled through the given
    /// gateway, holding a checkout reference, and created within the given window. Newest first.
    async fn fetch_pending_gateway_orders(
        &self,
        gateway: &str,
        window: Duration,
    ) -> Result<Vec<Order>, ReconciliationError>;

    /// Appends an entry to the reconciliation audit trail.
    async fn record_payment_event(&self, event: NewPaymentEvent) -> Result<(), ReconciliationError>;
}
