use chrono::{Duration, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, Order, OrderNumber, OrderStatus, PaymentStatus, StatusHistoryEntry},
    traits::ReconciliationError,
};

/// Inserts the order into the database, returning `false` in the second parameter if the order already exists.
pub async fn idempotent_insert(
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<(Order, bool), ReconciliationError> {
    let inserted = match fetch_order_by_order_number(&order.order_number, conn).await? {
        Some(order) => (order, false),
        None => {
            let order = insert_order(order, conn).await?;
            debug!("📝️ Order {} inserted with id {}", order.order_number, order.id);
            (order, true)
        },
    };
    Ok(inserted)
}

async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, ReconciliationError> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number,
                customer_email,
                customer_name,
                total_amount,
                currency,
                payment_method,
                gateway_checkout_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(order.order_number)
    .bind(order.customer_email)
    .bind(order.customer_name)
    .bind(order.total_amount)
    .bind(order.currency)
    .bind(order.payment_method)
    .bind(order.gateway_checkout_id)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order_by_order_number(
    order_number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_number = $1")
        .bind(order_number.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// The guarded `paid` transition.
///
/// One statement sets the payment state, overwrites the latest note, and appends the audit entry, all behind the
/// `payment_status != 'paid'` predicate. Of any number of racing writers, exactly one sees a row change here; the
/// rest get `false`, which callers treat as the idempotent no-op it is. The `'$[#]'` path appends to the JSON array,
/// so the history gains exactly one entry per applied transition.
pub async fn confirm_order_paid(
    order_number: &OrderNumber,
    payment_method: &str,
    gateway_payment_id: Option<&str>,
    note: &str,
    history_note: &str,
    conn: &mut SqliteConnection,
) -> Result<bool, ReconciliationError> {
    let entry = StatusHistoryEntry {
        status: OrderStatus::Confirmed,
        payment_status: PaymentStatus::Paid,
        timestamp: Utc::now(),
        note: history_note.to_string(),
    };
    let entry_json = serde_json::to_string(&entry)
        .map_err(|e| ReconciliationError::DatabaseError(format!("Could not serialize status history entry. {e}")))?;
    let result = sqlx::query(
        r#"
        UPDATE orders SET
            payment_status = 'paid',
            status = 'confirmed',
            payment_method = $1,
            gateway_payment_id = COALESCE($2, gateway_payment_id),
            status_notes = $3,
            status_history = json_insert(COALESCE(status_history, '[]'), '$[#]', json($4)),
            updated_at = CURRENT_TIMESTAMP
        WHERE order_number = $5 AND payment_status != 'paid'
        "#,
    )
    .bind(payment_method)
    .bind(gateway_payment_id)
    .bind(note)
    .bind(entry_json)
    .bind(order_number.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// The guarded `cancelled` transition. Shares the `payment_status != 'paid'` predicate with
/// [`confirm_order_paid`], so a late failure or expiry notification can never overwrite a settled order.
pub async fn cancel_order(
    order_number: &OrderNumber,
    note: &str,
    history_note: &str,
    conn: &mut SqliteConnection,
) -> Result<bool, ReconciliationError> {
    let entry = StatusHistoryEntry {
        status: OrderStatus::Cancelled,
        payment_status: PaymentStatus::Cancelled,
        timestamp: Utc::now(),
        note: history_note.to_string(),
    };
    let entry_json = serde_json::to_string(&entry)
        .map_err(|e| ReconciliationError::DatabaseError(format!("Could not serialize status history entry. {e}")))?;
    let result = sqlx::query(
        r#"
        UPDATE orders SET
            payment_status = 'cancelled',
            status = 'cancelled',
            status_notes = $1,
            status_history = json_insert(COALESCE(status_history, '[]'), '$[#]', json($2)),
            updated_at = CURRENT_TIMESTAMP
        WHERE order_number = $3 AND payment_status != 'paid'
        "#,
    )
    .bind(note)
    .bind(entry_json)
    .bind(order_number.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_gateway_checkout_id(
    order_number: &OrderNumber,
    checkout_id: &str,
    conn: &mut SqliteConnection,
) -> Result<(), ReconciliationError> {
    sqlx::query("UPDATE orders SET gateway_checkout_id = $1, updated_at = CURRENT_TIMESTAMP WHERE order_number = $2")
        .bind(checkout_id)
        .bind(order_number.as_str())
        .execute(conn)
        .await?;
    Ok(())
}

/// Fetches the orders eligible for a reconciliation sweep: pending orders that hold a checkout reference for the
/// given gateway and were created within the window.
pub async fn fetch_pending_gateway_orders(
    gateway: &str,
    window: Duration,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, ReconciliationError> {
    let rows = sqlx::query_as(
        format!(
            "SELECT * FROM orders \
             WHERE payment_status = 'pending' \
               AND gateway_checkout_id IS NOT NULL \
               AND gateway_checkout_id != '' \
               AND payment_method = $1 \
               AND (unixepoch(CURRENT_TIMESTAMP) - unixepoch(created_at)) < {} \
             ORDER BY created_at DESC",
            window.num_seconds()
        )
        .as_str(),
    )
    .bind(gateway)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
