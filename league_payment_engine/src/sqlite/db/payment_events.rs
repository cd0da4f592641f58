use sqlx::SqliteConnection;

use crate::db_types::{NewPaymentEvent, PaymentEvent};

pub async fn insert_event(event: NewPaymentEvent, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO payment_events (order_number, gateway, status, amount, details)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(event.order_number)
    .bind(event.gateway)
    .bind(event.status)
    .bind(event.amount)
    .bind(event.details)
    .execute(conn)
    .await?;
    Ok(())
}

/// Returns the audit trail for one order, oldest first.
pub async fn fetch_events_for_order(
    order_number: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymentEvent>, sqlx::Error> {
    let events = sqlx::query_as("SELECT * FROM payment_events WHERE order_number = $1 ORDER BY id ASC")
        .bind(order_number)
        .fetch_all(conn)
        .await?;
    Ok(events)
}

/// Returns the most recent entries across all orders, newest first. Used by the admin console's log viewer.
pub async fn fetch_recent_events(limit: i64, conn: &mut SqliteConnection) -> Result<Vec<PaymentEvent>, sqlx::Error> {
    let events = sqlx::query_as("SELECT * FROM payment_events ORDER BY id DESC LIMIT $1")
        .bind(limit)
        .fetch_all(conn)
        .await?;
    Ok(events)
}
