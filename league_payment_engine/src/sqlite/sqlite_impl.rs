//! `SqliteDatabase` is the concrete SQLite implementation of the engine's storage contract.
use std::fmt::Debug;

use chrono::Duration;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;

use super::db::{new_pool, orders, payment_events, settings};
use crate::{
    db_types::{NewOrder, NewPaymentEvent, Order, OrderNumber, PaymentEvent},
    traits::{ReconciliationDatabase, ReconciliationError},
};

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./src/sqlite/migrations");

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, ReconciliationError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<(), ReconciliationError> {
        MIGRATOR.run(&self.pool).await.map_err(|e| ReconciliationError::DatabaseError(e.to_string()))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Reads a JSON settings value and deserializes it, or returns `None` when the key is absent.
    pub async fn fetch_json_setting<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ReconciliationError> {
        let mut conn = self.pool.acquire().await?;
        let raw = settings::fetch_setting(key, &mut conn).await?;
        raw.map(|v| serde_json::from_str::<T>(&v))
            .transpose()
            .map_err(|e| ReconciliationError::DatabaseError(format!("Could not parse setting '{key}'. {e}")))
    }

    pub async fn upsert_json_setting<T: serde::Serialize>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), ReconciliationError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| ReconciliationError::DatabaseError(format!("Could not serialize setting '{key}'. {e}")))?;
        let mut conn = self.pool.acquire().await?;
        settings::upsert_setting(key, &raw, &mut conn).await?;
        Ok(())
    }

    /// The audit trail for one order, oldest first.
    pub async fn fetch_payment_events(&self, order_number: &str) -> Result<Vec<PaymentEvent>, ReconciliationError> {
        let mut conn = self.pool.acquire().await?;
        let events = payment_events::fetch_events_for_order(order_number, &mut conn).await?;
        Ok(events)
    }

    pub async fn fetch_recent_payment_events(&self, limit: i64) -> Result<Vec<PaymentEvent>, ReconciliationError> {
        let mut conn = self.pool.acquire().await?;
        let events = payment_events::fetch_recent_events(limit, &mut conn).await?;
        Ok(events)
    }
}

impl ReconciliationDatabase for SqliteDatabase {
    async fn fetch_order(&self, order_number: &OrderNumber) -> Result<Option<Order>, ReconciliationError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_number(order_number, &mut conn).await?;
        Ok(order)
    }

    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), ReconciliationError> {
        let mut conn = self.pool.acquire().await?;
        let r = orders::idempotent_insert(order, &mut conn).await;
        drop(conn);
        let fresh = new_pool(&self.url, 1).await?;
        let cnt: (i64,) = sqlx::query_as("SELECT count(*) FROM orders").fetch_one(&fresh).await.unwrap();
        eprintln!("DBG after insert_order: fresh-pool count={} url={}", cnt.0, self.url);
        Ok(r?)
    }

    async fn confirm_order_paid(
        &self,
        order_number: &OrderNumber,
        payment_method: &str,
        gateway_payment_id: Option<&str>,
        note: &str,
        history_note: &str,
    ) -> Result<bool, ReconciliationError> {
        let mut conn = self.pool.acquire().await?;
        orders::confirm_order_paid(order_number, payment_method, gateway_payment_id, note, history_note, &mut conn)
            .await
    }

    async fn cancel_order(
        &self,
        order_number: &OrderNumber,
        note: &str,
        history_note: &str,
    ) -> Result<bool, ReconciliationError> {
        let mut conn = self.pool.acquire().await?;
        orders::cancel_order(order_number, note, history_note, &mut conn).await
    }

    async fn set_gateway_checkout_id(
        &self,
        order_number: &OrderNumber,
        checkout_id: &str,
    ) -> Result<(), ReconciliationError> {
        let mut conn = self.pool.acquire().await?;
        orders::set_gateway_checkout_id(order_number, checkout_id, &mut conn).await
    }

    async fn fetch_pending_gateway_orders(
        &self,
        gateway: &str,
        window: Duration,
    ) -> Result<Vec<Order>, ReconciliationError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_pending_gateway_orders(gateway, window, &mut conn).await
    }

    async fn record_payment_event(&self, event: NewPaymentEvent) -> Result<(), ReconciliationError> {
        let mut conn = self.pool.acquire().await?;
        payment_events::insert_event(event, &mut conn).await?;
        Ok(())
    }
}
