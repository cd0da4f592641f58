//! Shared helpers for the reconciliation integration tests: a throwaway file-backed SQLite database per test, and a
//! scripted in-process payment gateway.
#![allow(dead_code)]
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use league_payment_engine::{
    db_types::{NewOrder, Order},
    traits::{CheckoutState, GatewayError, PaymentGateway},
    ReconciliationDatabase,
    SqliteDatabase,
};
use log::*;
use lps_common::Cents;
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
}

pub fn random_db_path() -> String {
    format!("sqlite://{}/league_test_store_{}.db", std::env::temp_dir().display(), rand::random::<u64>())
}

pub async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("Error dropping database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("Created Sqlite database {url}");
}

/// A fresh, migrated database at a random path.
pub async fn new_test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    db
}

pub async fn seed_order(db: &SqliteDatabase, order_number: &str, total: f64, checkout_id: Option<&str>) -> Order {
    let mut order = NewOrder::new(order_number.parse().expect("valid order number"), total)
        .with_customer("parent@example.com", "Jo Soap")
        .with_payment_method("yoco");
    if let Some(checkout_id) = checkout_id {
        order = order.with_checkout_id(checkout_id);
    }
    let (order, inserted) = db.insert_order(order).await.expect("Error inserting order");
    assert!(inserted, "order {order_number} already existed");
    order
}

//--------------------------------------     TestGateway      ---------------------------------------------------------
/// What the scripted gateway answers for a checkout lookup.
#[derive(Clone)]
pub enum GatewayScript {
    Completed { amount: Option<Cents>, payment_id: Option<String> },
    Status(String),
    Unavailable,
}

/// An in-process [`PaymentGateway`] with canned answers and a call counter, so tests can assert that certain paths
/// never reach the gateway at all.
#[derive(Clone)]
pub struct TestGateway {
    configured: bool,
    default_script: GatewayScript,
    routes: Arc<HashMap<String, GatewayScript>>,
    calls: Arc<AtomicUsize>,
}

impl TestGateway {
    fn with_script(script: GatewayScript) -> Self {
        Self { configured: true, default_script: script, routes: Arc::new(HashMap::new()), calls: Arc::default() }
    }

    pub fn completed(amount: i64) -> Self {
        Self::with_script(GatewayScript::Completed {
            amount: Some(Cents::from(amount)),
            payment_id: Some("p_test_1".to_string()),
        })
    }

    pub fn completed_without_amount() -> Self {
        Self::with_script(GatewayScript::Completed { amount: None, payment_id: None })
    }

    pub fn status(status: &str) -> Self {
        Self::with_script(GatewayScript::Status(status.to_string()))
    }

    pub fn unavailable() -> Self {
        Self::with_script(GatewayScript::Unavailable)
    }

    pub fn unconfigured() -> Self {
        let mut gateway = Self::status("created");
        gateway.configured = false;
        gateway
    }

    /// Per-checkout-id answers, for sweep tests that cover several orders in one pass.
    pub fn routed(routes: Vec<(&str, GatewayScript)>) -> Self {
        let routes = routes.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        Self {
            configured: true,
            default_script: GatewayScript::Status("created".to_string()),
            routes: Arc::new(routes),
            calls: Arc::default(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PaymentGateway for TestGateway {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn fetch_checkout(&self, checkout_id: &str) -> Result<CheckoutState, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self.routes.get(checkout_id).unwrap_or(&self.default_script);
        match script {
            GatewayScript::Completed { amount, payment_id } => Ok(CheckoutState {
                checkout_id: checkout_id.to_string(),
                status: "completed".to_string(),
                amount: *amount,
                payment_id: payment_id.clone(),
            }),
            GatewayScript::Status(status) => Ok(CheckoutState {
                checkout_id: checkout_id.to_string(),
                status: status.clone(),
                amount: None,
                payment_id: None,
            }),
            GatewayScript::Unavailable => Err(GatewayError::Unavailable("connection refused".to_string())),
        }
    }
}
