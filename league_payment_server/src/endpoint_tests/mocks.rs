use chrono::{Duration, TimeZone, Utc};
use league_payment_engine::{
    db_types::{Json, NewOrder, NewPaymentEvent, Order, OrderNumber, OrderStatus, PaymentStatus},
    traits::{CheckoutState, GatewayError, PaymentGateway, ReconciliationDatabase, ReconciliationError},
};
use mockall::mock;

mock! {
    pub ReconDb {}
    impl ReconciliationDatabase for ReconDb {
        async fn fetch_order(&self, order_number: &OrderNumber) -> Result<Option<Order>, ReconciliationError>;
        async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), ReconciliationError>;
        async fn confirm_order_paid<'a>(
            &self,
            order_number: &OrderNumber,
            payment_method: &str,
            gateway_payment_id: Option<&'a str>,
            note: &str,
            history_note: &str,
        ) -> Result<bool, ReconciliationError>;
        async fn cancel_order(
            &self,
            order_number: &OrderNumber,
            note: &str,
            history_note: &str,
        ) -> Result<bool, ReconciliationError>;
        async fn set_gateway_checkout_id(
            &self,
            order_number: &OrderNumber,
            checkout_id: &str,
        ) -> Result<(), ReconciliationError>;
        async fn fetch_pending_gateway_orders(
            &self,
            gateway: &str,
            window: Duration,
        ) -> Result<Vec<Order>, ReconciliationError>;
        async fn record_payment_event(&self, event: NewPaymentEvent) -> Result<(), ReconciliationError>;
    }
}

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        fn is_configured(&self) -> bool;
        async fn fetch_checkout(&self, checkout_id: &str) -> Result<CheckoutState, GatewayError>;
    }
}

/// A stored order for mock responses.
pub fn test_order(order_number: &str, total: f64, payment_status: PaymentStatus, checkout_id: Option<&str>) -> Order {
    let ts = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
    let status = match payment_status {
        PaymentStatus::Paid => OrderStatus::Confirmed,
        PaymentStatus::Cancelled => OrderStatus::Cancelled,
        PaymentStatus::Pending => OrderStatus::Pending,
    };
    Order {
        id: 1,
        order_number: order_number.parse().expect("valid order number"),
        customer_email: Some("parent@example.com".to_string()),
        customer_name: Some("Jo Soap".to_string()),
        total_amount: total,
        currency: "ZAR".to_string(),
        status,
        payment_status,
        payment_method: Some("yoco".to_string()),
        gateway_checkout_id: checkout_id.map(str::to_string),
        gateway_payment_id: None,
        status_notes: None,
        status_history: Json(Vec::new()),
        created_at: ts,
        updated_at: ts,
    }
}
