use actix_web::{http::StatusCode, web, web::ServiceConfig};
use league_payment_engine::{db_types::PaymentStatus, traits::ReconciliationError, ReconciliationApi};
use serde_json::{json, Value};

use super::{
    helpers::{get_request, post_raw, post_request},
    mocks::{test_order, MockGateway, MockReconDb},
};
use crate::routes::YocoWebhookRoute;

fn register(cfg: &mut ServiceConfig, db: MockReconDb) {
    let api = ReconciliationApi::new(db, MockGateway::new());
    cfg.service(YocoWebhookRoute::<MockReconDb, MockGateway>::new()).app_data(web::Data::new(api));
}

fn success_event(order_id: &str) -> Value {
    json!({
        "type": "payment.succeeded",
        "id": "evt_1",
        "payload": {
            "paymentId": "p_1",
            "amount": 9950,
            "metadata": { "orderId": order_id }
        }
    })
}

#[actix_web::test]
async fn webhook_acknowledges_unparseable_bodies() {
    let _ = env_logger::try_init().ok();
    // No expectations: a broken body must be acknowledged without touching storage.
    let configure = |cfg: &mut ServiceConfig| register(cfg, MockReconDb::new());
    let (status, body) = post_raw("/yoco/webhook", "this is not json", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["received"], true);
    assert_eq!(body["error"], "Invalid event payload");
}

#[actix_web::test]
async fn webhook_acknowledges_events_without_a_type() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut db = MockReconDb::new();
        db.expect_record_payment_event().returning(|_| Ok(()));
        register(cfg, db);
    };
    let (status, body) = post_request("/yoco/webhook", &json!({ "payload": { "amount": 100 } }), configure)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["received"], true);
    assert!(body.get("error").is_none());
}

#[actix_web::test]
async fn webhook_acknowledges_events_with_bad_order_numbers() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut db = MockReconDb::new();
        // Only the receipt log is written; fetch_order has no expectation and must not be called.
        db.expect_record_payment_event().returning(|_| Ok(()));
        register(cfg, db);
    };
    let (status, body) =
        post_request("/yoco/webhook", &success_event("not-an-order"), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["received"], true);
}

#[actix_web::test]
async fn webhook_confirms_a_success_event() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut db = MockReconDb::new();
        db.expect_record_payment_event().returning(|_| Ok(()));
        db.expect_fetch_order()
            .returning(|_| Ok(Some(test_order("ORD1700000002", 99.5, PaymentStatus::Pending, Some("ch_abc")))));
        db.expect_confirm_order_paid().returning(|_, _, _, _, _| Ok(true));
        register(cfg, db);
    };
    let (status, body) =
        post_request("/yoco/webhook", &success_event("ORD1700000002"), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["received"], true);
    assert!(body.get("error").is_none());
}

#[actix_web::test]
async fn webhook_acknowledges_despite_database_errors() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut db = MockReconDb::new();
        db.expect_record_payment_event().returning(|_| Ok(()));
        db.expect_fetch_order()
            .returning(|_| Err(ReconciliationError::DatabaseError("database is locked".to_string())));
        register(cfg, db);
    };
    let (status, body) =
        post_request("/yoco/webhook", &success_event("ORD1700000002"), configure).await.expect("Request failed");
    // The gateway contract wins over error reporting: still a 200, with a diagnostic field.
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["received"], true);
    assert_eq!(body["error"], "Internal processing error");
}

#[actix_web::test]
async fn webhook_cancels_on_failure_events() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut db = MockReconDb::new();
        db.expect_record_payment_event().returning(|_| Ok(()));
        db.expect_cancel_order().returning(|_, _, _| Ok(true));
        register(cfg, db);
    };
    let event = json!({
        "type": "payment.failed",
        "id": "evt_2",
        "payload": { "metadata": { "orderId": "ORD1700000003" } }
    });
    let (status, body) = post_request("/yoco/webhook", &event, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["received"], true);
}

#[actix_web::test]
async fn webhook_ignores_unhandled_event_types() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut db = MockReconDb::new();
        db.expect_record_payment_event().returning(|_| Ok(()));
        register(cfg, db);
    };
    let event = json!({
        "type": "refund.succeeded",
        "payload": { "metadata": { "orderId": "ORD1700000004" } }
    });
    let (status, body) = post_request("/yoco/webhook", &event, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["received"], true);
}

#[actix_web::test]
async fn webhook_rejects_wrong_methods() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| register(cfg, MockReconDb::new());
    let (status, _) = get_request("/yoco/webhook", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
