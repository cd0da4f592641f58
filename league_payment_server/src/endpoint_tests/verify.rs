use actix_web::{http::StatusCode, web, web::ServiceConfig};
use league_payment_engine::{
    db_types::PaymentStatus,
    traits::{CheckoutState, GatewayError},
    ReconciliationApi,
};
use lps_common::Cents;
use serde_json::{json, Value};

use super::{
    helpers::{get_request, post_request},
    mocks::{test_order, MockGateway, MockReconDb},
};
use crate::routes::YocoVerifyRoute;

fn register(cfg: &mut ServiceConfig, db: MockReconDb, gateway: MockGateway) {
    let api = ReconciliationApi::new(db, gateway);
    cfg.service(YocoVerifyRoute::<MockReconDb, MockGateway>::new()).app_data(web::Data::new(api));
}

#[actix_web::test]
async fn verify_rejects_malformed_order_ids() {
    let _ = env_logger::try_init().ok();
    // No expectations: a single database or gateway call would fail the test.
    let configure = |cfg: &mut ServiceConfig| register(cfg, MockReconDb::new(), MockGateway::new());
    for bad in ["", "ord1", "ORD", "ORD12x", "DROP TABLE orders"] {
        let (status, body) =
            post_request("/yoco/verify", &json!({ "orderId": bad }), configure).await.expect("Request failed");
        assert_eq!(status, StatusCode::BAD_REQUEST, "{bad:?} should be rejected");
        assert!(body.contains("Invalid order ID format"));
    }
}

#[actix_web::test]
async fn verify_unknown_order_is_not_found() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut db = MockReconDb::new();
        db.expect_fetch_order().returning(|_| Ok(None));
        db.expect_record_payment_event().returning(|_| Ok(()));
        register(cfg, db, MockGateway::new());
    };
    let (status, body) =
        post_request("/yoco/verify", &json!({ "orderId": "ORD9999999999" }), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Order not found"));
}

#[actix_web::test]
async fn verify_paid_order_short_circuits() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut db = MockReconDb::new();
        db.expect_fetch_order()
            .returning(|_| Ok(Some(test_order("ORD1700000002", 99.5, PaymentStatus::Paid, Some("ch_abc")))));
        // The gateway mock has no expectations: an already-paid order must not trigger a lookup.
        register(cfg, db, MockGateway::new());
    };
    let (status, body) =
        post_request("/yoco/verify", &json!({ "orderId": "ORD1700000002" }), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "paid");
    assert_eq!(body["message"], "Payment already confirmed");
}

#[actix_web::test]
async fn verify_without_checkout_id_is_pending() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut db = MockReconDb::new();
        db.expect_fetch_order()
            .returning(|_| Ok(Some(test_order("ORD1700000001", 150.0, PaymentStatus::Pending, None))));
        db.expect_record_payment_event().returning(|_| Ok(()));
        register(cfg, db, MockGateway::new());
    };
    let (status, body) =
        post_request("/yoco/verify", &json!({ "orderId": "ORD1700000001" }), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["status"], "pending");
    assert_eq!(body["message"], "Payment is being processed. Please allow a few minutes for confirmation.");
}

#[actix_web::test]
async fn verify_confirms_a_completed_checkout() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut db = MockReconDb::new();
        db.expect_fetch_order()
            .returning(|_| Ok(Some(test_order("ORD1700000002", 99.5, PaymentStatus::Pending, Some("ch_abc")))));
        db.expect_confirm_order_paid().returning(|_, _, _, _, _| Ok(true));
        db.expect_record_payment_event().returning(|_| Ok(()));
        let mut gateway = MockGateway::new();
        gateway.expect_is_configured().return_const(true);
        gateway.expect_fetch_checkout().returning(|checkout_id| {
            Ok(CheckoutState {
                checkout_id: checkout_id.to_string(),
                status: "completed".to_string(),
                amount: Some(Cents::from(9_950)),
                payment_id: Some("p_1".to_string()),
            })
        });
        register(cfg, db, gateway);
    };
    let (status, body) =
        post_request("/yoco/verify", &json!({ "orderId": "ORD1700000002" }), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["status"], "paid");
    assert_eq!(body["message"], "Payment verified and confirmed");
}

#[actix_web::test]
async fn verify_resolves_gateway_failure_to_pending() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut db = MockReconDb::new();
        db.expect_fetch_order()
            .returning(|_| Ok(Some(test_order("ORD1700000002", 99.5, PaymentStatus::Pending, Some("ch_abc")))));
        db.expect_record_payment_event().returning(|_| Ok(()));
        let mut gateway = MockGateway::new();
        gateway.expect_is_configured().return_const(true);
        gateway
            .expect_fetch_checkout()
            .returning(|_| Err(GatewayError::Unavailable("connection timed out".to_string())));
        register(cfg, db, gateway);
    };
    let (status, body) =
        post_request("/yoco/verify", &json!({ "orderId": "ORD1700000002" }), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "pending");
}

#[actix_web::test]
async fn verify_rejects_wrong_methods() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| register(cfg, MockReconDb::new(), MockGateway::new());
    let (status, _) = get_request("/yoco/verify", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
