use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::Duration;
use league_payment_engine::ReconciliationApi;
use lps_common::Secret;
use serde_json::{json, Value};

use super::{
    helpers::{post_request, post_request_with_header},
    mocks::{MockGateway, MockReconDb},
};
use crate::{config::ServerOptions, routes::ReconcilePaymentsRoute};

fn options(secret: &str) -> ServerOptions {
    ServerOptions { reconcile_window: Duration::hours(48), reconcile_secret: Secret::new(secret.to_string()) }
}

fn register(cfg: &mut ServiceConfig, db: MockReconDb, gateway: MockGateway, opts: ServerOptions) {
    let api = ReconciliationApi::new(db, gateway);
    cfg.service(ReconcilePaymentsRoute::<MockReconDb, MockGateway>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(opts));
}

#[actix_web::test]
async fn reconcile_requires_the_shared_secret() {
    let _ = env_logger::try_init().ok();
    let configure =
        |cfg: &mut ServiceConfig| register(cfg, MockReconDb::new(), MockGateway::new(), options("test-secret"));
    let (status, _) =
        post_request("/cron/reconcile-payments", &json!({}), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) =
        post_request_with_header("/cron/reconcile-payments", &json!({}), ("x-reconcile-secret", "wrong"), configure)
            .await
            .expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn reconcile_refuses_everything_when_no_secret_is_configured() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| register(cfg, MockReconDb::new(), MockGateway::new(), options(""));
    // An empty configured secret must not match an empty (or any) header.
    let (status, _) =
        post_request_with_header("/cron/reconcile-payments", &json!({}), ("x-reconcile-secret", ""), configure)
            .await
            .expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn reconcile_runs_a_sweep_with_the_right_secret() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut db = MockReconDb::new();
        db.expect_fetch_pending_gateway_orders().returning(|_, _| Ok(Vec::new()));
        let mut gateway = MockGateway::new();
        gateway.expect_is_configured().return_const(true);
        register(cfg, db, gateway, options("test-secret"));
    };
    let (status, body) = post_request_with_header(
        "/cron/reconcile-payments",
        &json!({}),
        ("x-reconcile-secret", "test-secret"),
        configure,
    )
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["checked"], 0);
    assert_eq!(body["confirmed"], 0);
    assert_eq!(body["errors"], 0);
}
