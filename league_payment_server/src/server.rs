use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use league_payment_engine::{ReconciliationApi, SqliteDatabase};
use log::*;
use yoco_tools::{YocoApi, YocoConfig, YocoCredentials};

use crate::{
    config::{ServerConfig, ServerOptions, YOCO_SETTINGS_KEY},
    errors::ServerError,
    integrations::yoco::YocoGateway,
    reconcile_worker::start_reconcile_worker,
    routes::{health, ReconcilePaymentsRoute, YocoCreateCheckoutRoute, YocoVerifyRoute, YocoWebhookRoute},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let yoco_config = resolve_yoco_config(&config, &db).await;
    if !yoco_config.is_configured() {
        warn!(
            "🚨️ No Yoco credentials are configured. The server will run, but payments cannot be verified and every \
             verification will resolve to pending."
        );
    }
    let yoco = YocoApi::new(yoco_config).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.reconcile.run_worker {
        start_reconcile_worker(
            db.clone(),
            YocoGateway(yoco.clone()),
            config.reconcile.interval,
            config.reconcile.window,
        );
    } else {
        info!("🕰️ Payment reconciliation worker is disabled");
    }
    let srv = create_server_instance(config, db, yoco)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase, yoco: YocoApi) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let options = ServerOptions::from_config(&config);
    let srv = HttpServer::new(move || {
        let api = ReconciliationApi::new(db.clone(), YocoGateway(yoco.clone()));
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("lps::access_log"))
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(yoco.clone()))
            .app_data(web::Data::new(options.clone()));
        let api_scope = web::scope("/api")
            .service(YocoVerifyRoute::<SqliteDatabase, YocoGateway>::new())
            .service(YocoWebhookRoute::<SqliteDatabase, YocoGateway>::new())
            .service(YocoCreateCheckoutRoute::<SqliteDatabase, YocoGateway>::new())
            .service(ReconcilePaymentsRoute::<SqliteDatabase, YocoGateway>::new());
        app.service(health).service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}

/// Resolves the gateway credentials: the environment wins, then the settings store, then "not configured".
///
/// Credentials are resolved once at startup. Changing them in the settings store requires a restart to take effect.
async fn resolve_yoco_config(config: &ServerConfig, db: &SqliteDatabase) -> YocoConfig {
    if config.yoco.is_configured() {
        return config.yoco.clone();
    }
    match db.fetch_json_setting::<YocoCredentials>(YOCO_SETTINGS_KEY).await {
        Ok(Some(creds)) => {
            info!("🪛️ Loaded Yoco credentials from the settings store.");
            let mut resolved = YocoConfig::from_credentials(creds);
            resolved.api_url = config.yoco.api_url.clone();
            resolved
        },
        Ok(None) => {
            info!("🪛️ No Yoco credentials in the environment or the settings store.");
            config.yoco.clone()
        },
        Err(e) => {
            warn!("🪛️ Could not read Yoco credentials from the settings store. {e}");
            config.yoco.clone()
        },
    }
}
