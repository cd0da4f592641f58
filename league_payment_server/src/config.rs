use std::env;

use chrono::Duration;
use log::*;
use lps_common::Secret;
use yoco_tools::YocoConfig;

const DEFAULT_LPS_HOST: &str = "127.0.0.1";
const DEFAULT_LPS_PORT: u16 = 8460;
/// How often the background worker re-checks pending gateway orders.
const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 300;
/// How far back the sweep looks for orphaned pending orders.
const DEFAULT_RECONCILE_WINDOW_HOURS: i64 = 48;

/// The settings-store key holding the Yoco credentials when they are not supplied via the environment.
pub const YOCO_SETTINGS_KEY: &str = "yoco_config";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Gateway credentials from the environment. When absent, the server falls back to the settings store at
    /// startup; when that is empty too, the server runs but every verification resolves to pending.
    pub yoco: YocoConfig,
    pub reconcile: ReconcileConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_LPS_HOST.to_string(),
            port: DEFAULT_LPS_PORT,
            database_url: String::default(),
            yoco: YocoConfig::default(),
            reconcile: ReconcileConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("LPS_HOST").ok().unwrap_or_else(|| DEFAULT_LPS_HOST.into());
        let port = env::var("LPS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for LPS_PORT. {e} Using the default, {DEFAULT_LPS_PORT}, instead."
                    );
                    DEFAULT_LPS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_LPS_PORT);
        let database_url = env::var("LPS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ LPS_DATABASE_URL is not set. Please set it to the URL for the orders database.");
            String::default()
        });
        let yoco = YocoConfig::new_from_env_or_default();
        let reconcile = ReconcileConfig::from_env_or_default();
        Self { host, port, database_url, yoco, reconcile }
    }
}

//----------------------------------------   ReconcileConfig  ----------------------------------------------------
#[derive(Clone, Debug)]
pub struct ReconcileConfig {
    /// When false, the periodic sweep is disabled and only webhooks and polls confirm payments.
    pub run_worker: bool,
    pub interval: std::time::Duration,
    pub window: Duration,
    /// Shared secret for the manual reconciliation trigger. When empty, the trigger endpoint always refuses.
    pub secret: Secret<String>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            run_worker: true,
            interval: std::time::Duration::from_secs(DEFAULT_RECONCILE_INTERVAL_SECS),
            window: Duration::hours(DEFAULT_RECONCILE_WINDOW_HOURS),
            secret: Secret::default(),
        }
    }
}

impl ReconcileConfig {
    pub fn from_env_or_default() -> Self {
        let run_worker = env::var("LPS_RECONCILE_WORKER").map(|s| &s != "0" && &s != "false").unwrap_or(true);
        let interval = env::var("LPS_RECONCILE_INTERVAL_SECS")
            .map_err(|_| {
                info!(
                    "🪛️ LPS_RECONCILE_INTERVAL_SECS is not set. Using the default value of \
                     {DEFAULT_RECONCILE_INTERVAL_SECS} s."
                )
            })
            .and_then(|s| {
                s.parse::<u64>()
                    .map(std::time::Duration::from_secs)
                    .map_err(|e| warn!("🪛️ Invalid configuration value for LPS_RECONCILE_INTERVAL_SECS. {e}"))
            })
            .ok()
            .unwrap_or(std::time::Duration::from_secs(DEFAULT_RECONCILE_INTERVAL_SECS));
        let window = env::var("LPS_RECONCILE_WINDOW_HOURS")
            .map_err(|_| {
                info!(
                    "🪛️ LPS_RECONCILE_WINDOW_HOURS is not set. Using the default value of \
                     {DEFAULT_RECONCILE_WINDOW_HOURS} hrs."
                )
            })
            .and_then(|s| {
                s.parse::<i64>()
                    .map(Duration::hours)
                    .map_err(|e| warn!("🪛️ Invalid configuration value for LPS_RECONCILE_WINDOW_HOURS. {e}"))
            })
            .ok()
            .unwrap_or(Duration::hours(DEFAULT_RECONCILE_WINDOW_HOURS));
        let secret = Secret::new(env::var("LPS_RECONCILE_SECRET").unwrap_or_else(|_| {
            warn!("🪛️ LPS_RECONCILE_SECRET is not set. The manual reconciliation endpoint will refuse all requests.");
            String::default()
        }));
        Self { run_worker, interval, window, secret }
    }
}

//----------------------------------------   ServerOptions   ----------------------------------------------------
/// The subset of the server configuration that request handlers need. Kept small, and free of credentials other
/// than the reconcile trigger secret.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub reconcile_window: Duration,
    pub reconcile_secret: Secret<String>,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { reconcile_window: config.reconcile.window, reconcile_secret: config.reconcile.secret.clone() }
    }
}
