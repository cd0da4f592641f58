use chrono::Duration;
use league_payment_engine::{ReconciliationApi, SqliteDatabase};
use log::*;
use tokio::task::JoinHandle;

use crate::integrations::yoco::YocoGateway;

/// Starts the payment reconciliation worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// The worker exists for the restart gap: if the server is down when the gateway redirect and the webhook both
/// arrive, the order stays pending with no inbound trigger left. The sweep asks the gateway directly and settles
/// such orphans through the same guarded transition as every other path.
pub fn start_reconcile_worker(
    db: SqliteDatabase,
    gateway: YocoGateway,
    interval: std::time::Duration,
    window: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let api = ReconciliationApi::new(db, gateway);
        info!("🕰️ Payment reconciliation worker started");
        loop {
            timer.tick().await;
            debug!("🕰️ Running payment reconciliation pass");
            match api.reconcile_pending_orders(window).await {
                Ok(summary) if summary.checked > 0 => {
                    info!("🕰️ Reconciliation pass complete. {summary}");
                },
                Ok(_) => {},
                Err(e) => {
                    error!("🕰️ Error running payment reconciliation pass: {e}");
                },
            }
        }
    })
}
