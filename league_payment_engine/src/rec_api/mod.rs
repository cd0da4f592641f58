//! The engine's public reconciliation API.
//!
//! [`ReconciliationApi`] is the orchestration layer in front of a [`crate::traits::ReconciliationDatabase`] and a
//! [`crate::traits::PaymentGateway`]. Every payment confirmation in the system, whether it arrives as a webhook
//! push, a client "verify now" poll, or the periodic sweep, goes through this API and ends in the same guarded
//! conditional update.
pub mod reconcile_objects;
mod reconciliation_api;

pub use reconciliation_api::ReconciliationApi;

/// The payment-method tag written to orders settled through Yoco.
pub const YOCO_GATEWAY: &str = "yoco";
