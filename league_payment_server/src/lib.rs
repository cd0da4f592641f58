//! # League payment server
//! This crate hosts the HTTP surface of the payment reconciliation service. It is responsible for:
//! * Receiving payment webhook notifications from Yoco and acknowledging every one of them.
//! * Serving the "verify now" poll endpoint used by the checkout success page.
//! * Creating gateway checkout sessions for pending orders.
//! * Running the periodic reconciliation sweep that catches payments orphaned by a server restart.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/yoco/verify`: The poll-path verification endpoint.
//! * `/api/yoco/webhook`: The webhook endpoint for Yoco payment events.
//! * `/api/yoco/create-checkout`: Creates a checkout session for an order.
//! * `/api/cron/reconcile-payments`: Triggers a reconciliation sweep (shared-secret guarded).
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod reconcile_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
