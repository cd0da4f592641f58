//! A thin client for the Yoco online payments API.
//!
//! The server uses two endpoints of the [checkout API](https://developer.yoco.com/online/checkout): creating a
//! checkout session for an order, and looking up the status of an existing checkout during payment reconciliation.
//! The client deliberately distinguishes transport failures from well-formed non-2xx responses, so that callers can
//! apply the "absence of confirmation means pending" rule correctly.
mod api;
mod config;
mod data_objects;
mod error;

pub use api::YocoApi;
pub use config::{YocoConfig, YocoCredentials};
pub use data_objects::{checkout_status, Checkout, CheckoutMetadata, NewCheckoutRequest};
pub use error::YocoApiError;
