//! Contracts between the reconciliation flow and the outside world.
//!
//! Two seams exist:
//! * [`ReconciliationDatabase`] is the order-store contract a storage backend must provide. The only mutation it
//!   exposes for payment state is the guarded conditional update, so backends cannot accidentally offer a
//!   read-then-write path.
//! * [`PaymentGateway`] is the checkout-status lookup contract. Concrete gateway clients are adapted behind it so
//!   that the engine never depends on a particular HTTP stack.
mod payment_gateway;
mod reconciliation_database;

pub use payment_gateway::{CheckoutState, GatewayError, PaymentGateway};
pub use reconciliation_database::{ReconciliationDatabase, ReconciliationError};
