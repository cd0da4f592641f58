//! League Payment Engine
//!
//! The engine holds the reconciliation core for the league storefront: confirming, from the payment gateway as the
//! authoritative source, that a locally pending order has actually been paid, and applying that confirmation with
//! exactly-once semantics.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You should never need to
//!    access the database directly. Instead, use the public API provided by the engine. The exception is the data
//!    types used in the database. These are defined in the `db_types` module and are public.
//! 2. The storage and gateway contracts ([`mod@traits`]). Backends implement [`traits::ReconciliationDatabase`];
//!    payment-gateway clients are adapted behind [`traits::PaymentGateway`]. Both seams exist so that the
//!    reconciliation flow can be exercised against test doubles.
//! 3. The reconciliation API ([`mod@rec_api`]). [`ReconciliationApi`] orchestrates the poll-verify path, the webhook
//!    path and the periodic pending-order sweep. All three paths funnel `paid` transitions through a single guarded
//!    conditional update, which is the sole concurrency-correctness mechanism in the system.
pub mod db_types;
pub mod rec_api;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use rec_api::{
    reconcile_objects::{EventOutcome, GatewayEvent, GatewayEventKind, ReconcileSummary, VerifyOutcome},
    ReconciliationApi,
    YOCO_GATEWAY,
};
pub use traits::{CheckoutState, GatewayError, PaymentGateway, ReconciliationDatabase, ReconciliationError};
