//! Market Engine
//!
//! The market engine is the core of the marketplace order-fulfilment backend. It converts confirmed external
//! payments into durable domain orders, keeps the inventory ledger consistent, and governs the order status
//! lifecycle. It is transport- and provider-agnostic.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You should never need to
//!    access the database directly. Instead, use the public APIs provided by the engine. The exception is the data
//!    types used in the database. These are defined in the `db_types` module and are public.
//! 2. The capability traits ([`mod@traits`]). Storage backends implement these in order to act as a backend for the
//!    market server. The payment processor is consumed through the [`traits::PaymentProvider`] trait and is never
//!    implemented here.
//! 3. The engine public API ([`mod@api`]). Payment reconciliation, the order lifecycle state machine, catalog
//!    management and user account management.
pub mod api;
pub mod db_types;
pub mod order_objects;
pub mod test_utils;
pub mod traits;

mod sqlite;

pub use api::{
    CatalogApi,
    OrderLifecycleApi,
    ReconciliationApi,
    ReconciliationError,
    UserApi,
};
pub use sqlite::SqliteDatabase;
pub use traits::{
    InventoryManagement,
    OrderManagement,
    PaymentGatewayDatabase,
    PaymentGatewayError,
    PaymentProvider,
    UserAccountError,
    UserManagement,
};
