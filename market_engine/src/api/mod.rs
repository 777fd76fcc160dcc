//! # Marketplace engine public API
//!
//! The `api` module exposes the programmatic API for the marketplace engine.
//! The API is modular, so that clients of the API can pick and choose the functionality they want.
//! Or different parts (e.g. the catalog and the order flow) could be configured on different machines.
//!
//! * [`reconciliation_api`] is the primary API. It opens checkout sessions with the payment processor and converts
//!   completed payments into orders, exactly once per payment.
//! * [`lifecycle_api`] governs the order status state machine and the append-only tracking history.
//! * [`catalog_api`] manages the product catalog and its stock levels.
//! * [`users_api`] manages user accounts, which are created lazily on first login.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database backend that
//! implements the specific backend traits required by the API.
//!
//! For example, to create an API instance to query the catalog:
//!
//! ```rust,ignore
//! use market_engine::{CatalogApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements InventoryManagement
//! let api = CatalogApi::new(db);
//! let products = api.featured_products(None).await?;
//! ```
pub mod catalog_api;
pub mod errors;
pub mod lifecycle_api;
pub mod reconciliation_api;
pub mod users_api;

pub use catalog_api::CatalogApi;
pub use errors::ReconciliationError;
pub use lifecycle_api::OrderLifecycleApi;
pub use reconciliation_api::ReconciliationApi;
pub use users_api::UserApi;
