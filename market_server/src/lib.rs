//! # Marketplace server
//! This module hosts the HTTP boundary of the marketplace order-fulfilment backend. It is responsible for:
//! * authenticating callers and enforcing the role hierarchy on every privileged route,
//! * translating HTTP requests into engine API calls (catalog, checkout, reconciliation, order lifecycle, users),
//! * talking to the external payment processor over its REST API.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! All domain logic lives in `market_engine`; handlers here should stay thin.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod middleware;
pub mod processor;
pub mod routes;
pub mod server;
