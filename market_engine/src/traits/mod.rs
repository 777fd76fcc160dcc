//! The capability contracts consumed by the engine APIs.
//!
//! Storage backends implement [`PaymentGatewayDatabase`], [`InventoryManagement`], [`OrderManagement`] and
//! [`UserManagement`]. The external payment processor is consumed through [`PaymentProvider`]; the engine never
//! implements it.
mod inventory_management;
mod order_management;
mod payment_gateway_database;
mod payment_provider;
mod user_management;

pub use inventory_management::InventoryManagement;
pub use order_management::OrderManagement;
pub use payment_gateway_database::{PaymentGatewayDatabase, PaymentGatewayError};
pub use payment_provider::{CheckoutSession, NewCheckoutSession, PaymentProvider, ProviderError, SessionStatus};
pub use user_management::{UserAccountError, UserManagement};
