use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatus, ProductId},
    traits::InventoryManagement,
};

/// The fulfilment contract a storage backend must provide to the payment reconciler.
///
/// The two writes that fulfil a payment -- the order insert and the inventory decrement -- are a single logical
/// unit. Implementations MUST apply them in one atomic transaction, and MUST enforce uniqueness of
/// `transaction_id` at the store level so that duplicate webhook deliveries racing each other converge on a single
/// order record.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: InventoryManagement {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Materialises the order and debits the product's stock in one atomic transaction.
    ///
    /// This call is idempotent on `order.transaction_id`. Returns the order and `true` if it was inserted by this
    /// call, or the pre-existing order and `false` if the transaction id had already been fulfilled (including the
    /// case where a concurrent call won the insert race).
    ///
    /// If the stock decrement would drive the quantity negative, the whole transaction is rolled back and
    /// [`PaymentGatewayError::InsufficientStock`] is returned; no order record is left behind.
    async fn fulfil_payment(&self, order: NewOrder) -> Result<(Order, bool), PaymentGatewayError>;

    /// Fetches the order keyed by the processor's payment identifier, if one exists.
    async fn fetch_order_by_transaction_id(&self, transaction_id: &str)
        -> Result<Option<Order>, PaymentGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Invalid product data: {0}")]
    InvalidProductData(String),
    #[error("The requested product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("Insufficient stock to fulfil the sale of product {0}")]
    InsufficientStock(ProductId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("An order already exists for transaction {0}")]
    DuplicateTransaction(String),
    #[error("Orders cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Order {0} no longer accepts tracking events")]
    TrackingClosed(OrderId),
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}
