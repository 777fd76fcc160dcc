use crate::{
    db_types::{NewProduct, Product, ProductId, ProductUpdate},
    traits::PaymentGatewayError,
};

/// The inventory-ledger contract. Owns product records and the atomic decrement-on-sale primitive.
#[allow(async_fn_in_trait)]
pub trait InventoryManagement {
    /// Creates a new product with a server-assigned id and returns the stored record.
    async fn insert_product(&self, product: NewProduct) -> Result<Product, PaymentGatewayError>;

    async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, PaymentGatewayError>;

    /// All products, newest first.
    async fn fetch_all_products(&self) -> Result<Vec<Product>, PaymentGatewayError>;

    /// A bounded subset of visible products for storefront display.
    async fn fetch_featured_products(&self, limit: i64) -> Result<Vec<Product>, PaymentGatewayError>;

    /// Applies a partial field update. Returns the updated product, or `None` if the product does not exist.
    async fn update_product(&self, id: &ProductId, update: ProductUpdate)
        -> Result<Option<Product>, PaymentGatewayError>;

    /// Returns `true` if a product was deleted.
    async fn delete_product(&self, id: &ProductId) -> Result<bool, PaymentGatewayError>;

    /// Atomically subtracts `amount` units of stock, failing with [`PaymentGatewayError::InsufficientStock`]
    /// rather than letting the quantity go negative. Returns the remaining quantity.
    ///
    /// Concurrent decrements for different sales of the same product must be applied as an atomic
    /// subtract-with-floor at the store, never as read-modify-write in application code.
    async fn decrement_stock(&self, id: &ProductId, amount: i64) -> Result<i64, PaymentGatewayError>;
}
