//! Product catalog management.
use std::fmt::Debug;

use log::*;

use mkt_common::Money;

use crate::{
    db_types::{NewProduct, Product, ProductId, ProductUpdate},
    traits::{InventoryManagement, PaymentGatewayError},
};

/// How many products the storefront shows when the caller doesn't say.
pub const DEFAULT_FEATURED_LIMIT: i64 = 6;
/// Upper bound on the featured subset, whatever the caller asks for.
pub const MAX_FEATURED_LIMIT: i64 = 50;

pub struct CatalogApi<B> {
    db: B,
}

impl<B: Debug> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi ({:?})", self.db)
    }
}

impl<B> CatalogApi<B>
where B: InventoryManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn product_by_id(&self, id: &ProductId) -> Result<Option<Product>, PaymentGatewayError> {
        self.db.fetch_product(id).await
    }

    pub async fn all_products(&self) -> Result<Vec<Product>, PaymentGatewayError> {
        self.db.fetch_all_products().await
    }

    /// Visible, in-stock products for the storefront, newest first. `limit` is clamped to
    /// [`MAX_FEATURED_LIMIT`] and defaults to [`DEFAULT_FEATURED_LIMIT`].
    pub async fn featured_products(&self, limit: Option<i64>) -> Result<Vec<Product>, PaymentGatewayError> {
        let limit = limit.unwrap_or(DEFAULT_FEATURED_LIMIT).clamp(1, MAX_FEATURED_LIMIT);
        self.db.fetch_featured_products(limit).await
    }

    pub async fn create_product(&self, product: NewProduct) -> Result<Product, PaymentGatewayError> {
        validate_price_and_quantity(Some(product.price), Some(product.quantity))?;
        let product = self.db.insert_product(product).await?;
        info!("🗂️ Product {} ({}) added to the catalog", product.id, product.name);
        Ok(product)
    }

    /// Applies a partial update. Existing orders are unaffected; they carry a snapshot of the product as it was
    /// when they were created.
    pub async fn update_product(&self, id: &ProductId, update: ProductUpdate) -> Result<Product, PaymentGatewayError> {
        validate_price_and_quantity(update.price, update.quantity)?;
        self.db.update_product(id, update).await?.ok_or_else(|| PaymentGatewayError::ProductNotFound(id.clone()))
    }

    /// Removes the product from the catalog. Orders referencing it survive on their snapshots.
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), PaymentGatewayError> {
        if self.db.delete_product(id).await? {
            info!("🗂️ Product {id} removed from the catalog");
            Ok(())
        } else {
            Err(PaymentGatewayError::ProductNotFound(id.clone()))
        }
    }
}

/// The schema enforces these too, but a constraint violation reads as an internal error. Catching bad values
/// here turns them into a proper validation failure instead.
fn validate_price_and_quantity(price: Option<Money>, quantity: Option<i64>) -> Result<(), PaymentGatewayError> {
    if let Some(price) = price {
        if !price.is_positive() {
            return Err(PaymentGatewayError::InvalidProductData(format!("the price must be positive, not {price}")));
        }
    }
    if let Some(quantity) = quantity {
        if quantity < 0 {
            return Err(PaymentGatewayError::InvalidProductData(format!("the quantity cannot be negative ({quantity})")));
        }
    }
    Ok(())
}
