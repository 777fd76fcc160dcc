use log::{debug, trace};
use sqlx::{sqlite::SqliteRow, FromRow, QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewProduct, Product, ProductId, ProductUpdate},
    traits::PaymentGatewayError,
};

/// Inserts a new product with a freshly assigned id and returns the stored row.
pub async fn insert_product(
    product: NewProduct,
    conn: &mut SqliteConnection,
) -> Result<Product, PaymentGatewayError> {
    let id = ProductId::random();
    let product = sqlx::query_as(
        r#"
            INSERT INTO products (
                id,
                name,
                category,
                description,
                price,
                quantity,
                seller_name,
                seller_email,
                visible,
                image
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(product.name)
    .bind(product.category)
    .bind(product.description)
    .bind(product.price)
    .bind(product.quantity)
    .bind(product.seller_name)
    .bind(product.seller_email)
    .bind(product.visible)
    .bind(product.image)
    .fetch_one(conn)
    .await?;
    Ok(product)
}

pub async fn fetch_product_by_id(
    id: &ProductId,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await?;
    Ok(product)
}

/// Returns all products, newest first.
pub async fn fetch_all_products(conn: &mut SqliteConnection) -> Result<Vec<Product>, sqlx::Error> {
    let products = sqlx::query_as("SELECT * FROM products ORDER BY created_at DESC").fetch_all(conn).await?;
    Ok(products)
}

/// Returns up to `limit` visible, in-stock products for the storefront, newest first.
pub async fn fetch_featured_products(
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Product>, sqlx::Error> {
    let products = sqlx::query_as(
        "SELECT * FROM products WHERE visible = 1 AND quantity > 0 ORDER BY created_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(products)
}

pub(crate) async fn update_product(
    id: &ProductId,
    update: ProductUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, PaymentGatewayError> {
    if update.is_empty() {
        debug!("📝️ No fields to update for product {id}. Returning the current row.");
        return Ok(fetch_product_by_id(id, conn).await?);
    }
    let mut builder = QueryBuilder::new("UPDATE products SET updated_at = CURRENT_TIMESTAMP, ");
    let mut set_clause = builder.separated(", ");
    if let Some(name) = update.name {
        set_clause.push("name = ");
        set_clause.push_bind_unseparated(name);
    }
    if let Some(category) = update.category {
        set_clause.push("category = ");
        set_clause.push_bind_unseparated(category);
    }
    if let Some(description) = update.description {
        set_clause.push("description = ");
        set_clause.push_bind_unseparated(description);
    }
    if let Some(price) = update.price {
        set_clause.push("price = ");
        set_clause.push_bind_unseparated(price);
    }
    if let Some(quantity) = update.quantity {
        set_clause.push("quantity = ");
        set_clause.push_bind_unseparated(quantity);
    }
    if let Some(visible) = update.visible {
        set_clause.push("visible = ");
        set_clause.push_bind_unseparated(visible);
    }
    if let Some(image) = update.image {
        set_clause.push("image = ");
        set_clause.push_bind_unseparated(image);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id.as_str());
    builder.push(" RETURNING *");
    trace!("📝️ Executing query: {}", builder.sql());
    let res = builder.build().fetch_optional(conn).await?.map(|row: SqliteRow| Product::from_row(&row)).transpose()?;
    Ok(res)
}

/// Returns `true` if a row was deleted.
pub(crate) async fn delete_product(id: &ProductId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id.as_str()).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

/// Atomically subtracts `amount` units of stock, refusing to let the quantity go negative. The guard lives in
/// the WHERE clause so that concurrent decrements serialise at the database rather than racing through a
/// read-modify-write in application code. Returns the remaining quantity.
pub(crate) async fn decrement_stock(
    id: &ProductId,
    amount: i64,
    conn: &mut SqliteConnection,
) -> Result<i64, PaymentGatewayError> {
    let remaining: Option<(i64,)> = sqlx::query_as(
        "UPDATE products SET quantity = quantity - $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND quantity \
         >= $1 RETURNING quantity",
    )
    .bind(amount)
    .bind(id.as_str())
    .fetch_optional(&mut *conn)
    .await?;
    match remaining {
        Some((quantity,)) => {
            trace!("📝️ Stock for product {id} reduced by {amount}. {quantity} remaining.");
            Ok(quantity)
        },
        // The guard did not match. Work out whether the product is missing or merely out of stock.
        None => match fetch_product_by_id(id, conn).await? {
            Some(_) => Err(PaymentGatewayError::InsufficientStock(id.clone())),
            None => Err(PaymentGatewayError::ProductNotFound(id.clone())),
        },
    }
}
