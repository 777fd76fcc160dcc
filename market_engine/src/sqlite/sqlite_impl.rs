//! `SqliteDatabase` is a concrete implementation of a marketplace engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{db_url, new_pool, orders, products, users};
use crate::{
    db_types::{
        AccountStatus,
        NewOrder,
        NewProduct,
        NewTrackingEvent,
        Order,
        OrderId,
        OrderStatus,
        Product,
        ProductId,
        ProductUpdate,
        Role,
        TrackingEvent,
        User,
        DELIVERED_STATUS,
    },
    order_objects::OrderQueryFilter,
    traits::{
        InventoryManagement,
        OrderManagement,
        PaymentGatewayDatabase,
        PaymentGatewayError,
        UserAccountError,
        UserManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Takes a new order and, in a single atomic transaction,
    /// * inserts the order, keyed on `transaction_id`. If the transaction has already been fulfilled, nothing
    ///   further is done and the existing order is returned.
    /// * debits the product's stock, rolling the whole transaction back if the stock would go negative.
    ///
    /// The insert-then-decrement pair either lands together or not at all, so a failed decrement can never leave
    /// an orphaned order behind.
    async fn fulfil_payment(&self, order: NewOrder) -> Result<(Order, bool), PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        // Fast path: the payment has already been reconciled.
        if let Some(existing) = orders::fetch_order_by_transaction_id(&order.transaction_id, &mut tx).await? {
            debug!("🗃️ Transaction {} already fulfilled by order {}", order.transaction_id, existing.id);
            return Ok((existing, false));
        }
        let product_id = order.product_id.clone();
        let quantity = order.quantity;
        match orders::insert_order(order, &mut tx).await {
            Ok(inserted) => {
                let remaining = products::decrement_stock(&product_id, quantity, &mut tx).await?;
                tx.commit().await?;
                debug!(
                    "🗃️ Order {} created for transaction {}. {remaining} units of {product_id} remain.",
                    inserted.id, inserted.transaction_id
                );
                Ok((inserted, true))
            },
            // A concurrent fulfilment won the insert race between our fast-path read and the insert. Roll back
            // and hand the winner's order to the caller.
            Err(PaymentGatewayError::DuplicateTransaction(txid)) => {
                tx.rollback().await?;
                let mut conn = self.pool.acquire().await?;
                let winner = orders::fetch_order_by_transaction_id(&txid, &mut conn)
                    .await?
                    .ok_or(PaymentGatewayError::DuplicateTransaction(txid))?;
                Ok((winner, false))
            },
            Err(e) => Err(e),
        }
    }

    async fn fetch_order_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_transaction_id(transaction_id, &mut conn).await?;
        Ok(order)
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}

impl InventoryManagement for SqliteDatabase {
    async fn insert_product(&self, product: NewProduct) -> Result<Product, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::insert_product(product, &mut conn).await?;
        debug!("🗃️ Product {} ({}) has been saved in the DB", product.id, product.name);
        Ok(product)
    }

    async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product_by_id(id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_all_products(&self) -> Result<Vec<Product>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let products = products::fetch_all_products(&mut conn).await?;
        Ok(products)
    }

    async fn fetch_featured_products(&self, limit: i64) -> Result<Vec<Product>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let products = products::fetch_featured_products(limit, &mut conn).await?;
        Ok(products)
    }

    async fn update_product(
        &self,
        id: &ProductId,
        update: ProductUpdate,
    ) -> Result<Option<Product>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        products::update_product(id, update, &mut conn).await
    }

    async fn delete_product(&self, id: &ProductId) -> Result<bool, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let deleted = products::delete_product(id, &mut conn).await?;
        if deleted {
            debug!("🗃️ Product {id} has been deleted. Existing orders keep their snapshot of it.");
        }
        Ok(deleted)
    }

    async fn decrement_stock(&self, id: &ProductId, amount: i64) -> Result<i64, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        products::decrement_stock(id, amount, &mut conn).await
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_id(&self, id: &OrderId) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(id, &mut conn).await?;
        Ok(order)
    }

    async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(filter, &mut conn).await?;
        Ok(orders)
    }

    async fn transition_status(
        &self,
        id: &OrderId,
        expected: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::transition_status(id, expected, to, &mut conn).await?;
        if let Some(order) = &order {
            debug!("🗃️ Order {} moved from {expected} to {}", order.id, order.status);
        }
        Ok(order)
    }

    /// Appends the tracking event and refreshes the order's tracking projection in a single atomic transaction.
    /// Tracking is refused on rejected orders and on orders whose history has already reached
    /// [`DELIVERED_STATUS`].
    async fn append_tracking_event(
        &self,
        id: &OrderId,
        event: NewTrackingEvent,
    ) -> Result<Order, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_id(id, &mut tx)
            .await?
            .ok_or_else(|| PaymentGatewayError::OrderNotFound(id.clone()))?;
        if order.status == OrderStatus::Rejected {
            info!("🗃️ Order {id} is rejected and does not accept tracking events");
            return Err(PaymentGatewayError::TrackingClosed(id.clone()));
        }
        let delivered =
            order.current_status.as_deref().map(|s| s.eq_ignore_ascii_case(DELIVERED_STATUS)).unwrap_or(false);
        if delivered {
            info!("🗃️ Order {id} has been delivered. Its shipment history is closed.");
            return Err(PaymentGatewayError::TrackingClosed(id.clone()));
        }
        let event = orders::insert_tracking_event(id, event, &mut tx).await?;
        let order = orders::update_tracking_projection(id, &event.status, &event.location, &mut tx)
            .await?
            .ok_or_else(|| PaymentGatewayError::OrderNotFound(id.clone()))?;
        tx.commit().await?;
        debug!("🗃️ Tracking event '{}' recorded for order {id}", event.status);
        Ok(order)
    }

    async fn fetch_tracking_events(&self, id: &OrderId) -> Result<Vec<TrackingEvent>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let events = orders::fetch_tracking_events(id, &mut conn).await?;
        Ok(events)
    }
}

impl UserManagement for SqliteDatabase {
    async fn upsert_user_on_login(&self, email: &str) -> Result<User, UserAccountError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::upsert_user_on_login(email, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_user(&self, email: &str) -> Result<Option<User>, UserAccountError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user(email, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_all_users(&self, excluding: &str) -> Result<Vec<User>, UserAccountError> {
        let mut conn = self.pool.acquire().await?;
        let users = users::fetch_all_users(excluding, &mut conn).await?;
        Ok(users)
    }

    async fn update_role(&self, email: &str, role: Role) -> Result<User, UserAccountError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::update_role(email, role, &mut conn)
            .await?
            .ok_or_else(|| UserAccountError::UserNotFound(email.to_string()))?;
        debug!("🗃️ User {email} now holds the {role} role");
        Ok(user)
    }

    async fn update_account_status(&self, email: &str, status: AccountStatus) -> Result<User, UserAccountError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::update_account_status(email, status, &mut conn)
            .await?
            .ok_or_else(|| UserAccountError::UserNotFound(email.to_string()))?;
        Ok(user)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
