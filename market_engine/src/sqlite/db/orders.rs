use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, NewTrackingEvent, Order, OrderId, OrderStatus, TrackingEvent},
    order_objects::OrderQueryFilter,
    traits::PaymentGatewayError,
};

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
///
/// A unique-constraint violation on `transaction_id` is surfaced as
/// [`PaymentGatewayError::DuplicateTransaction`] so that callers can fall back to the order that won the race.
pub(crate) async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, PaymentGatewayError> {
    let txid = order.transaction_id.clone();
    let result = sqlx::query_as(
        r#"
            INSERT INTO orders (
                id,
                product_id,
                transaction_id,
                customer_email,
                seller_name,
                seller_email,
                name,
                category,
                price,
                quantity,
                image
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *;
        "#,
    )
    .bind(order.order_id)
    .bind(order.product_id)
    .bind(order.transaction_id)
    .bind(order.customer_email)
    .bind(order.seller_name)
    .bind(order.seller_email)
    .bind(order.name)
    .bind(order.category)
    .bind(order.price)
    .bind(order.quantity)
    .bind(order.image)
    .fetch_one(conn)
    .await;
    match result {
        Ok(order) => Ok(order),
        Err(sqlx::Error::Database(de)) if de.is_unique_violation() => {
            debug!("📝️ Transaction {txid} has already been fulfilled. Yielding to the existing order.");
            Err(PaymentGatewayError::DuplicateTransaction(txid))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_order_by_id(id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Returns the order created for the given payment identifier, if the payment has already been fulfilled.
pub async fn fetch_order_by_transaction_id(
    transaction_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE transaction_id = $1")
        .bind(transaction_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at` in ascending order
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT * FROM orders
    "#,
    );
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(customer) = query.customer_email {
        where_clause.push("customer_email = ");
        where_clause.push_bind_unseparated(customer);
    }
    if let Some(seller) = query.seller_email {
        where_clause.push("seller_email = ");
        where_clause.push_bind_unseparated(seller);
    }
    if let Some(status) = query.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status.to_string());
    }
    builder.push(" ORDER BY created_at ASC");

    trace!("📝️ Executing query: {}", builder.sql());
    let query = builder.build_query_as::<Order>();
    let orders = query.fetch_all(conn).await?;
    trace!("Result of fetch_orders: {:?}", orders.len());
    Ok(orders)
}

/// Conditionally moves an order out of `expected` into `to`. The status guard lives in the WHERE clause, so a
/// concurrent transition that got there first leaves this one matching nothing and `None` is returned. Approval
/// stamps `approved_at` in the same statement.
pub(crate) async fn transition_status(
    id: &OrderId,
    expected: OrderStatus,
    to: OrderStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let sql = if to == OrderStatus::Approved {
        "UPDATE orders SET status = $1, approved_at = CURRENT_TIMESTAMP, last_updated = CURRENT_TIMESTAMP WHERE id \
         = $2 AND status = $3 RETURNING *"
    } else {
        "UPDATE orders SET status = $1, last_updated = CURRENT_TIMESTAMP WHERE id = $2 AND status = $3 RETURNING *"
    };
    let order = sqlx::query_as(sql)
        .bind(to.to_string())
        .bind(id.as_str())
        .bind(expected.to_string())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub(crate) async fn insert_tracking_event(
    id: &OrderId,
    event: NewTrackingEvent,
    conn: &mut SqliteConnection,
) -> Result<TrackingEvent, sqlx::Error> {
    let event = sqlx::query_as(
        "INSERT INTO tracking_events (order_id, status, location, note) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(id.as_str())
    .bind(event.status)
    .bind(event.location)
    .bind(event.note)
    .fetch_one(conn)
    .await?;
    Ok(event)
}

/// Mirrors the latest tracking event onto the order row so that list views don't need a join.
pub(crate) async fn update_tracking_projection(
    id: &OrderId,
    status: &str,
    location: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        "UPDATE orders SET current_status = $1, last_location = $2, last_updated = CURRENT_TIMESTAMP WHERE id = $3 \
         RETURNING *",
    )
    .bind(status)
    .bind(location)
    .bind(id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// The full tracking history for an order, in insertion order.
pub async fn fetch_tracking_events(
    id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<TrackingEvent>, sqlx::Error> {
    let events = sqlx::query_as("SELECT * FROM tracking_events WHERE order_id = $1 ORDER BY id ASC")
        .bind(id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(events)
}
