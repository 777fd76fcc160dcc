use crate::{
    db_types::{NewTrackingEvent, Order, OrderId, OrderStatus, TrackingEvent},
    order_objects::OrderQueryFilter,
    traits::PaymentGatewayError,
};

/// The order-store contract for everything after creation: queries, status transitions and tracking history.
/// Order creation itself goes through [`super::PaymentGatewayDatabase::fulfil_payment`].
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order_by_id(&self, id: &OrderId) -> Result<Option<Order>, PaymentGatewayError>;

    /// Fetches orders matching the filter, oldest first.
    async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, PaymentGatewayError>;

    /// Conditionally moves an order from `expected` to `to` in a single atomic update. When `to` is
    /// [`OrderStatus::Approved`], `approved_at` is stamped in the same statement.
    ///
    /// Returns the updated order, or `None` when the order's current status was not `expected` (a concurrent
    /// transition won). Callers decide the legality of the transition before calling; this method only guards
    /// against lost updates.
    async fn transition_status(
        &self,
        id: &OrderId,
        expected: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>, PaymentGatewayError>;

    /// Appends an immutable tracking event with a server-assigned timestamp and updates the order's
    /// `current_status`/`last_location`/`last_updated` projections, all in one transaction.
    ///
    /// Fails with [`PaymentGatewayError::TrackingClosed`] when the order is rejected or its shipment history has
    /// already reached the delivered state.
    async fn append_tracking_event(
        &self,
        id: &OrderId,
        event: NewTrackingEvent,
    ) -> Result<Order, PaymentGatewayError>;

    /// The full tracking history for an order, in insertion order.
    async fn fetch_tracking_events(&self, id: &OrderId) -> Result<Vec<TrackingEvent>, PaymentGatewayError>;
}
