//! The order lifecycle state machine and tracking history.
//!
//! Approval-pipeline transitions are deliberately narrow: the only moves are `Pending -> Approved` and
//! `Pending -> Rejected`. Repeating a transition an order has already made is a harmless no-op; everything else
//! is refused. Rejected orders additionally stop accepting tracking events.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewTrackingEvent, Order, OrderId, OrderStatus},
    order_objects::{OrderQueryFilter, TrackingDetail},
    traits::{OrderManagement, PaymentGatewayError},
};

pub struct OrderLifecycleApi<B> {
    db: B,
}

impl<B: Debug> Debug for OrderLifecycleApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderLifecycleApi ({:?})", self.db)
    }
}

impl<B> OrderLifecycleApi<B>
where B: OrderManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn order_by_id(&self, id: &OrderId) -> Result<Option<Order>, PaymentGatewayError> {
        self.db.fetch_order_by_id(id).await
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, PaymentGatewayError> {
        self.db.search_orders(query).await
    }

    pub async fn orders_for_customer(&self, email: &str) -> Result<Vec<Order>, PaymentGatewayError> {
        self.db.search_orders(OrderQueryFilter::default().with_customer_email(email.to_string())).await
    }

    pub async fn orders_for_seller(&self, email: &str) -> Result<Vec<Order>, PaymentGatewayError> {
        self.db.search_orders(OrderQueryFilter::default().with_seller_email(email.to_string())).await
    }

    /// Moves the order to `Approved`. Only pending orders can be approved; approving an already approved order
    /// is a no-op that returns the order unchanged.
    pub async fn approve_order(&self, id: &OrderId) -> Result<Order, PaymentGatewayError> {
        self.set_status(id, OrderStatus::Approved).await
    }

    /// Moves the order to `Rejected`. Only pending orders can be rejected; in particular an approved order can
    /// never be rejected afterwards.
    pub async fn reject_order(&self, id: &OrderId) -> Result<Order, PaymentGatewayError> {
        self.set_status(id, OrderStatus::Rejected).await
    }

    async fn set_status(&self, id: &OrderId, new_status: OrderStatus) -> Result<Order, PaymentGatewayError> {
        let order =
            self.db.fetch_order_by_id(id).await?.ok_or_else(|| PaymentGatewayError::OrderNotFound(id.clone()))?;
        use OrderStatus::*;
        match (order.status, new_status) {
            (from, to) if from == to => {
                debug!("📝️ Order {id} is already {to}. No action to take.");
                Ok(order)
            },
            (Pending, Approved) | (Pending, Rejected) => {
                match self.db.transition_status(id, Pending, new_status).await? {
                    Some(order) => {
                        info!("📝️ Order {id} is now {new_status}");
                        Ok(order)
                    },
                    // A concurrent transition beat us to it. Re-read and judge the move from the fresh state.
                    None => {
                        let current = self
                            .db
                            .fetch_order_by_id(id)
                            .await?
                            .ok_or_else(|| PaymentGatewayError::OrderNotFound(id.clone()))?;
                        if current.status == new_status {
                            debug!("📝️ Order {id} reached {new_status} through a concurrent call.");
                            Ok(current)
                        } else {
                            Err(PaymentGatewayError::InvalidTransition { from: current.status, to: new_status })
                        }
                    },
                }
            },
            (from, to) => {
                info!("📝️ Refusing to move order {id} from {from} to {to}");
                Err(PaymentGatewayError::InvalidTransition { from, to })
            },
        }
    }

    /// Records a shipment-progress event against the order and returns the order with its refreshed tracking
    /// projection.
    pub async fn add_tracking_event(
        &self,
        id: &OrderId,
        event: NewTrackingEvent,
    ) -> Result<Order, PaymentGatewayError> {
        self.db.append_tracking_event(id, event).await
    }

    /// The order together with its full tracking history.
    pub async fn tracking_for_order(&self, id: &OrderId) -> Result<TrackingDetail, PaymentGatewayError> {
        let order =
            self.db.fetch_order_by_id(id).await?.ok_or_else(|| PaymentGatewayError::OrderNotFound(id.clone()))?;
        let events = self.db.fetch_tracking_events(id).await?;
        Ok(TrackingDetail { order, events })
    }
}
