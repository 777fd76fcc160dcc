use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderId, OrderStatus, TrackingEvent};

//--------------------------------------  OrderQueryFilter   ---------------------------------------------------------
/// Criteria for searching orders. Empty filters match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQueryFilter {
    pub customer_email: Option<String>,
    pub seller_email: Option<String>,
    pub status: Option<OrderStatus>,
}

impl OrderQueryFilter {
    pub fn with_customer_email(mut self, email: String) -> Self {
        self.customer_email = Some(email);
        self
    }

    pub fn with_seller_email(mut self, email: String) -> Self {
        self.seller_email = Some(email);
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.customer_email.is_none() && self.seller_email.is_none() && self.status.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "all orders");
        }
        let mut parts = Vec::with_capacity(3);
        if let Some(c) = &self.customer_email {
            parts.push(format!("customer={c}"));
        }
        if let Some(s) = &self.seller_email {
            parts.push(format!("seller={s}"));
        }
        if let Some(s) = &self.status {
            parts.push(format!("status={s}"));
        }
        write!(f, "{}", parts.join(", "))
    }
}

//-------------------------------------- FulfilmentReceipt   ---------------------------------------------------------
/// The stable result of reconciling a payment. Every call to reconcile with the same payment reference returns the
/// same receipt, no matter how often it is repeated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfilmentReceipt {
    #[serde(rename = "transactionId")]
    pub transaction_id: String,
    #[serde(rename = "orderId")]
    pub order_id: OrderId,
}

//--------------------------------------   TrackingDetail    ---------------------------------------------------------
/// An order together with its full shipment history, in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingDetail {
    pub order: Order,
    pub events: Vec<TrackingEvent>,
}
