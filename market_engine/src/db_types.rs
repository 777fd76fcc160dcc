use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use mkt_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Error)]
#[error("Not a valid identifier: {0}")]
pub struct IdFormatError(String);

//--------------------------------------      ProductId      ---------------------------------------------------------
/// Server-assigned product identity. Stored as canonical UUID text.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ProductId {
    type Err = IdFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = Uuid::parse_str(s).map_err(|_| IdFormatError(s.to_string()))?;
        Ok(Self(id.to_string()))
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------       OrderId       ---------------------------------------------------------
/// Server-assigned order identity. Stored as canonical UUID text.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = IdFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = Uuid::parse_str(s).map_err(|_| IdFormatError(s.to_string()))?;
        Ok(Self(id.to_string()))
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------     OrderStatus     ---------------------------------------------------------
/// The approval pipeline state of an order. This is independent of shipment progress, which is tracked through
/// [`TrackingEvent`] records and the `current_status` projection on the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// The order has been created by the payment reconciler and awaits seller action.
    Pending,
    /// The order has been approved by the seller. Terminal for the approval pipeline.
    Approved,
    /// The order has been rejected by the seller. Terminal. No further tracking is accepted.
    Rejected,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "Pending"),
            OrderStatus::Approved => write!(f, "Approved"),
            OrderStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct StatusConversionError(String);

impl FromStr for OrderStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        Role         ---------------------------------------------------------
/// The role a principal holds on the marketplace. Roles are hierarchical for access-control purposes:
/// `Admin` ⊇ `Seller` ⊇ `Customer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Seller,
    Admin,
}

impl Role {
    fn rank(&self) -> u8 {
        match self {
            Role::Customer => 0,
            Role::Seller => 1,
            Role::Admin => 2,
        }
    }

    /// Whether this role grants at least the permissions of `required`.
    pub fn covers(&self, required: Role) -> bool {
        self.rank() >= required.rank()
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Customer => write!(f, "Customer"),
            Role::Seller => write!(f, "Seller"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid role: {0}")]
pub struct RoleConversionError(String);

impl FromStr for Role {
    type Err = RoleConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "customer" => Ok(Self::Customer),
            "seller" => Ok(Self::Seller),
            "admin" => Ok(Self::Admin),
            s => Err(RoleConversionError(s.to_string())),
        }
    }
}

//--------------------------------------    AccountStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Newly created on first login; awaiting any verification steps handled outside the engine.
    Pending,
    Active,
    Suspended,
}

impl Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountStatus::Pending => write!(f, "Pending"),
            AccountStatus::Active => write!(f, "Active"),
            AccountStatus::Suspended => write!(f, "Suspended"),
        }
    }
}

impl FromStr for AccountStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

//--------------------------------------       Product       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub description: String,
    /// Unit price in minor currency units. Always positive.
    pub price: Money,
    /// Units in stock. Never negative; decrements are conditional on sufficient stock.
    pub quantity: i64,
    pub seller_name: String,
    pub seller_email: String,
    /// Whether the product appears in public listings and the featured subset.
    pub visible: bool,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      NewProduct     ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    pub quantity: i64,
    pub seller_name: String,
    pub seller_email: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    pub image: Option<String>,
}

fn default_visible() -> bool {
    true
}

//--------------------------------------    ProductUpdate    ---------------------------------------------------------
/// A partial update of product fields. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub quantity: Option<i64>,
    pub visible: Option<bool>,
    pub image: Option<String>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.quantity.is_none()
            && self.visible.is_none()
            && self.image.is_none()
    }

    pub fn with_price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
/// A fulfilled sale. Product fields are a snapshot taken at reconciliation time and are immune to later product
/// edits or deletion. Orders are never deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Weak reference to the product; the product may be deleted without invalidating the order.
    pub product_id: ProductId,
    /// The processor-assigned payment identifier. Globally unique; doubles as the idempotency key for order
    /// creation.
    pub transaction_id: String,
    pub customer_email: String,
    pub seller_name: String,
    pub seller_email: String,
    pub name: String,
    pub category: String,
    pub price: Money,
    pub quantity: i64,
    pub image: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
    /// Latest tracking status label, if any tracking events have been recorded.
    pub current_status: Option<String>,
    /// Latest tracking location, if any tracking events have been recorded.
    pub last_location: Option<String>,
}

//--------------------------------------       NewOrder      ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub transaction_id: String,
    pub customer_email: String,
    pub seller_name: String,
    pub seller_email: String,
    pub name: String,
    pub category: String,
    pub price: Money,
    pub quantity: i64,
    pub image: Option<String>,
}

impl NewOrder {
    /// Builds an order that snapshots the product fields as they stand right now. The snapshot, not the live
    /// product row, is what buyer and seller see for the lifetime of the order.
    pub fn from_snapshot(
        product: &Product,
        transaction_id: String,
        customer_email: String,
        quantity: i64,
        total_price: Money,
    ) -> Self {
        Self {
            order_id: OrderId::random(),
            product_id: product.id.clone(),
            transaction_id,
            customer_email,
            seller_name: product.seller_name.clone(),
            seller_email: product.seller_email.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            price: total_price,
            quantity,
            image: product.image.clone(),
        }
    }
}

//--------------------------------------    TrackingEvent    ---------------------------------------------------------
/// An immutable shipment-progress record. Events are append-only and ordered by insertion.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub id: i64,
    pub order_id: OrderId,
    pub status: String,
    pub location: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The tracking status label that closes an order's shipment history.
pub const DELIVERED_STATUS: &str = "Delivered";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTrackingEvent {
    pub status: String,
    pub location: String,
    pub note: Option<String>,
}

//--------------------------------------        User         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub role: Role,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}
