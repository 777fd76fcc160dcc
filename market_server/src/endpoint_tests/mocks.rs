use chrono::{TimeZone, Utc};
use market_engine::{
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
    },
    order_objects::OrderQueryFilter,
    traits::{
        CheckoutSession,
        InventoryManagement,
        NewCheckoutSession,
        OrderManagement,
        PaymentGatewayDatabase,
        PaymentGatewayError,
        PaymentProvider,
        ProviderError,
        UserAccountError,
        UserManagement,
    },
};
use mkt_common::Money;
use mockall::mock;

mock! {
    pub Inventory {}
    impl InventoryManagement for Inventory {
        async fn insert_product(&self, product: NewProduct) -> Result<Product, PaymentGatewayError>;
        async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, PaymentGatewayError>;
        async fn fetch_all_products(&self) -> Result<Vec<Product>, PaymentGatewayError>;
        async fn fetch_featured_products(&self, limit: i64) -> Result<Vec<Product>, PaymentGatewayError>;
        async fn update_product(&self, id: &ProductId, update: ProductUpdate) -> Result<Option<Product>, PaymentGatewayError>;
        async fn delete_product(&self, id: &ProductId) -> Result<bool, PaymentGatewayError>;
        async fn decrement_stock(&self, id: &ProductId, amount: i64) -> Result<i64, PaymentGatewayError>;
    }
}

mock! {
    pub OrderStore {}
    impl OrderManagement for OrderStore {
        async fn fetch_order_by_id(&self, id: &OrderId) -> Result<Option<Order>, PaymentGatewayError>;
        async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, PaymentGatewayError>;
        async fn transition_status(&self, id: &OrderId, expected: OrderStatus, to: OrderStatus) -> Result<Option<Order>, PaymentGatewayError>;
        async fn append_tracking_event(&self, id: &OrderId, event: NewTrackingEvent) -> Result<Order, PaymentGatewayError>;
        async fn fetch_tracking_events(&self, id: &OrderId) -> Result<Vec<TrackingEvent>, PaymentGatewayError>;
    }
}

mock! {
    pub UserStore {}
    impl UserManagement for UserStore {
        async fn upsert_user_on_login(&self, email: &str) -> Result<User, UserAccountError>;
        async fn fetch_user(&self, email: &str) -> Result<Option<User>, UserAccountError>;
        async fn fetch_all_users(&self, excluding: &str) -> Result<Vec<User>, UserAccountError>;
        async fn update_role(&self, email: &str, role: Role) -> Result<User, UserAccountError>;
        async fn update_account_status(&self, email: &str, status: AccountStatus) -> Result<User, UserAccountError>;
    }
}

// The checkout routes need a backend that is both an inventory ledger and a fulfilment store.
mock! {
    pub FulfilmentStore {}
    impl InventoryManagement for FulfilmentStore {
        async fn insert_product(&self, product: NewProduct) -> Result<Product, PaymentGatewayError>;
        async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, PaymentGatewayError>;
        async fn fetch_all_products(&self) -> Result<Vec<Product>, PaymentGatewayError>;
        async fn fetch_featured_products(&self, limit: i64) -> Result<Vec<Product>, PaymentGatewayError>;
        async fn update_product(&self, id: &ProductId, update: ProductUpdate) -> Result<Option<Product>, PaymentGatewayError>;
        async fn delete_product(&self, id: &ProductId) -> Result<bool, PaymentGatewayError>;
        async fn decrement_stock(&self, id: &ProductId, amount: i64) -> Result<i64, PaymentGatewayError>;
    }
    impl PaymentGatewayDatabase for FulfilmentStore {
        fn url(&self) -> &str;
        async fn fulfil_payment(&self, order: NewOrder) -> Result<(Order, bool), PaymentGatewayError>;
        async fn fetch_order_by_transaction_id(&self, transaction_id: &str) -> Result<Option<Order>, PaymentGatewayError>;
    }
}

mock! {
    pub Provider {}
    impl PaymentProvider for Provider {
        async fn create_checkout_session(&self, session: NewCheckoutSession) -> Result<CheckoutSession, ProviderError>;
        async fn retrieve_checkout_session(&self, session_ref: &str) -> Result<CheckoutSession, ProviderError>;
    }
}

//----------------------------------------------   Fixtures  ----------------------------------------------------

pub const ALICE: &str = "alice@sellers.test";
pub const BOB: &str = "bob@buyers.test";
pub const ADMIN: &str = "root@market.test";

pub fn sample_product(seller_email: &str) -> Product {
    let ts = Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap();
    Product {
        id: ProductId("2b31cbb3-5f46-4ec8-a6ed-63a64554e1a3".to_string()),
        name: "Walnut desk organiser".to_string(),
        category: "Office".to_string(),
        description: "Hand-finished walnut organiser".to_string(),
        price: Money::from_cents(4_500),
        quantity: 10,
        seller_name: "Alice".to_string(),
        seller_email: seller_email.to_string(),
        visible: true,
        image: None,
        created_at: ts,
        updated_at: ts,
    }
}

pub fn sample_order(customer_email: &str, seller_email: &str) -> Order {
    let ts = Utc.with_ymd_and_hms(2024, 3, 15, 18, 30, 0).unwrap();
    Order {
        id: OrderId("7d7de709-7d26-4f39-a04d-9b72eff80d52".to_string()),
        product_id: ProductId("2b31cbb3-5f46-4ec8-a6ed-63a64554e1a3".to_string()),
        transaction_id: "pi_0001".to_string(),
        customer_email: customer_email.to_string(),
        seller_name: "Alice".to_string(),
        seller_email: seller_email.to_string(),
        name: "Walnut desk organiser".to_string(),
        category: "Office".to_string(),
        price: Money::from_cents(4_500),
        quantity: 1,
        image: None,
        status: OrderStatus::Pending,
        created_at: ts,
        approved_at: None,
        last_updated: ts,
        current_status: None,
        last_location: None,
    }
}

pub fn sample_user(email: &str, role: Role) -> User {
    let ts = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
    User { email: email.to_string(), role, status: AccountStatus::Active, created_at: ts, last_login_at: ts }
}
