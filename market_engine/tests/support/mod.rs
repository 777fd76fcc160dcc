//! Shared fixtures for the engine integration tests: a throwaway SQLite database per test, a seeded catalog, and
//! an in-memory payment provider whose sessions the tests script directly.
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
        Mutex,
    },
};

use market_engine::{
    db_types::{NewProduct, Product},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{CheckoutSession, NewCheckoutSession, PaymentProvider, ProviderError, SessionStatus},
    InventoryManagement,
    SqliteDatabase,
};
use mkt_common::Money;

/// A fresh database on its own file. A single pooled connection keeps SQLite's single-writer nature out of the
/// tests; concurrency is exercised at the task level, not the connection level.
pub async fn new_test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating test database")
}

pub async fn seed_product(db: &SqliteDatabase, name: &str, price_cents: i64, quantity: i64) -> Product {
    let product = NewProduct {
        name: name.to_string(),
        category: "gadgets".to_string(),
        description: format!("{name}, but described"),
        price: Money::from_cents(price_cents),
        quantity,
        seller_name: "Alice".to_string(),
        seller_email: "alice@sellers.test".to_string(),
        visible: true,
        image: None,
    };
    db.insert_product(product).await.expect("Error seeding product")
}

static SESSION_SEQ: AtomicU64 = AtomicU64::new(1);

/// A scriptable in-memory stand-in for the payment processor.
#[derive(Clone, Default)]
pub struct StubProvider {
    sessions: Arc<Mutex<HashMap<String, CheckoutSession>>>,
}

impl StubProvider {
    pub fn with_session(self, session: CheckoutSession) -> Self {
        self.sessions.lock().unwrap().insert(session.id.clone(), session);
        self
    }

    pub fn completed_session(session_ref: &str, payment_id: &str, product: &Product, buyer: &str) -> CheckoutSession {
        CheckoutSession {
            id: session_ref.to_string(),
            payment_intent: Some(payment_id.to_string()),
            status: SessionStatus::Complete,
            amount_total: product.price,
            customer_email: Some(buyer.to_string()),
            product_id: Some(product.id.clone()),
            url: None,
        }
    }
}

impl PaymentProvider for StubProvider {
    async fn create_checkout_session(&self, session: NewCheckoutSession) -> Result<CheckoutSession, ProviderError> {
        let n = SESSION_SEQ.fetch_add(1, Ordering::SeqCst);
        let created = CheckoutSession {
            id: format!("cs_test_{n}"),
            payment_intent: None,
            status: SessionStatus::Open,
            amount_total: session.unit_price * session.quantity,
            customer_email: Some(session.customer_email),
            product_id: Some(session.product_id),
            url: Some(format!("https://checkout.test/pay/cs_test_{n}")),
        };
        self.sessions.lock().unwrap().insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn retrieve_checkout_session(&self, session_ref: &str) -> Result<CheckoutSession, ProviderError> {
        self.sessions
            .lock()
            .unwrap()
            .get(session_ref)
            .cloned()
            .ok_or_else(|| ProviderError::SessionNotFound(session_ref.to_string()))
    }
}
