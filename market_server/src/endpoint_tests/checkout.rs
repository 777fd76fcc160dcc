use actix_web::{http::StatusCode, web, web::ServiceConfig};
use market_engine::{
    db_types::Role,
    traits::{CheckoutSession, ProviderError, SessionStatus},
    ReconciliationApi,
};
use mkt_common::Money;

use super::{
    helpers::{issue_token, post_request},
    mocks::{sample_order, sample_product, MockFulfilmentStore, MockProvider, ALICE, BOB},
};
use crate::{
    config::RedirectUrls,
    data_objects::{CheckoutRequest, PaymentSuccessRequest},
    routes::{CheckoutRoute, PaymentSuccessRoute},
};

const PRODUCT_ID: &str = "2b31cbb3-5f46-4ec8-a6ed-63a64554e1a3";
const ORDER_ID: &str = "7d7de709-7d26-4f39-a04d-9b72eff80d52";

fn session(status: SessionStatus, payment_intent: Option<&str>) -> CheckoutSession {
    CheckoutSession {
        id: "cs_test_001".to_string(),
        payment_intent: payment_intent.map(String::from),
        status,
        amount_total: Money::from_cents(4_500),
        customer_email: Some(BOB.to_string()),
        product_id: Some(PRODUCT_ID.parse().expect("fixture id")),
        url: Some("https://processor.test/pay/cs_test_001".to_string()),
    }
}

fn register(cfg: &mut ServiceConfig, store: MockFulfilmentStore, provider: MockProvider) {
    let api = ReconciliationApi::new(store, provider);
    let redirects = RedirectUrls {
        success_url: "https://market.test/success".to_string(),
        cancel_url: "https://market.test/cancel".to_string(),
    };
    cfg.service(CheckoutRoute::<MockFulfilmentStore, MockProvider>::new())
        .service(PaymentSuccessRoute::<MockFulfilmentStore, MockProvider>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(redirects));
}

fn configure_checkout(cfg: &mut ServiceConfig) {
    let mut store = MockFulfilmentStore::new();
    store.expect_fetch_product().returning(|_| Ok(Some(sample_product(ALICE))));
    let mut provider = MockProvider::new();
    provider.expect_create_checkout_session().returning(|new_session| {
        assert_eq!(new_session.quantity, 1);
        assert!(new_session.success_url.starts_with("https://market.test/success?session_id="));
        assert_eq!(new_session.cancel_url, format!("https://market.test/cancel/{PRODUCT_ID}"));
        Ok(session(SessionStatus::Open, None))
    });
    register(cfg, store, provider);
}

fn configure_settled_payment(cfg: &mut ServiceConfig) {
    let mut store = MockFulfilmentStore::new();
    store.expect_fetch_order_by_transaction_id().returning(|_| Ok(None));
    store.expect_fetch_product().returning(|_| Ok(Some(sample_product(ALICE))));
    store.expect_fulfil_payment().returning(|_| Ok((sample_order(BOB, ALICE), true)));
    let mut provider = MockProvider::new();
    provider.expect_retrieve_checkout_session().returning(|_| Ok(session(SessionStatus::Complete, Some("pi_0001"))));
    register(cfg, store, provider);
}

fn configure_open_payment(cfg: &mut ServiceConfig) {
    let mut store = MockFulfilmentStore::new();
    store.expect_fetch_order_by_transaction_id().returning(|_| Ok(None));
    let mut provider = MockProvider::new();
    provider.expect_retrieve_checkout_session().returning(|_| Ok(session(SessionStatus::Open, Some("pi_0001"))));
    register(cfg, store, provider);
}

fn configure_unknown_session(cfg: &mut ServiceConfig) {
    let store = MockFulfilmentStore::new();
    let mut provider = MockProvider::new();
    provider
        .expect_retrieve_checkout_session()
        .returning(|session_ref| Err(ProviderError::SessionNotFound(session_ref.to_string())));
    register(cfg, store, provider);
}

#[actix_web::test]
async fn checkout_without_token() {
    let _ = env_logger::try_init().ok();
    let body = CheckoutRequest { product_id: PRODUCT_ID.to_string() };
    let err = post_request("", "/checkout", &body, configure_checkout).await.expect_err("Expected error");
    assert_eq!(err, "No bearer token was provided.");
}

#[actix_web::test]
async fn checkout_returns_the_redirect() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(BOB, Role::Customer);
    let body = CheckoutRequest { product_id: PRODUCT_ID.to_string() };
    let (status, body) = post_request(&token, "/checkout", &body, configure_checkout).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""sessionId":"cs_test_001""#));
    assert!(body.contains("https://processor.test/pay/cs_test_001"));
}

#[actix_web::test]
async fn checkout_with_malformed_product_id() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(BOB, Role::Customer);
    let body = CheckoutRequest { product_id: "garbage".to_string() };
    let err = post_request(&token, "/checkout", &body, configure_checkout).await.expect_err("Expected error");
    assert_eq!(err, "Could not read request body: Not a valid identifier: garbage");
}

#[actix_web::test]
async fn settled_payment_yields_a_receipt() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(BOB, Role::Customer);
    let body = PaymentSuccessRequest { session_id: "cs_test_001".to_string() };
    let (status, body) =
        post_request(&token, "/payment-success", &body, configure_settled_payment).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, format!(r#"{{"transactionId":"pi_0001","orderId":"{ORDER_ID}"}}"#));
}

#[actix_web::test]
async fn open_payment_is_refused() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(BOB, Role::Customer);
    let body = PaymentSuccessRequest { session_id: "cs_test_001".to_string() };
    let err = post_request(&token, "/payment-success", &body, configure_open_payment).await.expect_err("Expected error");
    assert_eq!(err, "The payment has not been completed. The payment session has status 'open' and cannot be fulfilled");
}

#[actix_web::test]
async fn unknown_session_is_not_found() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(BOB, Role::Customer);
    let body = PaymentSuccessRequest { session_id: "cs_test_404".to_string() };
    let err =
        post_request(&token, "/payment-success", &body, configure_unknown_session).await.expect_err("Expected error");
    assert_eq!(err, "The data was not found. No payment session matches the supplied reference");
}
