use actix_web::{http::StatusCode, web, web::ServiceConfig};
use market_engine::{
    db_types::{NewTrackingEvent, OrderStatus, Role},
    OrderLifecycleApi,
};

use super::{
    helpers::{get_request, issue_token, post_request},
    mocks::{sample_order, MockOrderStore, ADMIN, ALICE, BOB},
};
use crate::routes::{
    AddTrackingRoute,
    AllOrdersRoute,
    ApproveOrderRoute,
    ManageOrdersRoute,
    MyOrdersRoute,
    OrderByIdRoute,
    OrderTrackingRoute,
    OrdersByStatusRoute,
};

const ORDER_ID: &str = "7d7de709-7d26-4f39-a04d-9b72eff80d52";

fn configure(cfg: &mut ServiceConfig) {
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_id().returning(|_| Ok(Some(sample_order(BOB, ALICE))));
    store.expect_search_orders().returning(|_| Ok(vec![sample_order(BOB, ALICE)]));
    store.expect_transition_status().returning(|_, _, to| {
        let mut order = sample_order(BOB, ALICE);
        order.status = to;
        Ok(Some(order))
    });
    store.expect_append_tracking_event().returning(|_, event| {
        let mut order = sample_order(BOB, ALICE);
        order.current_status = Some(event.status);
        order.last_location = Some(event.location);
        Ok(order)
    });
    store.expect_fetch_tracking_events().returning(|_| Ok(vec![]));
    let api = OrderLifecycleApi::new(store);
    cfg.service(MyOrdersRoute::<MockOrderStore>::new())
        .service(ManageOrdersRoute::<MockOrderStore>::new())
        .service(AllOrdersRoute::<MockOrderStore>::new())
        .service(OrdersByStatusRoute::<MockOrderStore>::new())
        .service(ApproveOrderRoute::<MockOrderStore>::new())
        .service(AddTrackingRoute::<MockOrderStore>::new())
        .service(OrderTrackingRoute::<MockOrderStore>::new())
        .service(OrderByIdRoute::<MockOrderStore>::new())
        .app_data(web::Data::new(api));
}

#[actix_web::test]
async fn my_orders_without_token() {
    let _ = env_logger::try_init().ok();
    let err = get_request("", "/my-orders", configure).await.expect_err("Expected error");
    assert_eq!(err, "No bearer token was provided.");
}

#[actix_web::test]
async fn my_orders_as_customer() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(BOB, Role::Customer);
    let (status, body) = get_request(&token, "/my-orders", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(ORDER_ID));
}

#[actix_web::test]
async fn manage_orders_needs_seller_role() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(BOB, Role::Customer);
    let err = get_request(&token, "/manage-orders", configure).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient permissions");
}

#[actix_web::test]
async fn all_orders_needs_admin_role() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(ALICE, Role::Seller);
    let err = get_request(&token, "/orders", configure).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient permissions");
}

#[actix_web::test]
async fn orders_by_status_as_admin() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(ADMIN, Role::Admin);
    let (status, body) = get_request(&token, "/orders/status/pending", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(ORDER_ID));
}

#[actix_web::test]
async fn orders_by_unknown_status() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(ADMIN, Role::Admin);
    let err = get_request(&token, "/orders/status/teleported", configure).await.expect_err("Expected error");
    assert_eq!(err, "Could not read request path: Invalid order status: teleported");
}

#[actix_web::test]
async fn order_by_id_with_malformed_id() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(BOB, Role::Customer);
    let err = get_request(&token, "/orders/nope", configure).await.expect_err("Expected error");
    assert_eq!(err, "Could not read request path: Not a valid identifier: nope");
}

#[actix_web::test]
async fn order_by_id_as_buyer() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(BOB, Role::Customer);
    let (status, body) = get_request(&token, &format!("/orders/{ORDER_ID}"), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("pi_0001"));
}

#[actix_web::test]
async fn order_by_id_as_stranger_looks_absent() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("mallory@buyers.test", Role::Customer);
    let err = get_request(&token, &format!("/orders/{ORDER_ID}"), configure).await.expect_err("Expected error");
    assert_eq!(err, format!("The data was not found. Order {ORDER_ID}"));
}

#[actix_web::test]
async fn approve_order_as_its_seller() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(ALICE, Role::Seller);
    let (status, body) =
        post_request(&token, &format!("/orders/{ORDER_ID}/approve"), &(), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("approved"));
}

#[actix_web::test]
async fn approve_order_as_another_seller() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("carol@sellers.test", Role::Seller);
    let err =
        post_request(&token, &format!("/orders/{ORDER_ID}/approve"), &(), configure).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient Permissions. You may only manage your own orders");
}

#[actix_web::test]
async fn add_tracking_as_its_seller() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(ALICE, Role::Seller);
    let event = NewTrackingEvent { status: "Shipped".to_string(), location: "Cape Town".to_string(), note: None };
    let (status, body) =
        post_request(&token, &format!("/orders/{ORDER_ID}/tracking"), &event, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Cape Town"));
}

#[actix_web::test]
async fn tracking_history_as_buyer() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(BOB, Role::Customer);
    let (status, body) =
        get_request(&token, &format!("/orders/{ORDER_ID}/tracking"), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"events\":[]"));
}

#[actix_web::test]
async fn status_serialization_is_lowercase() {
    let order = sample_order(BOB, ALICE);
    assert_eq!(order.status, OrderStatus::Pending);
    let json = serde_json::to_string(&order.status).unwrap();
    assert_eq!(json, r#""pending""#);
}
