use actix_web::{http::StatusCode, web, web::ServiceConfig};
use market_engine::{
    db_types::{AccountStatus, Role},
    UserApi,
};
use mockall::predicate::eq;

use super::{
    helpers::{get_request, issue_token, patch_request, post_request},
    mocks::{sample_user, MockUserStore, ADMIN, ALICE, BOB},
};
use crate::{
    data_objects::{AccountStatusUpdateRequest, LoginRequest, RoleUpdateRequest},
    routes::{AllUsersRoute, LoginRoute, UpdateAccountStatusRoute, UpdateUserRoleRoute, UserRoleRoute},
};

fn configure(cfg: &mut ServiceConfig) {
    let mut store = MockUserStore::new();
    store.expect_upsert_user_on_login().returning(|email| Ok(sample_user(email, Role::Customer)));
    store.expect_fetch_user().returning(|email| Ok(Some(sample_user(email, Role::Customer))));
    store.expect_fetch_all_users().with(eq(ADMIN)).returning(|_| Ok(vec![sample_user(ALICE, Role::Seller)]));
    store.expect_update_role().returning(|email, role| Ok(sample_user(email, role)));
    store.expect_update_account_status().returning(|email, status| {
        let mut user = sample_user(email, Role::Customer);
        user.status = status;
        Ok(user)
    });
    let api = UserApi::new(store);
    let signer = crate::auth::TokenIssuer::new(&super::helpers::get_auth_config());
    cfg.service(LoginRoute::<MockUserStore>::new())
        .service(UserRoleRoute::<MockUserStore>::new())
        .service(AllUsersRoute::<MockUserStore>::new())
        .service(UpdateUserRoleRoute::<MockUserStore>::new())
        .service(UpdateAccountStatusRoute::<MockUserStore>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(signer));
}

#[actix_web::test]
async fn login_issues_an_access_token() {
    let _ = env_logger::try_init().ok();
    let body = LoginRequest { email: BOB.to_string() };
    let (status, body) = post_request("", "/users/login", &body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("accessToken"));
    assert!(body.contains(r#""role":"customer""#));
}

#[actix_web::test]
async fn own_role_lookup() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(BOB, Role::Customer);
    let (status, body) = get_request(&token, &format!("/users/role/{BOB}"), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(BOB));
}

#[actix_web::test]
async fn role_lookup_for_someone_else() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(BOB, Role::Customer);
    let err = get_request(&token, &format!("/users/role/{ALICE}"), configure).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient Permissions. You may only look up your own account");
}

#[actix_web::test]
async fn admin_can_look_up_anyone() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(ADMIN, Role::Admin);
    let (status, body) = get_request(&token, &format!("/users/role/{BOB}"), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(BOB));
}

#[actix_web::test]
async fn user_list_excludes_the_caller() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(ADMIN, Role::Admin);
    let (status, body) = get_request(&token, "/users", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(ALICE));
    assert!(!body.contains(ADMIN));
}

#[actix_web::test]
async fn role_update_needs_admin() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(ALICE, Role::Seller);
    let body = RoleUpdateRequest { email: BOB.to_string(), role: Role::Seller };
    let err = patch_request(&token, "/users/role", &body, configure).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient permissions");
}

#[actix_web::test]
async fn role_update_as_admin() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(ADMIN, Role::Admin);
    let body = RoleUpdateRequest { email: BOB.to_string(), role: Role::Seller };
    let (status, body) = patch_request(&token, "/users/role", &body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""role":"seller""#));
}

#[actix_web::test]
async fn account_status_update_as_admin() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(ADMIN, Role::Admin);
    let body = AccountStatusUpdateRequest { email: BOB.to_string(), status: AccountStatus::Suspended };
    let (status, body) = patch_request(&token, "/users/status", &body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""status":"suspended""#));
}
