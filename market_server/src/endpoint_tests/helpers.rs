use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use log::debug;
use market_engine::db_types::Role;
use mkt_common::Secret;
use serde::Serialize;

use crate::{
    auth::{TokenIssuer, TokenVerifier},
    config::AuthConfig,
};

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this secret anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Secret::new("0f3a61b2c4d5e6f708192a3b4c5d6e7f8091a2b3c4d5e6f70819aabbccddeeff".to_string()),
        token_validity: chrono::Duration::hours(24),
    }
}

pub fn issue_token(email: &str, role: Role) -> String {
    let config = get_auth_config();
    TokenIssuer::new(&config).issue_token(email, role, None).expect("Failed to sign token")
}

pub async fn get_request(
    token: &str,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    send(TestRequest::get().uri(path), token, configure).await
}

pub async fn post_request<B: Serialize>(
    token: &str,
    path: &str,
    body: &B,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    send(TestRequest::post().uri(path).set_json(body), token, configure).await
}

pub async fn patch_request<B: Serialize>(
    token: &str,
    path: &str,
    body: &B,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    send(TestRequest::patch().uri(path).set_json(body), token, configure).await
}

pub async fn delete_request(
    token: &str,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    send(TestRequest::delete().uri(path), token, configure).await
}

async fn send(
    req: TestRequest,
    token: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let req = if token.is_empty() { req } else { req.insert_header(("Authorization", format!("Bearer {token}"))) };
    let req = req.to_request();
    let verifier = TokenVerifier::new(&get_auth_config());
    let app = App::new().app_data(web::Data::new(verifier)).configure(configure);

    let service = test::init_service(app).await;
    debug!("Making request to {}", req.path());
    let res = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?;
    if let Some(err) = res.response().error() {
        return Err(err.to_string());
    }
    let (_, res) = res.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}
