//! JWT access tokens for the marketplace server.
//!
//! Tokens are HS256-signed bearer tokens carrying the caller's email and role. They are issued at login and
//! verified on every privileged request, either by the ACL middleware (which stashes the claims in the request
//! extensions) or directly by the [`JwtClaims`] extractor.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpMessage, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use market_engine::db_types::Role;
use serde::{Deserialize, Serialize};

use crate::{config::AuthConfig, errors::AuthError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The caller's email address.
    pub sub: String,
    pub role: Role,
    /// Expiry, as a unix timestamp.
    pub exp: i64,
}

impl JwtClaims {
    pub fn email(&self) -> &str {
        &self.sub
    }
}

/// Extracts the bearer token from the `Authorization` header.
pub fn bearer_token(req: &HttpRequest) -> Result<&str, AuthError> {
    let header = req.headers().get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = header
        .to_str()
        .map_err(|e| AuthError::PoorlyFormattedToken(format!("Header is not valid UTF-8. {e}")))?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected 'Bearer <token>'".to_string()))
}

pub struct TokenIssuer {
    key: EncodingKey,
    validity: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let key = EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        Self { key, validity: config.token_validity }
    }

    /// Issues a signed access token for the given identity. The caller is responsible for having authenticated
    /// the identity first.
    pub fn issue_token(&self, email: &str, role: Role, validity: Option<Duration>) -> Result<String, AuthError> {
        let validity = validity.unwrap_or(self.validity);
        let exp = (Utc::now() + validity).timestamp();
        let claims = JwtClaims { sub: email.to_string(), role, exp };
        encode(&Header::default(), &claims, &self.key).map_err(|e| AuthError::ValidationError(e.to_string()))
    }
}

#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        Self { key, validation: Validation::default() }
    }

    pub fn decode_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::ValidationError(e.to_string()))?;
        Ok(data.claims)
    }
}

impl FromRequest for JwtClaims {
    type Error = crate::errors::ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // The ACL middleware has usually decoded the token already.
        if let Some(claims) = req.extensions().get::<JwtClaims>() {
            return ready(Ok(claims.clone()));
        }
        let result = match req.app_data::<web::Data<TokenVerifier>>() {
            Some(verifier) => bearer_token(req).and_then(|t| verifier.decode_token(t)).map_err(Into::into),
            None => Err(crate::errors::ServerError::InitializeError(
                "No token verifier is registered with the app".to_string(),
            )),
        };
        ready(result)
    }
}
