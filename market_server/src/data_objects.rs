use std::fmt::Display;

use market_engine::db_types::{AccountStatus, Role};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    pub role: Role,
}

/// Starts a checkout for one unit of the given product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    #[serde(rename = "productId")]
    pub product_id: String,
}

/// Sent by the success page after the processor redirected the buyer back to us. Only the session reference is
/// trusted; everything else is resolved at the processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSuccessRequest {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// What the client needs to send the buyer off to the processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleUpdateRequest {
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountStatusUpdateRequest {
    pub email: String,
    pub status: AccountStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeaturedParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}
