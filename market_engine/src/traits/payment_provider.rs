use std::{fmt::Display, str::FromStr};

use mkt_common::Money;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::ProductId;

/// The payment-processor capability consumed by the reconciler.
///
/// The processor is the single source of truth for a payment's completion status, amount and buyer. Client-supplied
/// amounts or statuses are never trusted; the reconciler always resolves the session by its reference through this
/// trait before acting on it.
#[allow(async_fn_in_trait)]
pub trait PaymentProvider {
    /// Creates a checkout session for one product and returns it, including the redirect URL the buyer must be
    /// sent to.
    async fn create_checkout_session(&self, session: NewCheckoutSession) -> Result<CheckoutSession, ProviderError>;

    /// Resolves the settlement truth for a previously created session by its reference.
    async fn retrieve_checkout_session(&self, session_ref: &str) -> Result<CheckoutSession, ProviderError>;
}

//--------------------------------------   NewCheckoutSession -------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCheckoutSession {
    pub product_id: ProductId,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    /// Unit price in minor units.
    pub unit_price: Money,
    pub quantity: i64,
    pub customer_email: String,
    pub success_url: String,
    pub cancel_url: String,
}

//--------------------------------------    CheckoutSession   -------------------------------------------------------
/// A processor-side checkout session as resolved from the processor, never from the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// The opaque session reference handed to the client for the redirect round-trip.
    pub id: String,
    /// The processor-assigned payment identifier. Present once a payment has been attached to the session; this
    /// is the domain idempotency key for order creation.
    pub payment_intent: Option<String>,
    pub status: SessionStatus,
    pub amount_total: Money,
    pub customer_email: Option<String>,
    /// The product this session was opened for, carried through processor metadata.
    pub product_id: Option<ProductId>,
    /// The redirect target for the buyer. Only meaningful on freshly created sessions.
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// The buyer has not completed payment yet.
    Open,
    /// Payment completed; the session is settled.
    Complete,
    /// The session lapsed without payment.
    Expired,
}

impl Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Open => write!(f, "open"),
            SessionStatus::Complete => write!(f, "complete"),
            SessionStatus::Expired => write!(f, "expired"),
        }
    }
}

impl FromStr for SessionStatus {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "complete" => Ok(Self::Complete),
            "expired" => Ok(Self::Expired),
            other => Err(ProviderError::InvalidResponse(format!("unknown session status '{other}'"))),
        }
    }
}

//--------------------------------------     ProviderError    -------------------------------------------------------
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("The payment processor has no record of session {0}")]
    SessionNotFound(String),
    /// The processor call failed or timed out. Retryable.
    #[error("Payment processor call failed: {0}")]
    Upstream(String),
    #[error("The payment processor returned an unusable response: {0}")]
    InvalidResponse(String),
}
