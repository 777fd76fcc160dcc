//! REST client for the external payment processor.
//!
//! The processor hosts checkout sessions: we open one when a buyer starts a checkout, and resolve it again when
//! the buyer lands on the success page. All calls are authorised with the processor secret key as a bearer token.
use std::{str::FromStr, sync::Arc};

use log::*;
use market_engine::{
    db_types::ProductId,
    traits::{CheckoutSession, NewCheckoutSession, PaymentProvider, ProviderError, SessionStatus},
};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::{config::ProcessorConfig, errors::ServerError};

#[derive(Clone)]
pub struct PaymentProcessorClient {
    base_url: String,
    client: Arc<Client>,
}

impl PaymentProcessorClient {
    pub fn new(config: &ProcessorConfig) -> Result<Self, ServerError> {
        let mut headers = HeaderMap::with_capacity(2);
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.secret_key.reveal()))
            .map_err(|e| ServerError::InitializeError(format!("Invalid processor secret key. {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServerError::InitializeError(format!("Could not build the processor HTTP client. {e}")))?;
        Ok(Self { base_url: config.base_url.trim_end_matches('/').to_string(), client: Arc::new(client) })
    }

    fn sessions_url(&self) -> String {
        format!("{}/v1/checkout/sessions", self.base_url)
    }

    fn session_url(&self, session_ref: &str) -> String {
        format!("{}/v1/checkout/sessions/{session_ref}", self.base_url)
    }
}

impl PaymentProvider for PaymentProcessorClient {
    async fn create_checkout_session(&self, session: NewCheckoutSession) -> Result<CheckoutSession, ProviderError> {
        let url = self.sessions_url();
        trace!("POST {url}");
        let body = CreateSessionRequest::from(&session);
        let response = self.client.post(url).json(&body).send().await.map_err(upstream)?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Upstream(format!("Session creation failed with {status}. {message}")));
        }
        let resource = response.json::<SessionResource>().await.map_err(decode)?;
        debug!("Processor opened checkout session {} for product {}", resource.id, session.product_id);
        resource.try_into()
    }

    async fn retrieve_checkout_session(&self, session_ref: &str) -> Result<CheckoutSession, ProviderError> {
        let url = self.session_url(session_ref);
        trace!("GET {url}");
        let response = self.client.get(url).send().await.map_err(upstream)?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::SessionNotFound(session_ref.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Upstream(format!("Session retrieval failed with {status}. {message}")));
        }
        let resource = response.json::<SessionResource>().await.map_err(decode)?;
        resource.try_into()
    }
}

fn upstream(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Upstream(format!("Processor call timed out. {e}"))
    } else {
        ProviderError::Upstream(e.to_string())
    }
}

fn decode(e: reqwest::Error) -> ProviderError {
    ProviderError::InvalidResponse(e.to_string())
}

//--------------------------------------      Wire format      -------------------------------------------------------

#[derive(Debug, Serialize)]
struct CreateSessionRequest {
    product_name: String,
    product_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    product_image: Option<String>,
    /// Unit price in minor units.
    unit_amount: i64,
    quantity: i64,
    customer_email: String,
    success_url: String,
    cancel_url: String,
    metadata: SessionMetadata,
}

impl From<&NewCheckoutSession> for CreateSessionRequest {
    fn from(s: &NewCheckoutSession) -> Self {
        Self {
            product_name: s.name.clone(),
            product_description: s.description.clone(),
            product_image: s.image.clone(),
            unit_amount: s.unit_price.value(),
            quantity: s.quantity,
            customer_email: s.customer_email.clone(),
            success_url: s.success_url.clone(),
            cancel_url: s.cancel_url.clone(),
            metadata: SessionMetadata { product_id: s.product_id.to_string() },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionMetadata {
    product_id: String,
}

#[derive(Debug, Deserialize)]
struct SessionResource {
    id: String,
    payment_intent: Option<String>,
    status: String,
    amount_total: i64,
    customer_email: Option<String>,
    metadata: Option<SessionMetadata>,
    url: Option<String>,
}

impl TryFrom<SessionResource> for CheckoutSession {
    type Error = ProviderError;

    fn try_from(r: SessionResource) -> Result<Self, Self::Error> {
        let status = SessionStatus::from_str(&r.status)?;
        let product_id = match r.metadata {
            Some(m) => Some(
                ProductId::from_str(&m.product_id)
                    .map_err(|e| ProviderError::InvalidResponse(format!("Bad product id in metadata. {e}")))?,
            ),
            None => None,
        };
        Ok(CheckoutSession {
            id: r.id,
            payment_intent: r.payment_intent,
            status,
            amount_total: mkt_common::Money::from_cents(r.amount_total),
            customer_email: r.customer_email,
            product_id,
            url: r.url,
        })
    }
}
