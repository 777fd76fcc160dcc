//! The payment reconciliation flow. This is the heart of the engine: it is the only code path that creates
//! orders, and it guarantees that a given payment creates exactly one order no matter how many times, or how
//! concurrently, the same payment reference is presented.
use std::fmt::Debug;

use log::*;

use crate::{
    api::errors::ReconciliationError,
    db_types::{NewOrder, ProductId},
    order_objects::FulfilmentReceipt,
    traits::{
        CheckoutSession,
        InventoryManagement,
        NewCheckoutSession,
        PaymentGatewayDatabase,
        PaymentProvider,
        ProviderError,
        SessionStatus,
    },
};

/// Every checkout sells exactly one unit. Carried over from the storefront this engine backs.
pub const CHECKOUT_QUANTITY: i64 = 1;

pub struct ReconciliationApi<B, P> {
    db: B,
    provider: P,
}

impl<B: Debug, P> Debug for ReconciliationApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi ({:?})", self.db)
    }
}

impl<B, P> ReconciliationApi<B, P>
where
    B: PaymentGatewayDatabase,
    P: PaymentProvider,
{
    pub fn new(db: B, provider: P) -> Self {
        Self { db, provider }
    }

    /// Opens a checkout session with the payment processor for one unit of the given product.
    ///
    /// The product must exist, be visible, and have stock. Stock is *not* reserved here; the authoritative
    /// decrement happens during [`Self::reconcile`], after the money has actually moved.
    pub async fn begin_checkout(
        &self,
        product_id: &ProductId,
        customer_email: String,
        success_url: String,
        cancel_url: String,
    ) -> Result<CheckoutSession, ReconciliationError> {
        let product = self
            .db
            .fetch_product(product_id)
            .await?
            .ok_or_else(|| ReconciliationError::ProductNotFound(product_id.clone()))?;
        if !product.visible || product.quantity < CHECKOUT_QUANTITY {
            info!("📒️ Product {product_id} is hidden or out of stock. Refusing to open a checkout session.");
            return Err(ReconciliationError::ProductUnavailable(product_id.clone()));
        }
        let session = NewCheckoutSession {
            product_id: product.id.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            image: product.image.clone(),
            unit_price: product.price,
            quantity: CHECKOUT_QUANTITY,
            customer_email,
            success_url,
            cancel_url,
        };
        let session = self.provider.create_checkout_session(session).await?;
        info!("📒️ Checkout session {} opened for product {product_id}", session.id);
        Ok(session)
    }

    /// Reconciles a payment reference into an order.
    ///
    /// The session is always resolved at the processor; nothing the client supplied beyond the reference itself
    /// is trusted. If the payment has already been reconciled, the existing order's receipt is returned and no
    /// state changes. Otherwise the session must be complete, and the order insert plus the stock decrement are
    /// applied as one atomic transaction by the backend.
    pub async fn reconcile(&self, session_ref: &str) -> Result<FulfilmentReceipt, ReconciliationError> {
        let session = match self.provider.retrieve_checkout_session(session_ref).await {
            Ok(session) => session,
            Err(ProviderError::SessionNotFound(_)) => return Err(ReconciliationError::PaymentNotFound),
            Err(e) => return Err(e.into()),
        };
        let transaction_id = session.payment_intent.clone().ok_or(ReconciliationError::MissingPaymentId)?;
        // Fast path: a previous delivery of this payment already created the order.
        if let Some(order) = self.db.fetch_order_by_transaction_id(&transaction_id).await? {
            debug!("📒️ Payment {transaction_id} was already reconciled into order {}. No action taken.", order.id);
            return Ok(FulfilmentReceipt { transaction_id, order_id: order.id });
        }
        if session.status != SessionStatus::Complete {
            info!("📒️ Session {session_ref} has status '{}'. Nothing to fulfil.", session.status);
            return Err(ReconciliationError::PaymentNotCompleted(session.status));
        }
        let product_id = session.product_id.clone().ok_or(ReconciliationError::MissingProduct)?;
        let product = self
            .db
            .fetch_product(&product_id)
            .await?
            .ok_or_else(|| ReconciliationError::ProductNotFound(product_id.clone()))?;
        let customer_email = session.customer_email.clone().ok_or_else(|| {
            ProviderError::InvalidResponse("the checkout session does not carry the buyer's email".to_string())
        })?;
        let order = NewOrder::from_snapshot(
            &product,
            transaction_id.clone(),
            customer_email,
            CHECKOUT_QUANTITY,
            session.amount_total,
        );
        let (order, created) = self.db.fulfil_payment(order).await?;
        if created {
            info!("📒️ Payment {transaction_id} reconciled into new order {}", order.id);
        } else {
            debug!("📒️ Payment {transaction_id} lost the insert race to order {}. Receipt is unchanged.", order.id);
        }
        Ok(FulfilmentReceipt { transaction_id: order.transaction_id, order_id: order.id })
    }
}
