use thiserror::Error;

use crate::{
    db_types::ProductId,
    traits::{PaymentGatewayError, ProviderError, SessionStatus},
};

/// Everything that can go wrong between receiving a payment reference and holding a durable order for it.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    #[error("No payment session matches the supplied reference")]
    PaymentNotFound,
    #[error("The payment session has status '{0}' and cannot be fulfilled")]
    PaymentNotCompleted(SessionStatus),
    #[error("The payment session has no payment attached to it")]
    MissingPaymentId,
    #[error("The payment session does not identify a product")]
    MissingProduct,
    #[error("The requested product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("Product {0} is not available for purchase")]
    ProductUnavailable(ProductId),
    #[error(transparent)]
    Store(#[from] PaymentGatewayError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
