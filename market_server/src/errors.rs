use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use market_engine::{PaymentGatewayError, ReconciliationError, UserAccountError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("The request conflicts with the current state. {0}")]
    Conflict(String),
    #[error("The payment has not been completed. {0}")]
    PaymentRequired(String),
    #[error("The payment processor could not be reached. {0}")]
    UpstreamError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
                AuthError::PoorlyFormattedToken(_) => StatusCode::BAD_REQUEST,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PaymentRequired(_) => StatusCode::PAYMENT_REQUIRED,
            Self::UpstreamError(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No bearer token was provided.")]
    MissingToken,
    #[error("Access token signature is invalid. {0}")]
    ValidationError(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
}

impl From<PaymentGatewayError> for ServerError {
    fn from(e: PaymentGatewayError) -> Self {
        match &e {
            PaymentGatewayError::ProductNotFound(_) | PaymentGatewayError::OrderNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            PaymentGatewayError::InvalidProductData(_) => Self::InvalidRequestBody(e.to_string()),
            PaymentGatewayError::InsufficientStock(_) |
            PaymentGatewayError::DuplicateTransaction(_) |
            PaymentGatewayError::InvalidTransition { .. } |
            PaymentGatewayError::TrackingClosed(_) => Self::Conflict(e.to_string()),
            PaymentGatewayError::DatabaseError(m) => Self::BackendError(format!("Database error: {m}")),
        }
    }
}

impl From<UserAccountError> for ServerError {
    fn from(e: UserAccountError) -> Self {
        match &e {
            UserAccountError::UserNotFound(_) => Self::NoRecordFound(e.to_string()),
            UserAccountError::DatabaseError(m) => Self::BackendError(format!("Database error: {m}")),
        }
    }
}

impl From<ReconciliationError> for ServerError {
    fn from(e: ReconciliationError) -> Self {
        use market_engine::traits::ProviderError;
        match e {
            ReconciliationError::PaymentNotFound => Self::NoRecordFound(e.to_string()),
            ReconciliationError::PaymentNotCompleted(_) | ReconciliationError::MissingPaymentId => {
                Self::PaymentRequired(e.to_string())
            },
            ReconciliationError::MissingProduct => Self::UpstreamError(e.to_string()),
            ReconciliationError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
            ReconciliationError::ProductUnavailable(_) => Self::Conflict(e.to_string()),
            ReconciliationError::Store(e) => e.into(),
            ReconciliationError::Provider(e) => match e {
                ProviderError::SessionNotFound(_) => Self::NoRecordFound(e.to_string()),
                ProviderError::Upstream(_) | ProviderError::InvalidResponse(_) => Self::UpstreamError(e.to_string()),
            },
        }
    }
}
