use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use bazaar_order_engine::traits::OrderGatewayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Authentication headers are missing or invalid. {0}")]
    Unauthenticated(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("{0}")]
    OrderFlow(OrderGatewayError),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::OrderFlow(e) => order_flow_status(e),
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

fn order_flow_status(e: &OrderGatewayError) -> StatusCode {
    use OrderGatewayError::*;
    match e {
        // Business-rule rejections the caller can act on.
        InsufficientStock(_) => StatusCode::BAD_REQUEST,
        EmptyOrder | InvalidQuantity(_) => StatusCode::BAD_REQUEST,
        // A failed signature check is a rejected request, never a silent pass.
        SignatureMismatch => StatusCode::BAD_REQUEST,
        InvalidStateTransition { .. } => StatusCode::BAD_REQUEST,
        ProductNotFound(_) | VariantNotFound { .. } => StatusCode::NOT_FOUND,
        OrderNotFound(_) | ProviderRefNotFound(_) => StatusCode::NOT_FOUND,
        ProviderUnavailable(_) => StatusCode::BAD_GATEWAY,
        DatabaseError(_) | OrderAlreadyExists(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<OrderGatewayError> for ServerError {
    fn from(e: OrderGatewayError) -> Self {
        Self::OrderFlow(e)
    }
}
