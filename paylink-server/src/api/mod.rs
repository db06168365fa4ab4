//! HTTP API.
//!
//! # Endpoints
//!
//! - `POST /checkout`             – create an order and redirect to the gateway
//! - `GET  /orders/{order_id}`     – order status
//! - `GET  /orders/{order_id}/pay` – redirect to the gateway again for a pending order
//! - `POST /payments/webhook`     – gateway notification (signed form body)
//! - `GET  /payments/return`      – buyer's browser coming back from the gateway

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use paylink_core::outcome::OutcomeError;
use paylink_core::store::StoreError;
use paylink_sdk::signature::SignatureError;

use crate::state::AppState;

pub mod extractors;

mod checkout;
mod orders;
mod payments;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(checkout::checkout))
        .route("/orders/{order_id}", get(orders::get_order))
        .route("/orders/{order_id}/pay", get(checkout::pay_again))
        .route("/payments/webhook", post(payments::payment_webhook))
        .route("/payments/return", get(payments::payment_return))
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// Errors that can occur in API handlers.
#[derive(Debug)]
enum ApiError {
    /// The order store failed.
    Store(StoreError),
    /// A payment link could not be signed.
    Signature(SignatureError),
    /// An endpoint URL could not be built from `public_url`.
    Url(url::ParseError),
    /// The requested order was not found.
    NotFound,
    /// A checkout without products.
    EmptyCart,
    /// The order is not in a pending state.
    OrderNotPending,
    /// No gateway secret is configured.
    SecretNotConfigured,
    /// A verified notification did not have the expected shape.
    InvalidNotification(serde_json::Error),
    /// A verified callback named an order this service does not know.
    UnknownOrder(String),
    /// The callback signature could not be verified.
    Forbidden,
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl From<SignatureError> for ApiError {
    fn from(err: SignatureError) -> Self {
        ApiError::Signature(err)
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::Url(err)
    }
}

impl From<OutcomeError> for ApiError {
    fn from(err: OutcomeError) -> Self {
        match err {
            OutcomeError::UnknownOrder(id) => ApiError::UnknownOrder(id),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::Store(e) => {
                tracing::error!(error = %e, "Order store error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            ApiError::Signature(e) => {
                tracing::error!(error = %e, "Failed to sign payment link");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            ApiError::Url(e) => {
                tracing::error!(error = %e, "Failed to build endpoint URL");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            ApiError::NotFound => (StatusCode::NOT_FOUND, "order not found").into_response(),
            ApiError::EmptyCart => {
                (StatusCode::BAD_REQUEST, "checkout needs at least one product").into_response()
            }
            ApiError::OrderNotPending => {
                (StatusCode::CONFLICT, "order is not pending").into_response()
            }
            ApiError::SecretNotConfigured => {
                tracing::error!("Gateway secret is not configured");
                (StatusCode::SERVICE_UNAVAILABLE, "payments unavailable").into_response()
            }
            ApiError::InvalidNotification(e) => {
                tracing::warn!(error = %e, "Verified notification has an unexpected shape");
                (StatusCode::BAD_REQUEST, "invalid notification").into_response()
            }
            ApiError::UnknownOrder(id) => {
                tracing::warn!(order_id = %id, "Callback for unknown order");
                (StatusCode::NOT_FOUND, "order not found").into_response()
            }
            ApiError::Forbidden => {
                (StatusCode::FORBIDDEN, "signature verification failed").into_response()
            }
        }
    }
}
