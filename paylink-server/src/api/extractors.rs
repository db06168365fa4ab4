//! Custom Axum extractors for gateway callbacks.
//!
//! Provides `SignedForm`, which verifies the `Sign` header against a
//! form-encoded webhook body. All cryptographic operations are delegated to
//! [`paylink_sdk::signature`].

use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use paylink_sdk::signature::{self, SIGNATURE_HEADER, SignatureError};
use serde_json::Value;

use crate::state::AppState;

/// Upper bound on webhook body size.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// An Axum extractor that verifies the `Sign` header and parses the
/// form-encoded request body into its nested structure.
///
/// # Header format
///
/// ```text
/// Sign: {lowercase_hex_hmac_sha256}
/// ```
///
/// The signature covers the canonical JSON form of the parsed body, see
/// [`paylink_sdk::signature`].
pub struct SignedForm(pub Value);

/// Errors that can occur during signed-form verification.
#[derive(Debug, thiserror::Error)]
pub enum SignedFormError {
    #[error("missing Sign header")]
    MissingHeader,
    #[error("invalid Sign header")]
    InvalidHeader,
    #[error("failed to read request body")]
    BodyReadError,
    #[error("gateway secret is not configured")]
    SecretNotConfigured,
    #[error("payload cannot be signed: {0}")]
    Signature(#[from] SignatureError),
    #[error("signature verification failed")]
    VerificationFailed,
}

impl IntoResponse for SignedFormError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            SignedFormError::MissingHeader => (StatusCode::UNAUTHORIZED, "missing Sign header"),
            SignedFormError::InvalidHeader => (StatusCode::BAD_REQUEST, "invalid Sign header"),
            SignedFormError::BodyReadError => {
                (StatusCode::BAD_REQUEST, "failed to read request body")
            }
            SignedFormError::SecretNotConfigured => {
                tracing::error!("Webhook received but no gateway secret is configured");
                (StatusCode::SERVICE_UNAVAILABLE, "payment callbacks unavailable")
            }
            SignedFormError::Signature(e) => {
                tracing::warn!(error = %e, "Webhook payload could not be canonicalized");
                (StatusCode::BAD_REQUEST, "invalid payload")
            }
            SignedFormError::VerificationFailed => {
                (StatusCode::FORBIDDEN, "signature verification failed")
            }
        };
        (status, message).into_response()
    }
}

impl FromRequest<AppState> for SignedForm {
    type Rejection = SignedFormError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let received = req
            .headers()
            .get(SIGNATURE_HEADER)
            .ok_or(SignedFormError::MissingHeader)?
            .to_str()
            .map_err(|_| SignedFormError::InvalidHeader)?
            .to_owned();

        let body_bytes = axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES)
            .await
            .map_err(|_| SignedFormError::BodyReadError)?;
        let body =
            String::from_utf8(body_bytes.to_vec()).map_err(|_| SignedFormError::BodyReadError)?;

        let payload = signature::parse(&body);

        let gateway = state.config.gateway.read().await;
        if !gateway.has_secret() {
            return Err(SignedFormError::SecretNotConfigured);
        }
        let expected = signature::sign(&payload, gateway.secret_bytes())?;
        drop(gateway);

        if expected != received {
            tracing::warn!(%expected, %received, "Webhook signature mismatch");
            return Err(SignedFormError::VerificationFailed);
        }

        Ok(SignedForm(payload))
    }
}
