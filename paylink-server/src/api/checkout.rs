use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use paylink_core::entities::{NewOrder, OrderRecord, OrderStatus};
use paylink_sdk::link::build_payment_url;
use paylink_sdk::objects::checkout::CheckoutRequest;
use paylink_sdk::objects::{LinkAction, PaymentLinkRequest};
use url::Url;
use uuid::Uuid;

use super::ApiError;
use crate::state::AppState;

/// Path the gateway sends the buyer's browser back to.
pub(super) const RETURN_PATH: &str = "payments/return";
/// Path the gateway posts notifications to.
pub(super) const WEBHOOK_PATH: &str = "payments/webhook";

// ---------------------------------------------------------------------------
// POST /checkout
// ---------------------------------------------------------------------------

/// `POST /checkout` — create a pending order and redirect to the gateway.
pub(super) async fn checkout(
    state: State<AppState>,
    Json(body): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.products.is_empty() {
        return Err(ApiError::EmptyCart);
    }

    let record = state
        .store
        .insert(NewOrder {
            products: body.products,
            customer_email: body.customer_email,
            customer_phone: body.customer_phone,
            paid_content: body.paid_content,
        })
        .await?;
    tracing::info!(
        order_id = %record.order_id,
        expected_sum = %record.expected_sum,
        "Order created"
    );

    let url = payment_url(&state, &record).await?;
    Ok(Redirect::to(url.as_str()))
}

// ---------------------------------------------------------------------------
// GET /orders/{order_id}/pay
// ---------------------------------------------------------------------------

/// `GET /orders/{order_id}/pay` — rebuild the gateway link for a pending
/// order.
pub(super) async fn pay_again(
    state: State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.store.get(order_id).await?.ok_or(ApiError::NotFound)?;
    if record.status != OrderStatus::Pending {
        return Err(ApiError::OrderNotPending);
    }
    let url = payment_url(&state, &record).await?;
    Ok(Redirect::to(url.as_str()))
}

/// Build the signed gateway URL for `record`.
async fn payment_url(state: &AppState, record: &OrderRecord) -> Result<Url, ApiError> {
    let server = state.config.server.read().await;
    let url_return = server.public_endpoint(RETURN_PATH)?.to_string();
    let url_notification = server.public_endpoint(WEBHOOK_PATH)?.to_string();
    drop(server);

    let gateway = state.config.gateway.read().await;
    if !gateway.has_secret() {
        return Err(ApiError::SecretNotConfigured);
    }
    let request = PaymentLinkRequest {
        action: LinkAction::Pay,
        order_id: record.order_id.to_string(),
        customer_email: record.customer_email.clone(),
        customer_phone: record.customer_phone.clone(),
        products: record.products.clone(),
        url_success: Some(url_return.clone()),
        url_return: Some(url_return),
        url_notification: Some(url_notification),
        paid_content: record.paid_content.clone(),
        sys: gateway.sys.clone(),
    };
    let url = build_payment_url(&gateway.base_url, &request, gateway.secret_bytes())?;
    Ok(url)
}
