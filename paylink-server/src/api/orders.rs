use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use super::ApiError;
use crate::state::AppState;

/// `GET /orders/{order_id}` — poll order status.
pub(super) async fn get_order(
    state: State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.store.get(order_id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(record.to_response()))
}
