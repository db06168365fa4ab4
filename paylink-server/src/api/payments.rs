//! Gateway callbacks: the server-to-server notification and the buyer's
//! return redirect.

use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use paylink_core::outcome::{OutcomeError, apply_notification, apply_status};
use paylink_sdk::objects::{PaymentNotification, PaymentStatus};
use paylink_sdk::redirect::{ReturnParams, ReturnVerification, verify_return};

use super::ApiError;
use crate::api::extractors::SignedForm;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// POST /payments/webhook
// ---------------------------------------------------------------------------

/// `POST /payments/webhook` — payment notification from the gateway.
///
/// The body has already been verified against the `Sign` header by
/// [`SignedForm`].
pub(super) async fn payment_webhook(
    state: State<AppState>,
    SignedForm(payload): SignedForm,
) -> Result<impl IntoResponse, ApiError> {
    let notification: PaymentNotification =
        serde_json::from_value(payload).map_err(ApiError::InvalidNotification)?;
    tracing::info!(
        order_id = %notification.order_id,
        status = %notification.payment_status,
        sum = %notification.sum,
        "Verified payment notification"
    );

    apply_notification(state.store.as_ref(), &notification).await?;
    Ok((StatusCode::OK, "OK"))
}

// ---------------------------------------------------------------------------
// GET /payments/return
// ---------------------------------------------------------------------------

/// `GET /payments/return` — the buyer's browser coming back from the
/// gateway.
///
/// A verified successful redirect marks the order paid and sends the buyer
/// to the success page. Anything verified but not successful goes to the
/// failure page. Unverifiable redirects get a 403.
pub(super) async fn payment_return(
    state: State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let query = query.unwrap_or_default();

    let gateway = state.config.gateway.read().await;
    if !gateway.has_secret() {
        return Err(ApiError::SecretNotConfigured);
    }
    let verification = verify_return(&query, gateway.secret_bytes())?;
    drop(gateway);

    let params = match verification {
        ReturnVerification::Verified { scope, params } => {
            tracing::debug!(?scope, "Return redirect verified");
            params
        }
        ReturnVerification::MissingSignature => {
            tracing::warn!("Return redirect without signature");
            return Err(ApiError::Forbidden);
        }
        ReturnVerification::Rejected {
            received,
            primary,
            fallback,
        } => {
            tracing::warn!(
                %received,
                expected_all = %primary,
                expected_namespaced = %fallback,
                "Return redirect signature mismatch"
            );
            return Err(ApiError::Forbidden);
        }
    };

    let site = state.config.site.read().await.clone();
    if settle_return(&state, &params).await {
        Ok(Redirect::to(site.success_page.as_str()).into_response())
    } else {
        Ok(Redirect::to(site.failure_page.as_str()).into_response())
    }
}

/// Apply a verified redirect. Returns whether the buyer should see the
/// success page.
async fn settle_return(state: &AppState, params: &ReturnParams) -> bool {
    if !params.is_success() {
        tracing::info!(
            order_id = ?params.order_id,
            status = ?params.status,
            "Return redirect reports an unsuccessful payment"
        );
        return false;
    }
    let Some(order_id) = params.order_id.as_deref() else {
        tracing::warn!("Successful return redirect without an order id");
        return false;
    };

    match apply_status(state.store.as_ref(), order_id, PaymentStatus::Success, None).await {
        Ok(_) => true,
        Err(OutcomeError::UnknownOrder(id)) => {
            tracing::warn!(order_id = %id, "Return redirect for unknown order");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::server::build_router;
    use crate::state::AppState;
    use crate::state::testing::{FAILURE_PAGE, SECRET, SUCCESS_PAGE, test_state};
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
        response::Response,
    };
    use paylink_core::entities::{NewOrder, OrderRecord, OrderStatus};
    use paylink_sdk::objects::Product;
    use paylink_sdk::signature::{SIGNATURE_HEADER, parse, sign};
    use rust_decimal::Decimal;
    use tower::ServiceExt;

    // HMAC-SHA256 ("test-secret") of the parsed `GOLDEN_BODY`.
    const GOLDEN_SIGN: &str = "6b38d7736bcf57acd2ac56ddfa50733e6d4cf0ee3b813c95154573de3ad3d77d";
    const GOLDEN_BODY: &str = "order_id=42&order_num=42&date=2026-01-15T12%3A00%3A00%2B03%3A00\
                               &sum=3481.00&payment_status=success\
                               &customer_email=buyer%40example.com\
                               &products%5B0%5D%5Bname%5D=Book\
                               &products%5B0%5D%5Bprice%5D=990.50\
                               &products%5B0%5D%5Bquantity%5D=2\
                               &products%5B0%5D%5Bsum%5D=1981.00";

    async fn pending_order(state: &AppState) -> OrderRecord {
        state
            .store
            .insert(NewOrder {
                products: vec![Product {
                    name: "Book".to_owned(),
                    price: Decimal::new(99050, 2),
                    quantity: 2,
                    sku: None,
                }],
                customer_email: Some("buyer@example.com".to_owned()),
                customer_phone: None,
                paid_content: None,
            })
            .await
            .unwrap()
    }

    async fn status_of(state: &AppState, order: &OrderRecord) -> OrderStatus {
        state.store.get(order.order_id).await.unwrap().unwrap().status
    }

    fn webhook(body: &str, sign: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/payments/webhook")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(sign) = sign {
            builder = builder.header(SIGNATURE_HEADER, sign);
        }
        builder.body(Body::from(body.to_owned())).unwrap()
    }

    fn return_request(query: &str) -> Request<Body> {
        Request::builder()
            .uri(format!("/payments/return?{query}"))
            .body(Body::empty())
            .unwrap()
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    fn signed_query(params: &[(&str, &str)], signed: &[&str]) -> String {
        let covered: serde_json::Map<String, serde_json::Value> = params
            .iter()
            .filter(|(key, _)| signed.contains(key))
            .map(|(key, value)| ((*key).to_owned(), serde_json::json!(value)))
            .collect();
        let signature = sign(&covered, SECRET).unwrap();
        let mut query: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        query.push(format!("_payform_sign={signature}"));
        query.join("&")
    }

    #[tokio::test]
    async fn test_webhook_marks_order_paid() {
        let state = test_state();
        let order = pending_order(&state).await;
        let body = format!(
            "order_id={}&sum=1981.00&payment_status=success&customer_email=buyer%40example.com",
            order.order_id
        );
        let signature = sign(&parse(&body), SECRET).unwrap();

        let response = build_router(state.clone())
            .oneshot(webhook(&body, Some(&signature)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let record = state.store.get(order.order_id).await.unwrap().unwrap();
        assert_eq!(record.status, OrderStatus::Paid);
        assert_eq!(record.paid_sum, Some(Decimal::new(198100, 2)));
    }

    #[tokio::test]
    async fn test_webhook_golden_signature_for_unknown_order() {
        let response = build_router(test_state())
            .oneshot(webhook(GOLDEN_BODY, Some(GOLDEN_SIGN)))
            .await
            .unwrap();
        // Signature accepted; order 42 does not exist here.
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_webhook_rejects_tampered_body() {
        let tampered = GOLDEN_BODY.replace("sum=3481.00", "sum=1.00");
        let response = build_router(test_state())
            .oneshot(webhook(&tampered, Some(GOLDEN_SIGN)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_webhook_signature_is_case_sensitive() {
        let response = build_router(test_state())
            .oneshot(webhook(GOLDEN_BODY, Some(&GOLDEN_SIGN.to_uppercase())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_webhook_requires_sign_header() {
        let response = build_router(test_state())
            .oneshot(webhook(GOLDEN_BODY, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_return_signed_over_all_params() {
        let state = test_state();
        let order = pending_order(&state).await;
        let order_id = order.order_id.to_string();
        let params = [
            ("_payform_status", "success"),
            ("_payform_id", "123"),
            ("_payform_order_id", order_id.as_str()),
            ("utm_source", "mail"),
        ];
        let all: Vec<&str> = params.iter().map(|(key, _)| *key).collect();
        let query = signed_query(&params, &all);

        let response = build_router(state.clone())
            .oneshot(return_request(&query))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), SUCCESS_PAGE);
        assert_eq!(status_of(&state, &order).await, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_return_signed_over_namespaced_params() {
        let state = test_state();
        let order = pending_order(&state).await;
        let order_id = order.order_id.to_string();
        let params = [
            ("_payform_status", "success"),
            ("_payform_id", "123"),
            ("_payform_order_id", order_id.as_str()),
            ("utm_source", "mail"),
        ];
        let query = signed_query(
            &params,
            &["_payform_status", "_payform_id", "_payform_order_id"],
        );

        let response = build_router(state.clone())
            .oneshot(return_request(&query))
            .await
            .unwrap();
        assert_eq!(location(&response), SUCCESS_PAGE);
        assert_eq!(status_of(&state, &order).await, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_return_unsuccessful_status_goes_to_failure_page() {
        let state = test_state();
        let order = pending_order(&state).await;
        let order_id = order.order_id.to_string();
        let params = [
            ("_payform_status", "fail"),
            ("_payform_order_id", order_id.as_str()),
        ];
        let query = signed_query(&params, &["_payform_status", "_payform_order_id"]);

        let response = build_router(state.clone())
            .oneshot(return_request(&query))
            .await
            .unwrap();
        assert_eq!(location(&response), FAILURE_PAGE);
        assert_eq!(status_of(&state, &order).await, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_return_for_unknown_order_goes_to_failure_page() {
        // Signed over all params, see the redirect module's vectors.
        let query = "_payform_status=success&_payform_id=123&_payform_order_id=42&extra=x\
                     &_payform_sign=27389b4d913af2c0d48f29a4d28db614680d715982740c632405cae0906c01c5";
        let response = build_router(test_state())
            .oneshot(return_request(query))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), FAILURE_PAGE);
    }

    #[tokio::test]
    async fn test_return_with_bad_signature_is_forbidden() {
        let state = test_state();
        let order = pending_order(&state).await;
        let query = format!(
            "_payform_status=success&_payform_order_id={}&_payform_sign=deadbeef",
            order.order_id
        );
        let response = build_router(state.clone())
            .oneshot(return_request(&query))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(status_of(&state, &order).await, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_return_without_signature_is_forbidden() {
        let response = build_router(test_state())
            .oneshot(return_request("_payform_status=success&_payform_order_id=42"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
