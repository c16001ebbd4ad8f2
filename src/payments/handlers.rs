use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    payments::{
        dto::{PaymentView, WebhookPayload},
        repo_types::PaymentStatus,
    },
    response::MessageResponse,
    state::AppState,
};

pub const CALLBACK_TOKEN_HEADER: &str = "x-callback-token";

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/payments", get(list_payments))
        .route("/payments/webhook", post(webhook))
        .route("/payments/:id", get(get_payment))
}

#[instrument(skip(state))]
pub async fn list_payments(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<PaymentView>>, ApiError> {
    let payments = state.payments.list_by_user(user_id).await.map_err(|e| {
        error!(error = %e, user_id, "list payments failed");
        ApiError::Internal("Failed to fetch payment history".into())
    })?;
    Ok(Json(payments.into_iter().map(PaymentView::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_payment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<PaymentView>, ApiError> {
    let not_found = || ApiError::NotFound("Payment not found".into());
    let id: i64 = id.parse().map_err(|_| not_found())?;
    match state.payments.find_for_user(user_id, id).await {
        Ok(Some(p)) => Ok(Json(p.into())),
        Ok(None) => Err(not_found()),
        Err(e) => {
            error!(error = %e, user_id, id, "get payment failed");
            Err(not_found())
        }
    }
}

fn callback_token_matches(headers: &HeaderMap, expected: Option<&str>) -> bool {
    let Some(expected) = expected else {
        return false;
    };
    headers
        .get(CALLBACK_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|got| got == expected)
}

#[instrument(skip(state, headers, payload))]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<WebhookPayload>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !callback_token_matches(&headers, state.config.webhook_token.as_deref()) {
        warn!("webhook rejected: bad callback token");
        return Err(ApiError::Unauthorized);
    }
    let Json(payload) = payload?;

    let status = PaymentStatus::from_provider(&payload.status).ok_or_else(|| {
        ApiError::Validation(format!("Unknown payment status: {}", payload.status))
    })?;

    let outcome = state
        .payments
        .apply_provider_status(&payload.external_id, status)
        .await
        .map_err(|e| {
            error!(error = %e, external_id = %payload.external_id, "apply webhook failed");
            ApiError::Internal("Failed to process webhook".into())
        })?
        .ok_or_else(|| ApiError::NotFound("Payment not found".into()))?;

    info!(
        payment_id = outcome.payment.id,
        status = ?outcome.payment.status,
        changed = outcome.changed,
        "webhook processed"
    );
    Ok(Json(MessageResponse::new("Webhook processed")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn callback_token_check() {
        let mut headers = HeaderMap::new();
        assert!(!callback_token_matches(&headers, Some("s3cret")));
        headers.insert(CALLBACK_TOKEN_HEADER, HeaderValue::from_static("s3cret"));
        assert!(callback_token_matches(&headers, Some("s3cret")));
        assert!(!callback_token_matches(&headers, Some("other")));
        assert!(!callback_token_matches(&headers, None));
    }
}
