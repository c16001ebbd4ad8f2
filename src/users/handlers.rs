use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument};

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    payments::dto::PaymentView,
    response::MessageDataResponse,
    state::AppState,
    users::dto::{ProfileResponse, TopUpRequest},
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/topup", post(top_up))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = match state.users.find_by_id(user_id).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            error!(user_id, "user not found");
            return Err(ApiError::Unauthorized);
        }
        Err(e) => {
            error!(error = %e, user_id, "load profile failed");
            return Err(ApiError::Internal("Failed to load profile".into()));
        }
    };
    Ok(Json(ProfileResponse { user: user.into() }))
}

/// Opens a pending top-up. The deposit grows once the provider confirms it.
#[instrument(skip(state, payload))]
pub async fn top_up(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<TopUpRequest>, JsonRejection>,
) -> Result<Json<MessageDataResponse<PaymentView>>, ApiError> {
    let Json(payload) = payload?;
    if payload.amount <= rust_decimal::Decimal::ZERO {
        return Err(ApiError::Validation("Amount must be greater than zero".into()));
    }

    let payment = state
        .payments
        .create_topup(user_id, payload.amount)
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "create topup failed");
            ApiError::Validation("Failed to create top-up".into())
        })?;

    info!(user_id, payment_id = payment.id, amount = %payment.amount, "topup initiated");
    Ok(Json(MessageDataResponse::new("Top-up initiated", payment.into())))
}
