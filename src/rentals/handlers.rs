use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    rentals::{
        dto::{CreateRentalRequest, RentalView},
        repo::check_rental_days,
        repo_types::RentalError,
    },
    response::{MessageDataResponse, MessageResponse},
    state::AppState,
};

pub fn rental_routes() -> Router<AppState> {
    Router::new()
        .route("/rentals", post(create_rental).get(list_rentals))
        .route("/rentals/:id/return", post(return_car))
}

/// Every rental failure is a client error except a broken store.
fn rental_error(e: RentalError) -> ApiError {
    match e {
        RentalError::Store(e) => {
            error!(error = %e, "rental store failure");
            ApiError::Internal("Failed to process rental".into())
        }
        other => {
            warn!(reason = %other, "rental rejected");
            ApiError::Validation(other.to_string())
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn create_rental(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<CreateRentalRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageDataResponse<RentalView>>), ApiError> {
    let Json(payload) = payload?;
    check_rental_days(payload.rental_days).map_err(rental_error)?;

    let rental = state
        .rentals
        .create(user_id, payload.car_id, payload.rental_days)
        .await
        .map_err(rental_error)?;

    info!(rental_id = rental.id, user_id, car_id = rental.car_id, "rental created");
    Ok((
        StatusCode::CREATED,
        Json(MessageDataResponse::new("Rental created", rental.into())),
    ))
}

#[instrument(skip(state))]
pub async fn list_rentals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<RentalView>>, ApiError> {
    let rentals = state.rentals.list_by_user(user_id).await.map_err(|e| {
        error!(error = %e, user_id, "list rentals failed");
        ApiError::Internal("Failed to fetch rentals".into())
    })?;
    Ok(Json(rentals.into_iter().map(RentalView::from).collect()))
}

#[instrument(skip(state))]
pub async fn return_car(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id: i64 = id
        .parse()
        .map_err(|_| ApiError::Validation("Invalid rental id".into()))?;

    let rental = state
        .rentals
        .return_car(user_id, id)
        .await
        .map_err(rental_error)?;

    info!(rental_id = rental.id, user_id, "rental completed");
    Ok(Json(MessageResponse::new("Rental completed")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_failures_are_bad_requests() {
        for e in [
            RentalError::CarNotFound,
            RentalError::OutOfStock,
            RentalError::InsufficientDeposit,
            RentalError::NotFound,
            RentalError::AlreadyReturned,
            RentalError::InvalidPeriod,
        ] {
            let msg = e.to_string();
            let api = rental_error(e);
            assert_eq!(api.status(), StatusCode::BAD_REQUEST);
            assert_eq!(api.to_string(), msg);
        }
    }

    #[test]
    fn store_failure_is_internal() {
        let api = rental_error(RentalError::Store(anyhow::anyhow!("connection reset")));
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.to_string().contains("connection reset"));
    }
}
