use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::{error, instrument};

use crate::{
    cars::{
        dto::{CarListQuery, CarView},
        repo_types::CarFilter,
    },
    error::ApiError,
    response::DataResponse,
    state::AppState,
};

pub fn car_routes() -> Router<AppState> {
    Router::new()
        .route("/cars", get(list_cars))
        .route("/cars/:id", get(get_car))
}

#[instrument(skip(state))]
pub async fn list_cars(
    State(state): State<AppState>,
    query: Result<Query<CarListQuery>, QueryRejection>,
) -> Result<Json<DataResponse<Vec<CarView>>>, ApiError> {
    let Query(query) = query?;
    let filter = CarFilter::from(query);
    let cars = state.cars.list(&filter).await.map_err(|e| {
        error!(error = %e, ?filter, "list cars failed");
        ApiError::Internal("Failed to fetch cars".into())
    })?;
    Ok(Json(DataResponse::new(
        cars.into_iter().map(CarView::from).collect(),
    )))
}

#[instrument(skip(state))]
pub async fn get_car(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<CarView>>, ApiError> {
    let not_found = || ApiError::NotFound("Car not found".into());
    let id: i64 = id.parse().map_err(|_| not_found())?;
    match state.cars.find_by_id(id).await {
        Ok(Some(car)) => Ok(Json(DataResponse::new(car.into()))),
        Ok(None) => Err(not_found()),
        Err(e) => {
            error!(error = %e, id, "get car failed");
            Err(not_found())
        }
    }
}
