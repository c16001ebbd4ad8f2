use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "rental_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RentalStatus {
    Active,
    Returned,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Rental {
    pub id: i64,
    pub user_id: i64,
    pub car_id: i64,
    pub rental_days: i32,
    pub total_cost: Decimal,
    pub status: RentalStatus,
    pub start_date: OffsetDateTime,
    pub end_date: OffsetDateTime,
    pub returned_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Why a rental could not be opened or closed.
#[derive(Debug, thiserror::Error)]
pub enum RentalError {
    #[error("Car not found")]
    CarNotFound,
    #[error("Car is not available")]
    OutOfStock,
    #[error("Insufficient deposit")]
    InsufficientDeposit,
    #[error("Rental not found")]
    NotFound,
    #[error("Rental already returned")]
    AlreadyReturned,
    #[error("rental_days must be between 1 and 365")]
    InvalidPeriod,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<sqlx::Error> for RentalError {
    fn from(e: sqlx::Error) -> Self {
        RentalError::Store(e.into())
    }
}
