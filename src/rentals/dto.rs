use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rentals::repo_types::{Rental, RentalStatus};
use crate::timefmt::{format_optional, format_timestamp};

fn default_days() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct CreateRentalRequest {
    pub car_id: i64,
    #[serde(default = "default_days")]
    pub rental_days: i32,
}

#[derive(Debug, Serialize)]
pub struct RentalView {
    pub id: i64,
    pub car_id: i64,
    pub rental_days: i32,
    pub total_cost: Decimal,
    pub status: RentalStatus,
    pub start_date: String,
    pub end_date: String,
    pub returned_at: Option<String>,
    pub created_at: String,
}

impl From<Rental> for RentalView {
    fn from(r: Rental) -> Self {
        Self {
            id: r.id,
            car_id: r.car_id,
            rental_days: r.rental_days,
            total_cost: r.total_cost,
            status: r.status,
            start_date: format_timestamp(r.start_date),
            end_date: format_timestamp(r.end_date),
            returned_at: format_optional(r.returned_at),
            created_at: format_timestamp(r.created_at),
        }
    }
}
