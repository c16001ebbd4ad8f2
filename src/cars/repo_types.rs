use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Car {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub stock_availability: i32,
    pub rental_costs: Decimal, // per day
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Store-level filter for car listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarFilter {
    pub category: Option<String>,
    pub available_only: bool,
}

impl CarFilter {
    pub fn matches(&self, car: &Car) -> bool {
        if let Some(category) = &self.category {
            if &car.category != category {
                return false;
            }
        }
        !self.available_only || car.stock_availability > 0
    }
}
