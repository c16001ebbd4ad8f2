use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cars::repo_types::{Car, CarFilter};
use crate::timefmt::format_timestamp;

/// Raw query string of `GET /cars`.
#[derive(Debug, Default, Deserialize)]
pub struct CarListQuery {
    pub category: Option<String>,
    pub available: Option<String>,
}

impl From<CarListQuery> for CarFilter {
    fn from(q: CarListQuery) -> Self {
        Self {
            category: q.category.filter(|c| !c.is_empty()),
            available_only: q.available.as_deref() == Some("true"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CarView {
    pub id: i64,
    pub name: String,
    pub stock_availability: i32,
    pub rental_costs: Decimal,
    pub category: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Car> for CarView {
    fn from(c: Car) -> Self {
        Self {
            id: c.id,
            name: c.name,
            stock_availability: c.stock_availability,
            rental_costs: c.rental_costs,
            category: c.category,
            created_at: format_timestamp(c.created_at),
            updated_at: format_timestamp(c.updated_at),
        }
    }
}
