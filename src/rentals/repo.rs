use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::cars::repo_types::Car;
use crate::db::PgStore;
use crate::payments::repo::new_external_id;
use crate::payments::repo_types::PaymentKind;
use crate::rentals::repo_types::{Rental, RentalError, RentalStatus};

#[async_trait]
pub trait RentalRepo: Send + Sync {
    /// Opens a rental in one transaction: takes one unit of stock, debits
    /// `rental_costs * rental_days` from the deposit and records the payment.
    async fn create(&self, user_id: i64, car_id: i64, rental_days: i32)
        -> Result<Rental, RentalError>;
    /// Newest first.
    async fn list_by_user(&self, user_id: i64) -> anyhow::Result<Vec<Rental>>;
    /// Closes an active rental of `user_id` and puts the car back in stock.
    async fn return_car(&self, user_id: i64, rental_id: i64) -> Result<Rental, RentalError>;
}

/// Longest rental a single booking may cover.
pub const MAX_RENTAL_DAYS: i32 = 365;

pub fn total_cost(daily: Decimal, rental_days: i32) -> Decimal {
    daily * Decimal::from(rental_days)
}

pub fn check_rental_days(rental_days: i32) -> Result<(), RentalError> {
    if (1..=MAX_RENTAL_DAYS).contains(&rental_days) {
        Ok(())
    } else {
        Err(RentalError::InvalidPeriod)
    }
}

const RENTAL_COLUMNS: &str = "id, user_id, car_id, rental_days, total_cost, status, start_date, \
     end_date, returned_at, created_at, updated_at";

#[async_trait]
impl RentalRepo for PgStore {
    async fn create(
        &self,
        user_id: i64,
        car_id: i64,
        rental_days: i32,
    ) -> Result<Rental, RentalError> {
        check_rental_days(rental_days)?;
        let mut tx = self.db.begin().await?;

        let car = sqlx::query_as::<_, Car>(
            r#"
            SELECT id, name, category, stock_availability, rental_costs, created_at, updated_at
              FROM cars
             WHERE id = $1
               FOR UPDATE
            "#,
        )
        .bind(car_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RentalError::CarNotFound)?;

        if car.stock_availability <= 0 {
            return Err(RentalError::OutOfStock);
        }

        let cost = total_cost(car.rental_costs, rental_days);

        let debited = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE users
               SET deposit_amount = deposit_amount - $2, updated_at = now()
             WHERE id = $1 AND deposit_amount >= $2
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(cost)
        .fetch_optional(&mut *tx)
        .await?;
        if debited.is_none() {
            return Err(RentalError::InsufficientDeposit);
        }

        sqlx::query(
            r#"
            UPDATE cars
               SET stock_availability = stock_availability - 1, updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(car_id)
        .execute(&mut *tx)
        .await?;

        let rental = sqlx::query_as::<_, Rental>(&format!(
            r#"
            INSERT INTO rentals (user_id, car_id, rental_days, total_cost, status, start_date, end_date)
            VALUES ($1, $2, $3, $4, 'active', now(), now() + make_interval(days => $3))
            RETURNING {RENTAL_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(car_id)
        .bind(rental_days)
        .bind(cost)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO payments (user_id, rental_id, kind, amount, status, external_id)
            VALUES ($1, $2, 'rental', $3, 'paid', $4)
            "#,
        )
        .bind(user_id)
        .bind(rental.id)
        .bind(cost)
        .bind(new_external_id(PaymentKind::Rental))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(rental)
    }

    async fn list_by_user(&self, user_id: i64) -> anyhow::Result<Vec<Rental>> {
        let rows = sqlx::query_as::<_, Rental>(&format!(
            r#"
            SELECT {RENTAL_COLUMNS}
              FROM rentals
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn return_car(&self, user_id: i64, rental_id: i64) -> Result<Rental, RentalError> {
        let mut tx = self.db.begin().await?;

        let current = sqlx::query_as::<_, Rental>(&format!(
            "SELECT {RENTAL_COLUMNS} FROM rentals WHERE id = $1 AND user_id = $2 FOR UPDATE"
        ))
        .bind(rental_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RentalError::NotFound)?;

        if current.status == RentalStatus::Returned {
            return Err(RentalError::AlreadyReturned);
        }

        let rental = sqlx::query_as::<_, Rental>(&format!(
            r#"
            UPDATE rentals
               SET status = 'returned', returned_at = now(), updated_at = now()
             WHERE id = $1
            RETURNING {RENTAL_COLUMNS}
            "#
        ))
        .bind(rental_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE cars
               SET stock_availability = stock_availability + 1, updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(current.car_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(rental)
    }
}
