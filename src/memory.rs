//! In-process store with the same transactional guarantees as the
//! PostgreSQL one. Backs tests and local runs without a database.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use crate::{
    auth::{
        repo::{DuplicateEmail, UserRepo},
        repo_types::User,
    },
    cars::{
        repo::CarRepo,
        repo_types::{Car, CarFilter},
    },
    payments::{
        repo::{new_external_id, PaymentRepo},
        repo_types::{Payment, PaymentKind, PaymentStatus, WebhookOutcome},
    },
    rentals::{
        repo::{check_rental_days, total_cost, RentalRepo},
        repo_types::{Rental, RentalError, RentalStatus},
    },
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    cars: Vec<Car>,
    rentals: Vec<Rental>,
    payments: Vec<Payment>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> anyhow::Result<MutexGuard<'_, Tables>> {
        self.inner
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))
    }

    /// Adds a car to the catalogue. Cars have no write endpoint.
    pub fn add_car(
        &self,
        name: &str,
        category: &str,
        stock_availability: i32,
        rental_costs: Decimal,
    ) -> anyhow::Result<Car> {
        let mut t = self.tables()?;
        let now = OffsetDateTime::now_utc();
        let car = Car {
            id: t.next_id(),
            name: name.into(),
            category: category.into(),
            stock_availability,
            rental_costs,
            created_at: now,
            updated_at: now,
        };
        t.cars.push(car.clone());
        Ok(car)
    }

    pub fn car(&self, id: i64) -> anyhow::Result<Option<Car>> {
        Ok(self.tables()?.cars.iter().find(|c| c.id == id).cloned())
    }

    pub fn user(&self, id: i64) -> anyhow::Result<Option<User>> {
        Ok(self.tables()?.users.iter().find(|u| u.id == id).cloned())
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.tables()?.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        self.user(id)
    }

    async fn create(&self, email: &str, password_hash: &str) -> anyhow::Result<User> {
        let mut t = self.tables()?;
        if t.users.iter().any(|u| u.email == email) {
            return Err(DuplicateEmail.into());
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: t.next_id(),
            email: email.into(),
            password_hash: password_hash.into(),
            deposit_amount: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        };
        t.users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl CarRepo for MemoryStore {
    async fn list(&self, filter: &CarFilter) -> anyhow::Result<Vec<Car>> {
        let t = self.tables()?;
        let mut cars: Vec<Car> = t.cars.iter().filter(|c| filter.matches(c)).cloned().collect();
        cars.sort_by_key(|c| c.id);
        Ok(cars)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Car>> {
        self.car(id)
    }
}

#[async_trait]
impl RentalRepo for MemoryStore {
    async fn create(
        &self,
        user_id: i64,
        car_id: i64,
        rental_days: i32,
    ) -> Result<Rental, RentalError> {
        check_rental_days(rental_days)?;
        let now = OffsetDateTime::now_utc();
        let end_date = now
            .checked_add(Duration::days(i64::from(rental_days)))
            .ok_or(RentalError::InvalidPeriod)?;

        let mut t = self.tables()?;
        let car_idx = t
            .cars
            .iter()
            .position(|c| c.id == car_id)
            .ok_or(RentalError::CarNotFound)?;
        if t.cars[car_idx].stock_availability <= 0 {
            return Err(RentalError::OutOfStock);
        }
        let cost = total_cost(t.cars[car_idx].rental_costs, rental_days);

        let user_idx = t
            .users
            .iter()
            .position(|u| u.id == user_id)
            .ok_or(RentalError::InsufficientDeposit)?;
        if t.users[user_idx].deposit_amount < cost {
            return Err(RentalError::InsufficientDeposit);
        }

        t.users[user_idx].deposit_amount -= cost;
        t.users[user_idx].updated_at = now;
        t.cars[car_idx].stock_availability -= 1;
        t.cars[car_idx].updated_at = now;

        let rental = Rental {
            id: t.next_id(),
            user_id,
            car_id,
            rental_days,
            total_cost: cost,
            status: RentalStatus::Active,
            start_date: now,
            end_date,
            returned_at: None,
            created_at: now,
            updated_at: now,
        };
        t.rentals.push(rental.clone());

        let payment = Payment {
            id: t.next_id(),
            user_id,
            rental_id: Some(rental.id),
            kind: PaymentKind::Rental,
            amount: cost,
            status: PaymentStatus::Paid,
            external_id: new_external_id(PaymentKind::Rental),
            created_at: now,
            updated_at: now,
        };
        t.payments.push(payment);

        Ok(rental)
    }

    async fn list_by_user(&self, user_id: i64) -> anyhow::Result<Vec<Rental>> {
        let t = self.tables()?;
        let mut rows: Vec<Rental> = t
            .rentals
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(rows)
    }

    async fn return_car(&self, user_id: i64, rental_id: i64) -> Result<Rental, RentalError> {
        let mut t = self.tables()?;
        let idx = t
            .rentals
            .iter()
            .position(|r| r.id == rental_id && r.user_id == user_id)
            .ok_or(RentalError::NotFound)?;
        if t.rentals[idx].status == RentalStatus::Returned {
            return Err(RentalError::AlreadyReturned);
        }

        let now = OffsetDateTime::now_utc();
        let car_id = t.rentals[idx].car_id;
        {
            let rental = &mut t.rentals[idx];
            rental.status = RentalStatus::Returned;
            rental.returned_at = Some(now);
            rental.updated_at = now;
        }
        if let Some(car) = t.cars.iter_mut().find(|c| c.id == car_id) {
            car.stock_availability += 1;
            car.updated_at = now;
        }
        Ok(t.rentals[idx].clone())
    }
}

#[async_trait]
impl PaymentRepo for MemoryStore {
    async fn create_topup(&self, user_id: i64, amount: Decimal) -> anyhow::Result<Payment> {
        let mut t = self.tables()?;
        let now = OffsetDateTime::now_utc();
        let payment = Payment {
            id: t.next_id(),
            user_id,
            rental_id: None,
            kind: PaymentKind::Topup,
            amount,
            status: PaymentStatus::Pending,
            external_id: new_external_id(PaymentKind::Topup),
            created_at: now,
            updated_at: now,
        };
        t.payments.push(payment.clone());
        Ok(payment)
    }

    async fn list_by_user(&self, user_id: i64) -> anyhow::Result<Vec<Payment>> {
        let t = self.tables()?;
        let mut rows: Vec<Payment> = t
            .payments
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(rows)
    }

    async fn find_for_user(&self, user_id: i64, id: i64) -> anyhow::Result<Option<Payment>> {
        Ok(self
            .tables()?
            .payments
            .iter()
            .find(|p| p.id == id && p.user_id == user_id)
            .cloned())
    }

    async fn apply_provider_status(
        &self,
        external_id: &str,
        status: PaymentStatus,
    ) -> anyhow::Result<Option<WebhookOutcome>> {
        let mut t = self.tables()?;
        let Some(idx) = t.payments.iter().position(|p| p.external_id == external_id) else {
            return Ok(None);
        };

        if t.payments[idx].status != PaymentStatus::Pending || status == PaymentStatus::Pending {
            return Ok(Some(WebhookOutcome {
                payment: t.payments[idx].clone(),
                changed: false,
            }));
        }

        let now = OffsetDateTime::now_utc();
        t.payments[idx].status = status;
        t.payments[idx].updated_at = now;
        let payment = t.payments[idx].clone();

        if payment.status == PaymentStatus::Paid && payment.kind == PaymentKind::Topup {
            if let Some(user) = t.users.iter_mut().find(|u| u.id == payment.user_id) {
                user.deposit_amount += payment.amount;
                user.updated_at = now;
            }
        }

        Ok(Some(WebhookOutcome {
            payment,
            changed: true,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn funded_user(store: &MemoryStore, deposit: i64) -> User {
        let user = UserRepo::create(store, "a@b.com", "hash").await.unwrap();
        let topup = store.create_topup(user.id, Decimal::from(deposit)).await.unwrap();
        store
            .apply_provider_status(&topup.external_id, PaymentStatus::Paid)
            .await
            .unwrap();
        store.user(user.id).unwrap().unwrap()
    }

    #[tokio::test]
    async fn unique_email() {
        let store = MemoryStore::new();
        UserRepo::create(&store, "a@b.com", "h").await.unwrap();
        let err = UserRepo::create(&store, "a@b.com", "h").await.unwrap_err();
        assert!(err.is::<DuplicateEmail>());
    }

    #[tokio::test]
    async fn car_filters() {
        let store = MemoryStore::new();
        store.add_car("Avanza", "MPV", 2, Decimal::from(300)).unwrap();
        store.add_car("Jazz", "Hatchback", 0, Decimal::from(250)).unwrap();
        store.add_car("Xenia", "MPV", 0, Decimal::from(280)).unwrap();

        let all = store.list(&CarFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let available = store
            .list(&CarFilter { category: None, available_only: true })
            .await
            .unwrap();
        assert_eq!(available.len(), 1);
        assert!(available.iter().all(|c| c.stock_availability > 0));

        let mpv = store
            .list(&CarFilter { category: Some("MPV".into()), available_only: false })
            .await
            .unwrap();
        assert_eq!(mpv.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), ["Avanza", "Xenia"]);
    }

    #[tokio::test]
    async fn topup_credits_only_once() {
        let store = MemoryStore::new();
        let user = funded_user(&store, 500).await;
        assert_eq!(user.deposit_amount, Decimal::from(500));

        let payments = PaymentRepo::list_by_user(&store, user.id).await.unwrap();
        let again = store
            .apply_provider_status(&payments[0].external_id, PaymentStatus::Paid)
            .await
            .unwrap()
            .unwrap();
        assert!(!again.changed);
        assert_eq!(store.user(user.id).unwrap().unwrap().deposit_amount, Decimal::from(500));
    }

    #[tokio::test]
    async fn failed_topup_does_not_credit() {
        let store = MemoryStore::new();
        let user = UserRepo::create(&store, "a@b.com", "h").await.unwrap();
        let topup = store.create_topup(user.id, Decimal::from(100)).await.unwrap();
        let out = store
            .apply_provider_status(&topup.external_id, PaymentStatus::Failed)
            .await
            .unwrap()
            .unwrap();
        assert!(out.changed);
        assert_eq!(out.payment.status, PaymentStatus::Failed);
        assert_eq!(store.user(user.id).unwrap().unwrap().deposit_amount, Decimal::ZERO);
    }

    #[tokio::test]
    async fn unknown_external_id() {
        let store = MemoryStore::new();
        assert!(store
            .apply_provider_status("topup-missing", PaymentStatus::Paid)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn rental_lifecycle() {
        let store = MemoryStore::new();
        let user = funded_user(&store, 1000).await;
        let car = store.add_car("Avanza", "MPV", 1, Decimal::from(300)).unwrap();

        let rental = RentalRepo::create(&store, user.id, car.id, 2).await.unwrap();
        assert_eq!(rental.total_cost, Decimal::from(600));
        assert_eq!(rental.status, RentalStatus::Active);
        assert_eq!(store.car(car.id).unwrap().unwrap().stock_availability, 0);
        assert_eq!(store.user(user.id).unwrap().unwrap().deposit_amount, Decimal::from(400));

        let payments = PaymentRepo::list_by_user(&store, user.id).await.unwrap();
        assert!(payments
            .iter()
            .any(|p| p.kind == PaymentKind::Rental && p.rental_id == Some(rental.id)));

        assert!(matches!(
            RentalRepo::create(&store, user.id, car.id, 1).await,
            Err(RentalError::OutOfStock)
        ));

        let returned = store.return_car(user.id, rental.id).await.unwrap();
        assert_eq!(returned.status, RentalStatus::Returned);
        assert!(returned.returned_at.is_some());
        assert_eq!(store.car(car.id).unwrap().unwrap().stock_availability, 1);

        assert!(matches!(
            store.return_car(user.id, rental.id).await,
            Err(RentalError::AlreadyReturned)
        ));
    }

    #[tokio::test]
    async fn rental_rejections_leave_state_untouched() {
        let store = MemoryStore::new();
        let user = funded_user(&store, 100).await;
        let car = store.add_car("Fortuner", "SUV", 3, Decimal::from(700)).unwrap();

        assert!(matches!(
            RentalRepo::create(&store, user.id, car.id, 1).await,
            Err(RentalError::InsufficientDeposit)
        ));
        assert!(matches!(
            RentalRepo::create(&store, user.id, 9999, 1).await,
            Err(RentalError::CarNotFound)
        ));
        assert_eq!(store.car(car.id).unwrap().unwrap().stock_availability, 3);
        assert_eq!(store.user(user.id).unwrap().unwrap().deposit_amount, Decimal::from(100));
    }

    #[tokio::test]
    async fn oversized_rental_period_is_rejected_and_store_stays_usable() {
        let store = MemoryStore::new();
        let user = funded_user(&store, 10_000_000_000).await;
        let car = store.add_car("Avanza", "MPV", 1, Decimal::from(1)).unwrap();

        assert!(matches!(
            RentalRepo::create(&store, user.id, car.id, 1_000_000_000).await,
            Err(RentalError::InvalidPeriod)
        ));
        assert_eq!(store.car(car.id).unwrap().unwrap().stock_availability, 1);

        let rental = RentalRepo::create(&store, user.id, car.id, 365).await.unwrap();
        assert_eq!(rental.end_date - rental.start_date, Duration::days(365));
    }

    #[tokio::test]
    async fn cannot_return_someone_elses_rental() {
        let store = MemoryStore::new();
        let owner = funded_user(&store, 1000).await;
        let other = UserRepo::create(&store, "c@d.com", "h").await.unwrap();
        let car = store.add_car("Avanza", "MPV", 1, Decimal::from(300)).unwrap();
        let rental = RentalRepo::create(&store, owner.id, car.id, 1).await.unwrap();

        assert!(matches!(
            store.return_car(other.id, rental.id).await,
            Err(RentalError::NotFound)
        ));
    }
}
