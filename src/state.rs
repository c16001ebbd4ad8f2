use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::{jwt::JwtKeys, repo::UserRepo};
use crate::cars::repo::CarRepo;
use crate::config::AppConfig;
use crate::db::PgStore;
use crate::memory::MemoryStore;
use crate::notify::{LogNotifier, Notifier};
use crate::payments::repo::PaymentRepo;
use crate::rentals::repo::RentalRepo;

/// Everything a handler may touch. Built once at startup and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
    pub users: Arc<dyn UserRepo>,
    pub cars: Arc<dyn CarRepo>,
    pub rentals: Arc<dyn RentalRepo>,
    pub payments: Arc<dyn PaymentRepo>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn from_pg(config: Arc<AppConfig>, db: PgPool) -> Self {
        let store = PgStore::new(db);
        let notifier = Arc::new(LogNotifier::new(config.notify_from.clone())) as Arc<dyn Notifier>;
        Self {
            jwt: JwtKeys::from_config(&config.jwt),
            users: Arc::new(store.clone()),
            cars: Arc::new(store.clone()),
            rentals: Arc::new(store.clone()),
            payments: Arc::new(store),
            notifier,
            config,
        }
    }

    pub fn from_memory(
        config: Arc<AppConfig>,
        store: MemoryStore,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            jwt: JwtKeys::from_config(&config.jwt),
            users: Arc::new(store.clone()),
            cars: Arc::new(store.clone()),
            rentals: Arc::new(store.clone()),
            payments: Arc::new(store),
            notifier,
            config,
        }
    }

    /// Fresh in-memory state with test configuration.
    pub fn in_memory() -> Self {
        let config = Arc::new(AppConfig::for_tests());
        let notifier = Arc::new(LogNotifier::new(config.notify_from.clone()));
        Self::from_memory(config, MemoryStore::new(), notifier)
    }
}
