pub mod app;
pub mod auth;
pub mod cars;
pub mod config;
pub mod db;
pub mod error;
pub mod memory;
pub mod notify;
pub mod payments;
pub mod rentals;
pub mod response;
pub mod state;
pub mod timefmt;
pub mod users;
