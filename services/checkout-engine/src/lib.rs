pub mod catalog;
pub mod config;
pub mod database;
pub mod errors;
pub mod guard;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod notifications;
pub mod reconciliation;
pub mod services;

pub use config::Config;
pub use errors::{CheckoutEngineError, Result};
