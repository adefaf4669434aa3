use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub nats: NatsConfig,
    pub storefront: StorefrontConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    /// How long a writer waits on SQLite's write lock before giving up.
    pub busy_timeout_ms: u64,
}

impl DatabaseConfig {
    /// Settings for a database file at `path`, used by tools and tests.
    pub fn for_path(path: &std::path::Path) -> Self {
        DatabaseConfig {
            url: format!("sqlite://{}", path.display()),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_secs: 5,
            busy_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NatsConfig {
    pub enabled: bool,
    pub url: String,
    pub topic_prefix: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorefrontConfig {
    pub shipping_fee: String,
    pub welcome_balance: String,
    pub min_topup: String,
    pub max_topup: String,
    pub checkout_timeout_ms: u64,
    pub idempotency_retention_secs: u64,
    pub history_limit: u32,
    pub seed_catalog: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

/// Typed view of [`StorefrontConfig`] consumed by the services.
#[derive(Debug, Clone)]
pub struct StorefrontSettings {
    pub shipping_fee: Decimal,
    pub welcome_balance: Decimal,
    pub min_topup: Decimal,
    pub max_topup: Decimal,
    pub checkout_timeout: Duration,
    pub idempotency_retention: Duration,
    pub history_limit: u32,
}

impl Default for StorefrontSettings {
    fn default() -> Self {
        StorefrontSettings {
            shipping_fee: Decimal::new(500, 0),
            welcome_balance: Decimal::new(5000, 0),
            min_topup: Decimal::new(100, 0),
            max_topup: Decimal::new(1_000_000, 0),
            checkout_timeout: Duration::from_secs(10),
            idempotency_retention: Duration::from_secs(24 * 3600),
            history_limit: 50,
        }
    }
}

impl StorefrontConfig {
    pub fn settings(&self) -> Result<StorefrontSettings, String> {
        let parse = |field: &str, value: &str| {
            Decimal::from_str(value)
                .map_err(|e| format!("storefront.{} is not a decimal ({}): {}", field, value, e))
        };

        Ok(StorefrontSettings {
            shipping_fee: parse("shipping_fee", &self.shipping_fee)?,
            welcome_balance: parse("welcome_balance", &self.welcome_balance)?,
            min_topup: parse("min_topup", &self.min_topup)?,
            max_topup: parse("max_topup", &self.max_topup)?,
            checkout_timeout: Duration::from_millis(self.checkout_timeout_ms),
            idempotency_retention: Duration::from_secs(self.idempotency_retention_secs),
            history_limit: self.history_limit,
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut builder = config::Config::builder()
            // Start with default configuration
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.workers", 4)?
            .set_default("database.url", "sqlite://database.sqlite")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.acquire_timeout_secs", 5)?
            .set_default("database.busy_timeout_ms", 5000)?
            .set_default("nats.enabled", false)?
            .set_default("nats.url", "nats://127.0.0.1:4222")?
            .set_default("nats.topic_prefix", "cosmic")?
            .set_default("storefront.shipping_fee", "500")?
            .set_default("storefront.welcome_balance", "5000")?
            .set_default("storefront.min_topup", "100")?
            .set_default("storefront.max_topup", "1000000")?
            .set_default("storefront.checkout_timeout_ms", 10_000)?
            .set_default("storefront.idempotency_retention_secs", 24 * 3600)?
            .set_default("storefront.history_limit", 50)?
            .set_default("storefront.seed_catalog", true)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?;

        // Add environment-specific config file if it exists
        if let Ok(config_file) = env::var("CONFIG_FILE") {
            builder = builder.add_source(File::with_name(&config_file).required(false));
        } else {
            builder = builder.add_source(
                File::with_name(&format!("config/{}", environment)).required(false),
            );
        }

        // Override with environment variables
        builder = builder.add_source(Environment::with_prefix("CHECKOUT_ENGINE").separator("__"));

        if let Ok(db_url) = env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", db_url)?;
        }

        if let Ok(nats_url) = env::var("NATS_URL") {
            builder = builder
                .set_override("nats.url", nats_url)?
                .set_override("nats.enabled", true)?;
        }

        if let Ok(port) = env::var("PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port cannot be 0".to_string());
        }

        if self.database.url.is_empty() {
            return Err("Database URL is required".to_string());
        }

        if self.database.max_connections == 0 {
            return Err("database.max_connections must be at least 1".to_string());
        }

        if self.nats.enabled && self.nats.url.is_empty() {
            return Err("NATS URL is required when notifications are enabled".to_string());
        }

        let settings = self.storefront.settings()?;

        if settings.shipping_fee.is_sign_negative() {
            return Err("storefront.shipping_fee cannot be negative".to_string());
        }

        if settings.welcome_balance.is_sign_negative() {
            return Err("storefront.welcome_balance cannot be negative".to_string());
        }

        if settings.min_topup <= Decimal::ZERO {
            return Err("storefront.min_topup must be positive".to_string());
        }

        if settings.max_topup < settings.min_topup {
            return Err("storefront.max_topup cannot be below storefront.min_topup".to_string());
        }

        if settings.checkout_timeout.is_zero() {
            return Err("storefront.checkout_timeout_ms must be positive".to_string());
        }

        Ok(())
    }
}
