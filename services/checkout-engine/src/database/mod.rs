//! SQLite persistence.
//!
//! Single-statement reads accept any executor (the pool or an open
//! transaction). Write paths take `&mut SqliteConnection` so callers compose
//! them inside one transaction; none of them commit on their own.

pub mod idempotency;
pub mod ledger;
pub mod orders;
pub mod products;
pub mod users;

use crate::config::DatabaseConfig;
use crate::errors::Result;
use crate::models::Product;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(options)
            .await?;

        info!(url = %config.url, max_connections = config.max_connections, "database pool ready");

        Ok(Database { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Insert catalog products that are not present yet; existing rows win.
    pub async fn seed_catalog(&self, catalog: &[Product]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for product in catalog {
            inserted += products::insert_if_absent(&mut *tx, product).await?;
        }
        tx.commit().await?;

        info!(inserted, total = catalog.len(), "catalog seeded");
        Ok(inserted)
    }

    /// Start an atomic unit of work. Dropping the returned transaction
    /// without committing rolls it back.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
