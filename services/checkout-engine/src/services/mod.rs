//! Business operations on top of the storage layer.
//!
//! Every operation that moves money runs as one SQLite transaction: opened
//! with [`Database::begin`](crate::database::Database::begin), closed with
//! [`finish`] and bounded by [`bounded`]. Notifications go out only after
//! that transaction commits.

pub mod accounts;
pub mod checkout;
pub mod wallet;

pub use accounts::AccountService;
pub use checkout::CheckoutService;
pub use wallet::WalletService;

use crate::errors::{CheckoutEngineError, Result};
use sqlx::{Sqlite, Transaction};
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Commit `tx` if `outcome` is a success, roll it back otherwise.
pub(crate) async fn finish<T>(
    tx: Transaction<'static, Sqlite>,
    operation: &'static str,
    outcome: Result<T>,
) -> Result<T> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(operation, "rollback failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}

/// Bound an atomic unit by `limit`, lock waits included.
///
/// On expiry the unit's future is dropped, which drops its open transaction
/// and rolls it back. Storage failures come back as
/// [`CheckoutEngineError::CheckoutFailed`]; business errors pass through.
pub(crate) async fn bounded<T, F>(operation: &'static str, limit: Duration, unit: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, unit).await {
        Ok(result) => result.map_err(|e| e.into_checkout_failure(operation)),
        Err(_) => {
            error!(
                operation,
                timeout_ms = limit.as_millis() as u64,
                "atomic unit timed out"
            );
            Err(CheckoutEngineError::CheckoutFailed {
                cause: format!("{} timed out after {:?}", operation, limit),
            })
        }
    }
}
