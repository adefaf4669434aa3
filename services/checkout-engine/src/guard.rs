//! Balance Guard: decides whether a user's wallet covers a pending debit.
//!
//! The guard reads through [`users::lock_for_update`], so it must be called
//! with the same transaction that later writes the debit. The decision and
//! the debit then observe one consistent balance.

use crate::database::users;
use crate::errors::{CheckoutEngineError, Result};
use crate::models::UserAccount;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::SqliteConnection;
use uuid::Uuid;

/// Admission decision for `required` against `balance`.
pub fn check_funds(balance: Decimal, required: Decimal) -> Result<()> {
    if required <= Decimal::ZERO {
        return Err(CheckoutEngineError::InvalidAmount(format!(
            "debit must be positive, got {}",
            required
        )));
    }

    if balance < required {
        return Err(CheckoutEngineError::InsufficientFunds {
            deficit: required - balance,
            current_balance: balance,
            required,
        });
    }

    Ok(())
}

/// Lock the user and admit or reject a debit of `required`.
///
/// On success the caller holds the user's write lock for the rest of its
/// transaction and receives the locked account state.
pub async fn authorize(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    required: Decimal,
) -> Result<UserAccount> {
    let user = users::lock_for_update(conn, user_id, Utc::now())
        .await?
        .ok_or(CheckoutEngineError::UserNotFound(user_id))?;

    check_funds(user.balance, required)?;

    Ok(user)
}
