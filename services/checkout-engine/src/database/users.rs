use crate::errors::{CheckoutEngineError, Result};
use crate::models::{to_money, UserAccount, UserRole, UserRow};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, Sqlite, SqliteConnection};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, password_hash, name, address, role, balance, \
                            opening_balance, created_at, updated_at";

pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub name: &'a str,
    pub address: Option<&'a str>,
    pub role: UserRole,
    pub opening_balance: Decimal,
}

pub async fn insert<'e, E>(executor: E, new_user: &NewUser<'_>) -> Result<UserAccount>
where
    E: Executor<'e, Database = Sqlite>,
{
    let now = Utc::now();
    let balance = to_money(new_user.opening_balance).to_string();

    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        INSERT INTO users (id, email, password_hash, name, address, role, balance,
                           opening_balance, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(new_user.email)
    .bind(new_user.password_hash)
    .bind(new_user.name)
    .bind(new_user.address)
    .bind(new_user.role)
    .bind(&balance)
    .bind(&balance)
    .bind(now)
    .bind(now)
    .fetch_one(executor)
    .await?;

    row.try_into()
}

pub async fn find_by_id<'e, E>(executor: E, user_id: Uuid) -> Result<Option<UserAccount>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, UserRow>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(user_id)
        .fetch_optional(executor)
        .await?
        .map(UserAccount::try_from)
        .transpose()
}

pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<UserAccount>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, UserRow>(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
        .bind(email)
        .fetch_optional(executor)
        .await?
        .map(UserAccount::try_from)
        .transpose()
}

/// Take the write lock on the user row and return its committed state.
///
/// This is a write, so SQLite grants the transaction its writer slot before
/// the balance is read. Any other unit touching a balance waits here until
/// this one commits or rolls back.
pub async fn lock_for_update(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Option<UserAccount>> {
    sqlx::query_as::<_, UserRow>(&format!(
        "UPDATE users SET updated_at = ? WHERE id = ? RETURNING {}",
        USER_COLUMNS
    ))
    .bind(now)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    .map(UserAccount::try_from)
    .transpose()
}

pub async fn set_balance(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    balance: Decimal,
    now: DateTime<Utc>,
) -> Result<()> {
    if balance < Decimal::ZERO {
        return Err(CheckoutEngineError::InvariantViolation(format!(
            "balance of user {} would become {}",
            user_id, balance
        )));
    }

    let result = sqlx::query("UPDATE users SET balance = ?, updated_at = ? WHERE id = ?")
        .bind(to_money(balance).to_string())
        .bind(now)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() != 1 {
        return Err(CheckoutEngineError::Internal(format!(
            "balance update touched {} rows for user {}",
            result.rows_affected(),
            user_id
        )));
    }

    Ok(())
}
