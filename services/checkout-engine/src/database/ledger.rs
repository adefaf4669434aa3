//! Append-only balance ledger (`transactions` table).

use crate::errors::{CheckoutEngineError, Result};
use crate::models::{
    parse_money, to_money, BalanceTransition, LedgerEntry, LedgerEntryKind, LedgerRow, LedgerView,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, FromRow, Sqlite, SqliteConnection};
use uuid::Uuid;

const LEDGER_COLUMNS: &str = "id, user_id, kind, amount, description, order_id, \
                              previous_balance, new_balance, created_at";

pub struct NewLedgerEntry<'a> {
    pub user_id: Uuid,
    pub kind: LedgerEntryKind,
    pub amount: Decimal,
    pub description: &'a str,
    pub order_id: Option<Uuid>,
    pub previous_balance: Decimal,
    pub new_balance: Decimal,
}

impl NewLedgerEntry<'_> {
    /// Arithmetic and sign rules every entry must satisfy on its own.
    pub fn check(&self) -> Result<()> {
        if self.previous_balance.checked_add(self.amount) != Some(self.new_balance) {
            return Err(CheckoutEngineError::InvariantViolation(format!(
                "{} + {} != {} for user {}",
                self.previous_balance, self.amount, self.new_balance, self.user_id
            )));
        }

        if self.new_balance < Decimal::ZERO {
            return Err(CheckoutEngineError::InvariantViolation(format!(
                "entry would leave user {} at {}",
                self.user_id, self.new_balance
            )));
        }

        let sign_ok = match self.kind {
            LedgerEntryKind::Purchase => self.amount < Decimal::ZERO,
            LedgerEntryKind::Topup | LedgerEntryKind::Refund => self.amount > Decimal::ZERO,
        };
        if !sign_ok {
            return Err(CheckoutEngineError::InvariantViolation(format!(
                "{} entry with amount {}",
                self.kind.as_str(),
                self.amount
            )));
        }

        Ok(())
    }
}

/// Balance left by the user's latest entry, or `None` if the ledger is empty.
pub async fn chain_head(conn: &mut SqliteConnection, user_id: Uuid) -> Result<Option<Decimal>> {
    let head: Option<String> = sqlx::query_scalar(
        "SELECT new_balance FROM transactions WHERE user_id = ? ORDER BY id DESC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    head.map(|raw| parse_money("transactions.new_balance", &raw))
        .transpose()
}

/// Append an entry inside the caller's transaction.
///
/// `previous_balance` must continue the user's chain: it equals the last
/// entry's `new_balance`, or the opening balance for a first entry.
pub async fn append(
    conn: &mut SqliteConnection,
    entry: &NewLedgerEntry<'_>,
    now: DateTime<Utc>,
) -> Result<LedgerEntry> {
    entry.check()?;

    let expected_previous = match chain_head(&mut *conn, entry.user_id).await? {
        Some(balance) => balance,
        None => {
            let opening: String =
                sqlx::query_scalar("SELECT opening_balance FROM users WHERE id = ?")
                    .bind(entry.user_id)
                    .fetch_one(&mut *conn)
                    .await?;
            parse_money("users.opening_balance", &opening)?
        }
    };

    if expected_previous != entry.previous_balance {
        return Err(CheckoutEngineError::InvariantViolation(format!(
            "ledger chain break for user {}: head is {}, entry starts from {}",
            entry.user_id, expected_previous, entry.previous_balance
        )));
    }

    let row = sqlx::query_as::<_, LedgerRow>(&format!(
        r#"
        INSERT INTO transactions (user_id, kind, amount, description, order_id,
                                  previous_balance, new_balance, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {}
        "#,
        LEDGER_COLUMNS
    ))
    .bind(entry.user_id)
    .bind(entry.kind)
    .bind(to_money(entry.amount).to_string())
    .bind(entry.description)
    .bind(entry.order_id)
    .bind(to_money(entry.previous_balance).to_string())
    .bind(to_money(entry.new_balance).to_string())
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    row.try_into()
}

/// All entries of a user in append order.
pub async fn entries_for_user<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<LedgerEntry>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, LedgerRow>(&format!(
        "SELECT {} FROM transactions WHERE user_id = ? ORDER BY id ASC",
        LEDGER_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(executor)
    .await?
    .into_iter()
    .map(LedgerEntry::try_from)
    .collect()
}

pub async fn entries_for_order<'e, E>(executor: E, order_id: Uuid) -> Result<Vec<LedgerEntry>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, LedgerRow>(&format!(
        "SELECT {} FROM transactions WHERE order_id = ? ORDER BY id ASC",
        LEDGER_COLUMNS
    ))
    .bind(order_id)
    .fetch_all(executor)
    .await?
    .into_iter()
    .map(LedgerEntry::try_from)
    .collect()
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    id: i64,
    kind: LedgerEntryKind,
    amount: String,
    description: String,
    order_number: Option<String>,
    previous_balance: String,
    new_balance: String,
    created_at: DateTime<Utc>,
}

/// Most recent entries first, with the order number resolved for purchases.
pub async fn history<'e, E>(executor: E, user_id: Uuid, limit: u32) -> Result<Vec<LedgerView>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, HistoryRow>(
        r#"
        SELECT t.id, t.kind, t.amount, t.description, o.order_number,
               t.previous_balance, t.new_balance, t.created_at
        FROM transactions t
        LEFT JOIN orders o ON o.id = t.order_id
        WHERE t.user_id = ?
        ORDER BY t.id DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(i64::from(limit))
    .fetch_all(executor)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(LedgerView {
                id: row.id,
                kind: row.kind,
                amount: parse_money("transactions.amount", &row.amount)?,
                description: row.description,
                order_number: row.order_number,
                date: row.created_at,
                balance_change: BalanceTransition {
                    from: parse_money("transactions.previous_balance", &row.previous_balance)?,
                    to: parse_money("transactions.new_balance", &row.new_balance)?,
                },
            })
        })
        .collect()
}
