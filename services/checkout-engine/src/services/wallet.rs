use super::{bounded, finish};
use crate::config::StorefrontSettings;
use crate::database::ledger::{self, NewLedgerEntry};
use crate::database::{users, Database};
use crate::errors::{CheckoutEngineError, Result};
use crate::metrics;
use crate::models::{
    to_money, BalanceChange, BalanceView, LedgerEntryKind, LedgerView, TopUpReceipt,
    TopUpRequest,
};
use crate::reconciliation::{self, ReconciliationReport};
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::SqliteConnection;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const MAX_HISTORY: u32 = 500;

pub struct WalletService {
    db: Arc<Database>,
    settings: StorefrontSettings,
}

impl WalletService {
    pub fn new(db: Arc<Database>, settings: StorefrontSettings) -> Self {
        WalletService { db, settings }
    }

    /// Credit `amount` to the user's balance and record it in the ledger.
    pub async fn top_up(&self, request: TopUpRequest) -> Result<TopUpReceipt> {
        let result = self.credit(request).await;

        let outcome = match &result {
            Ok(_) => "committed",
            Err(CheckoutEngineError::CheckoutFailed { .. }) => "failed",
            Err(_) => "rejected",
        };
        metrics::TOPUPS_TOTAL.with_label_values(&[outcome]).inc();

        result
    }

    async fn credit(&self, request: TopUpRequest) -> Result<TopUpReceipt> {
        let amount = self.validate_amount(request.amount)?;

        let unit = async {
            let mut tx = self.db.begin().await?;
            let outcome = Self::apply_credit(&mut *tx, request.user_id, amount).await;
            finish(tx, "top_up", outcome).await
        };
        let change = bounded("top_up", self.settings.checkout_timeout, unit).await?;

        metrics::LEDGER_ENTRIES_TOTAL
            .with_label_values(&[LedgerEntryKind::Topup.as_str()])
            .inc();
        info!(
            user_id = %request.user_id,
            old = %change.old,
            new = %change.new,
            "balance topped up"
        );

        Ok(TopUpReceipt {
            success: true,
            user_id: request.user_id,
            balance: change,
        })
    }

    fn validate_amount(&self, amount: Decimal) -> Result<Decimal> {
        if amount <= Decimal::ZERO {
            return Err(CheckoutEngineError::InvalidAmount(format!(
                "amount must be positive, got {}",
                amount
            )));
        }

        if amount.normalize().scale() > 2 {
            return Err(CheckoutEngineError::InvalidAmount(format!(
                "amount {} has more than two decimal places",
                amount
            )));
        }

        if amount < self.settings.min_topup {
            return Err(CheckoutEngineError::InvalidAmount(format!(
                "minimum top-up is {}",
                self.settings.min_topup
            )));
        }

        if amount > self.settings.max_topup {
            return Err(CheckoutEngineError::InvalidAmount(format!(
                "maximum top-up is {}",
                self.settings.max_topup
            )));
        }

        Ok(to_money(amount))
    }

    async fn apply_credit(
        conn: &mut SqliteConnection,
        user_id: Uuid,
        amount: Decimal,
    ) -> Result<BalanceChange> {
        let now = Utc::now();
        let user = users::lock_for_update(&mut *conn, user_id, now)
            .await?
            .ok_or(CheckoutEngineError::UserNotFound(user_id))?;

        let new_balance = user.balance.checked_add(amount).ok_or_else(|| {
            CheckoutEngineError::InvalidAmount(format!(
                "crediting {} would overflow the balance of user {}",
                amount, user_id
            ))
        })?;
        users::set_balance(&mut *conn, user_id, new_balance, now).await?;

        let description = format!("Balance top-up of {}", amount);
        ledger::append(
            &mut *conn,
            &NewLedgerEntry {
                user_id,
                kind: LedgerEntryKind::Topup,
                amount,
                description: &description,
                order_id: None,
                previous_balance: user.balance,
                new_balance,
            },
            now,
        )
        .await?;

        Ok(BalanceChange {
            old: to_money(user.balance),
            added: amount,
            new: to_money(new_balance),
        })
    }

    /// Read-only; repeated calls between writes return the same value.
    pub async fn balance(&self, user_id: Uuid) -> Result<BalanceView> {
        let user = users::find_by_id(self.db.pool(), user_id)
            .await?
            .ok_or(CheckoutEngineError::UserNotFound(user_id))?;

        Ok(BalanceView {
            id: user.id,
            name: user.name,
            email: user.email,
            balance: to_money(user.balance),
        })
    }

    /// Most recent entries first.
    pub async fn history(&self, user_id: Uuid, limit: Option<u32>) -> Result<Vec<LedgerView>> {
        self.ensure_user(user_id).await?;

        let limit = limit
            .unwrap_or(self.settings.history_limit)
            .clamp(1, MAX_HISTORY);
        ledger::history(self.db.pool(), user_id, limit).await
    }

    pub async fn reconcile(&self, user_id: Uuid) -> Result<ReconciliationReport> {
        // One read transaction so balance and entries come from the same snapshot.
        let mut tx = self.db.begin().await?;
        let user = users::find_by_id(&mut *tx, user_id)
            .await?
            .ok_or(CheckoutEngineError::UserNotFound(user_id))?;
        let entries = ledger::entries_for_user(&mut *tx, user_id).await?;
        tx.rollback().await?;

        let report = reconciliation::replay(user.opening_balance, &entries, user.balance);
        if !report.consistent {
            warn!(
                user_id = %user_id,
                expected = %report.expected_balance,
                current = %report.current_balance,
                breaks = report.chain_breaks.len(),
                "ledger does not reconcile"
            );
        }

        Ok(report)
    }

    async fn ensure_user(&self, user_id: Uuid) -> Result<()> {
        users::find_by_id(self.db.pool(), user_id)
            .await?
            .map(|_| ())
            .ok_or(CheckoutEngineError::UserNotFound(user_id))
    }
}
