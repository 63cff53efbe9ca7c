//! Wallet balances and the charge debit flow.
//!
//! Every balance change runs on a caller-owned `DatabaseTransaction` and
//! appends exactly one ledger row, so dropping the transaction without a
//! commit undoes both the balance change and its ledger entry.

use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{prelude::*, DatabaseConnection, DatabaseTransaction};
use serde::Serialize;
use shared::entity::{charges, wallet_transactions, wallets};
use shared::{AppError, AppResult, ChargeType, LedgerKind, LedgerReason};
use tracing::{debug, info, warn};

use crate::repositories::wallet_repository::{LedgerEntry, WalletRepository};

pub const RECENT_TRANSACTIONS: u64 = 10;
pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;
/// Wallet and ledger columns hold two decimal places
pub const MONEY_SCALE: u32 = 2;

fn check_credit_amount(amount: Decimal) -> AppResult<()> {
    if amount <= Decimal::ZERO {
        return Err(AppError::validation("credit amount must be positive"));
    }
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(AppError::validation(format!(
            "credit amount can have at most {} decimal places",
            MONEY_SCALE
        )));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct WalletSummary {
    pub balance: Decimal,
    pub recent_transactions: Vec<wallet_transactions::Model>,
}

#[derive(Debug, Serialize)]
pub struct TransactionPage {
    pub transactions: Vec<wallet_transactions::Model>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

pub struct WalletService {
    db: Arc<DatabaseConnection>,
}

impl WalletService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn summary(&self, user_id: i64) -> AppResult<WalletSummary> {
        let wallet = WalletRepository::find_by_user(self.db.as_ref(), user_id)
            .await?
            .ok_or_else(|| AppError::not_found("wallet"))?;
        let recent_transactions =
            WalletRepository::transactions(self.db.as_ref(), user_id, RECENT_TRANSACTIONS, 0).await?;
        Ok(WalletSummary {
            balance: wallet.balance,
            recent_transactions,
        })
    }

    pub async fn transactions(&self, user_id: i64, limit: Option<u64>, offset: Option<u64>) -> AppResult<TransactionPage> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = offset.unwrap_or(0);
        let transactions = WalletRepository::transactions(self.db.as_ref(), user_id, limit, offset).await?;
        let total = WalletRepository::count_transactions(self.db.as_ref(), user_id).await?;
        Ok(TransactionPage {
            transactions,
            total,
            limit,
            offset,
        })
    }

    /// Lock the user's wallet row for the rest of `txn`.
    ///
    /// Paid actions call this before their duplicate checks so concurrent
    /// purchases by the same user run one after the other.
    pub async fn lock_wallet(txn: &DatabaseTransaction, user_id: i64) -> AppResult<wallets::Model> {
        WalletRepository::find_by_user_for_update(txn, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("wallet"))
    }

    /// Debit the configured price of `charge_type`.
    ///
    /// A missing, inactive or zero charge makes the action free: nothing is
    /// debited and `0` is returned. Otherwise returns the amount debited.
    pub async fn debit_for_charge(
        txn: &DatabaseTransaction,
        user_id: i64,
        charge_type: ChargeType,
        reference_id: Option<i64>,
    ) -> AppResult<Decimal> {
        let charge = charges::Entity::find()
            .filter(charges::Column::ChargeType.eq(charge_type.as_str()))
            .one(txn)
            .await?;

        let amount = match charge {
            Some(charge) if charge.is_active && charge.amount > Decimal::ZERO => charge.amount,
            _ => {
                debug!("No active charge for {}, user {} is not debited", charge_type, user_id);
                return Ok(Decimal::ZERO);
            }
        };

        Self::debit_amount(txn, user_id, amount, charge_type.ledger_reason(), reference_id, None).await?;
        Ok(amount)
    }

    /// Debit an explicit amount from the user's wallet
    pub async fn debit_amount(
        txn: &DatabaseTransaction,
        user_id: i64,
        amount: Decimal,
        reason: LedgerReason,
        reference_id: Option<i64>,
        note: Option<String>,
    ) -> AppResult<wallet_transactions::Model> {
        let amount = amount.round_dp(MONEY_SCALE);
        if amount <= Decimal::ZERO {
            return Err(AppError::validation("debit amount must be positive"));
        }

        let wallet = WalletRepository::find_by_user_for_update(txn, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("wallet"))?;

        if wallet.balance < amount {
            warn!(
                "Insufficient balance for user {}: required {}, available {}",
                user_id, amount, wallet.balance
            );
            return Err(AppError::InsufficientBalance {
                required: amount,
                available: wallet.balance,
            });
        }

        let balance_after = wallet.balance - amount;
        let wallet = WalletRepository::set_balance(txn, wallet, balance_after).await?;
        let entry = WalletRepository::append_ledger(
            txn,
            &wallet,
            LedgerEntry {
                kind: LedgerKind::Debit,
                amount,
                balance_after,
                reason,
                reference_id,
                note,
            },
        )
        .await?;

        info!("💸 Debited {} from user {} ({})", amount, user_id, reason);
        Ok(entry)
    }

    pub async fn credit(
        txn: &DatabaseTransaction,
        user_id: i64,
        amount: Decimal,
        reason: LedgerReason,
        note: Option<String>,
    ) -> AppResult<wallet_transactions::Model> {
        check_credit_amount(amount)?;

        let wallet = WalletRepository::find_by_user_for_update(txn, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("wallet"))?;

        let balance_after = wallet.balance + amount;
        let wallet = WalletRepository::set_balance(txn, wallet, balance_after).await?;
        let entry = WalletRepository::append_ledger(
            txn,
            &wallet,
            LedgerEntry {
                kind: LedgerKind::Credit,
                amount,
                balance_after,
                reason,
                reference_id: None,
                note,
            },
        )
        .await?;

        info!("💰 Credited {} to user {} ({})", amount, user_id, reason);
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_check_credit_amount() {
        assert!(check_credit_amount(dec!(10)).is_ok());
        assert!(check_credit_amount(dec!(0.01)).is_ok());
        assert!(check_credit_amount(dec!(25.500)).is_ok());
        assert!(check_credit_amount(dec!(0.001)).is_err());
        assert!(check_credit_amount(dec!(0)).is_err());
        assert!(check_credit_amount(dec!(-5)).is_err());
    }
}
