use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{prelude::*, ConnectionTrait, QueryOrder, QuerySelect, Set};
use shared::entity::{wallet_transactions, wallets};
use shared::{AppResult, LedgerKind, LedgerReason};

/// Row to append to the wallet ledger
pub struct LedgerEntry {
    pub kind: LedgerKind,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub reason: LedgerReason,
    pub reference_id: Option<i64>,
    pub note: Option<String>,
}

pub struct WalletRepository;

impl WalletRepository {
    pub async fn find_by_user<C: ConnectionTrait>(db: &C, user_id: i64) -> AppResult<Option<wallets::Model>> {
        let wallet = wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id))
            .one(db)
            .await?;
        Ok(wallet)
    }

    /// Same as `find_by_user` but takes a row lock (`FOR UPDATE`) where the backend supports it
    pub async fn find_by_user_for_update<C: ConnectionTrait>(db: &C, user_id: i64) -> AppResult<Option<wallets::Model>> {
        let wallet = wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id))
            .lock_exclusive()
            .one(db)
            .await?;
        Ok(wallet)
    }

    pub async fn create_for_user<C: ConnectionTrait>(db: &C, user_id: i64) -> AppResult<wallets::Model> {
        let now = Utc::now();
        let wallet = wallets::ActiveModel {
            user_id: Set(user_id),
            balance: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(wallet)
    }

    pub async fn set_balance<C: ConnectionTrait>(
        db: &C,
        wallet: wallets::Model,
        balance: Decimal,
    ) -> AppResult<wallets::Model> {
        let mut active: wallets::ActiveModel = wallet.into();
        active.balance = Set(balance);
        active.updated_at = Set(Utc::now());
        Ok(active.update(db).await?)
    }

    pub async fn append_ledger<C: ConnectionTrait>(
        db: &C,
        wallet: &wallets::Model,
        entry: LedgerEntry,
    ) -> AppResult<wallet_transactions::Model> {
        let row = wallet_transactions::ActiveModel {
            wallet_id: Set(wallet.id),
            user_id: Set(wallet.user_id),
            kind: Set(entry.kind.as_str().to_string()),
            amount: Set(entry.amount),
            balance_after: Set(entry.balance_after),
            reason: Set(entry.reason.as_str().to_string()),
            reference_id: Set(entry.reference_id),
            note: Set(entry.note),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(row)
    }

    /// Ledger rows of a user, newest first
    pub async fn transactions<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<wallet_transactions::Model>> {
        let rows = wallet_transactions::Entity::find()
            .filter(wallet_transactions::Column::UserId.eq(user_id))
            .order_by_desc(wallet_transactions::Column::CreatedAt)
            .order_by_desc(wallet_transactions::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(db)
            .await?;
        Ok(rows)
    }

    pub async fn count_transactions<C: ConnectionTrait>(db: &C, user_id: i64) -> AppResult<u64> {
        let count = wallet_transactions::Entity::find()
            .filter(wallet_transactions::Column::UserId.eq(user_id))
            .count(db)
            .await?;
        Ok(count)
    }

    /// Sum of wallet balances, optionally restricted to a set of users
    pub async fn total_balance<C: ConnectionTrait>(db: &C, user_ids: Option<&[i64]>) -> AppResult<Decimal> {
        let mut query = wallets::Entity::find()
            .select_only()
            .column_as(wallets::Column::Balance.sum(), "total");
        if let Some(ids) = user_ids {
            if ids.is_empty() {
                return Ok(Decimal::ZERO);
            }
            query = query.filter(wallets::Column::UserId.is_in(ids.to_vec()));
        }
        let total: Option<Option<Decimal>> = query.into_tuple().one(db).await?;
        Ok(total.flatten().unwrap_or(Decimal::ZERO))
    }

    /// Sum of all debits, i.e. platform revenue, optionally restricted to a set of users
    pub async fn total_debits<C: ConnectionTrait>(db: &C, user_ids: Option<&[i64]>) -> AppResult<Decimal> {
        let mut query = wallet_transactions::Entity::find()
            .select_only()
            .column_as(wallet_transactions::Column::Amount.sum(), "total")
            .filter(wallet_transactions::Column::Kind.eq(LedgerKind::Debit.as_str()));
        if let Some(ids) = user_ids {
            if ids.is_empty() {
                return Ok(Decimal::ZERO);
            }
            query = query.filter(wallet_transactions::Column::UserId.is_in(ids.to_vec()));
        }
        let total: Option<Option<Decimal>> = query.into_tuple().one(db).await?;
        Ok(total.flatten().unwrap_or(Decimal::ZERO))
    }
}
