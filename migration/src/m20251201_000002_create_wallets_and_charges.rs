use sea_orm_migration::prelude::*;

use crate::m20251201_000001_create_users_and_franchises::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Wallets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Wallets::Id).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Wallets::UserId).big_integer().not_null().unique_key())
                    .col(ColumnDef::new(Wallets::Balance).decimal_len(16, 2).not_null().default(0))
                    .col(ColumnDef::new(Wallets::CreatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .col(ColumnDef::new(Wallets::UpdatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_wallets_user")
                            .from(Wallets::Table, Wallets::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WalletTransactions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(WalletTransactions::Id).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(WalletTransactions::WalletId).big_integer().not_null())
                    .col(ColumnDef::new(WalletTransactions::UserId).big_integer().not_null())
                    .col(ColumnDef::new(WalletTransactions::Kind).string_len(16).not_null()) // "debit" or "credit"
                    .col(ColumnDef::new(WalletTransactions::Amount).decimal_len(16, 2).not_null())
                    .col(ColumnDef::new(WalletTransactions::BalanceAfter).decimal_len(16, 2).not_null())
                    .col(ColumnDef::new(WalletTransactions::Reason).string_len(32).not_null())
                    .col(ColumnDef::new(WalletTransactions::ReferenceId).big_integer().null())
                    .col(ColumnDef::new(WalletTransactions::Note).text().null())
                    .col(ColumnDef::new(WalletTransactions::CreatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_wallet_transactions_wallet")
                            .from(WalletTransactions::Table, WalletTransactions::WalletId)
                            .to(Wallets::Table, Wallets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_wallet_transactions_user_created")
                    .table(WalletTransactions::Table)
                    .col(WalletTransactions::UserId)
                    .col(WalletTransactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Charges::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Charges::Id).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Charges::ChargeType).string_len(64).not_null().unique_key())
                    .col(ColumnDef::new(Charges::Amount).decimal_len(16, 2).not_null().default(0))
                    .col(ColumnDef::new(Charges::Description).text().null())
                    .col(ColumnDef::new(Charges::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Charges::UpdatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .to_owned(),
            )
            .await?;

        // Billable actions start free; admins set the price
        let seed = Query::insert()
            .into_table(Charges::Table)
            .columns([Charges::ChargeType, Charges::Amount, Charges::Description, Charges::IsActive])
            .values([
                "api_key".into(),
                0.into(),
                "Charged when a broker API key is added".into(),
                true.into(),
            ])
            .map_err(|e| DbErr::Custom(e.to_string()))?
            .values([
                "strategy_subscription".into(),
                0.into(),
                "Charged when subscribing to a marketplace strategy".into(),
                true.into(),
            ])
            .map_err(|e| DbErr::Custom(e.to_string()))?
            .to_owned();
        let db = manager.get_connection();
        db.execute(db.get_database_backend().build(&seed)).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Charges::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(WalletTransactions::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Wallets::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Wallets {
    Table,
    Id,
    UserId,
    Balance,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum WalletTransactions {
    Table,
    Id,
    WalletId,
    UserId,
    Kind,
    Amount,
    BalanceAfter,
    Reason,
    ReferenceId,
    Note,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Charges {
    Table,
    Id,
    ChargeType,
    Amount,
    Description,
    IsActive,
    UpdatedAt,
}
