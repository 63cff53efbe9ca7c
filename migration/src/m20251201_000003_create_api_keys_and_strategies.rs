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
                    .table(ApiKeys::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ApiKeys::Id).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(ApiKeys::UserId).big_integer().not_null())
                    .col(ColumnDef::new(ApiKeys::Broker).string_len(32).not_null())
                    .col(ColumnDef::new(ApiKeys::Label).string().null())
                    .col(ColumnDef::new(ApiKeys::ApiKey).text().not_null())
                    .col(ColumnDef::new(ApiKeys::ApiSecret).text().not_null())
                    .col(ColumnDef::new(ApiKeys::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(ApiKeys::Status).string_len(32).not_null().default("pending_verification"))
                    .col(ColumnDef::new(ApiKeys::CreatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .col(ColumnDef::new(ApiKeys::UpdatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_api_keys_user")
                            .from(ApiKeys::Table, ApiKeys::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_api_keys_user_broker")
                    .table(ApiKeys::Table)
                    .col(ApiKeys::UserId)
                    .col(ApiKeys::Broker)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Strategies::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Strategies::Id).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Strategies::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Strategies::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Strategies::Description).text().null())
                    .col(ColumnDef::new(Strategies::Segment).string_len(32).not_null())
                    .col(ColumnDef::new(Strategies::Symbol).string_len(64).not_null())
                    .col(ColumnDef::new(Strategies::Timeframe).string_len(8).not_null())
                    .col(ColumnDef::new(Strategies::Capital).decimal_len(16, 2).not_null())
                    .col(ColumnDef::new(Strategies::Rules).text().not_null())
                    .col(ColumnDef::new(Strategies::GeneratedCode).text().not_null())
                    .col(ColumnDef::new(Strategies::IsRunning).boolean().not_null().default(false))
                    .col(ColumnDef::new(Strategies::IsPublic).boolean().not_null().default(false))
                    .col(ColumnDef::new(Strategies::IsAdminStrategy).boolean().not_null().default(false))
                    .col(ColumnDef::new(Strategies::CreatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .col(ColumnDef::new(Strategies::UpdatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_strategies_user")
                            .from(Strategies::Table, Strategies::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_strategies_user")
                    .table(Strategies::Table)
                    .col(Strategies::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_strategies_public")
                    .table(Strategies::Table)
                    .col(Strategies::IsPublic)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StrategySubscriptions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(StrategySubscriptions::Id).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(StrategySubscriptions::UserId).big_integer().not_null())
                    .col(ColumnDef::new(StrategySubscriptions::StrategyId).big_integer().not_null())
                    .col(ColumnDef::new(StrategySubscriptions::ApiKeyId).big_integer().null())
                    .col(ColumnDef::new(StrategySubscriptions::Status).string_len(16).not_null().default("active"))
                    .col(ColumnDef::new(StrategySubscriptions::PricePaid).decimal_len(16, 2).not_null().default(0))
                    .col(ColumnDef::new(StrategySubscriptions::CreatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .col(ColumnDef::new(StrategySubscriptions::CancelledAt).timestamp_with_time_zone().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_strategy_subscriptions_user")
                            .from(StrategySubscriptions::Table, StrategySubscriptions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // No foreign key to strategies: cancelled subscriptions outlive a deleted strategy
        manager
            .create_index(
                Index::create()
                    .name("idx_strategy_subscriptions_user_strategy")
                    .table(StrategySubscriptions::Table)
                    .col(StrategySubscriptions::UserId)
                    .col(StrategySubscriptions::StrategyId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StrategySubscriptions::Table).to_owned())
            .await?;
        manager.drop_table(Table::drop().table(Strategies::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(ApiKeys::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ApiKeys {
    Table,
    Id,
    UserId,
    Broker,
    Label,
    ApiKey,
    ApiSecret,
    IsActive,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Strategies {
    Table,
    Id,
    UserId,
    Name,
    Description,
    Segment,
    Symbol,
    Timeframe,
    Capital,
    Rules,
    GeneratedCode,
    IsRunning,
    IsPublic,
    IsAdminStrategy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum StrategySubscriptions {
    Table,
    Id,
    UserId,
    StrategyId,
    ApiKeyId,
    Status,
    PricePaid,
    CreatedAt,
    CancelledAt,
}
