use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Franchises::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Franchises::Id).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Franchises::Name).string().not_null())
                    .col(ColumnDef::new(Franchises::Code).string_len(64).not_null().unique_key())
                    .col(ColumnDef::new(Franchises::OwnerUserId).big_integer().null())
                    .col(ColumnDef::new(Franchises::CommissionPercent).decimal_len(5, 2).not_null().default(0))
                    .col(ColumnDef::new(Franchises::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Franchises::CreatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .col(ColumnDef::new(Franchises::UpdatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::Role).string_len(32).not_null().default("user")) // "user", "admin", "franchise"
                    .col(ColumnDef::new(Users::FranchiseId).big_integer().null())
                    .col(ColumnDef::new(Users::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Users::CreatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .col(ColumnDef::new(Users::UpdatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_users_franchise")
                            .from(Users::Table, Users::FranchiseId)
                            .to(Franchises::Table, Franchises::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_franchise")
                    .table(Users::Table)
                    .col(Users::FranchiseId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Franchises::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
pub enum Users {
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    Role,
    FranchiseId,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Franchises {
    Table,
    Id,
    Name,
    Code,
    OwnerUserId,
    CommissionPercent,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
