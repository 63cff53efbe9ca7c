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
                    .table(Plans::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Plans::Id).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Plans::Name).string().not_null())
                    .col(ColumnDef::new(Plans::Price).decimal_len(16, 2).not_null())
                    .col(ColumnDef::new(Plans::DurationDays).integer().not_null())
                    .col(ColumnDef::new(Plans::Features).text().not_null())
                    .col(ColumnDef::new(Plans::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Plans::CreatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PlanSubscriptions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PlanSubscriptions::Id).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(PlanSubscriptions::UserId).big_integer().not_null())
                    .col(ColumnDef::new(PlanSubscriptions::PlanId).big_integer().not_null())
                    .col(ColumnDef::new(PlanSubscriptions::PricePaid).decimal_len(16, 2).not_null())
                    .col(ColumnDef::new(PlanSubscriptions::StartsAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(PlanSubscriptions::ExpiresAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(PlanSubscriptions::CreatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_plan_subscriptions_plan")
                            .from(PlanSubscriptions::Table, PlanSubscriptions::PlanId)
                            .to(Plans::Table, Plans::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_plan_subscriptions_user")
                            .from(PlanSubscriptions::Table, PlanSubscriptions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_plan_subscriptions_user_expires")
                    .table(PlanSubscriptions::Table)
                    .col(PlanSubscriptions::UserId)
                    .col(PlanSubscriptions::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SupportTickets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SupportTickets::Id).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(SupportTickets::Reference).string_len(36).not_null().unique_key())
                    .col(ColumnDef::new(SupportTickets::UserId).big_integer().not_null())
                    .col(ColumnDef::new(SupportTickets::Subject).string().not_null())
                    .col(ColumnDef::new(SupportTickets::Message).text().not_null())
                    .col(ColumnDef::new(SupportTickets::Status).string_len(16).not_null().default("open"))
                    .col(ColumnDef::new(SupportTickets::Priority).string_len(16).not_null().default("medium"))
                    .col(ColumnDef::new(SupportTickets::CreatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .col(ColumnDef::new(SupportTickets::UpdatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_support_tickets_user")
                            .from(SupportTickets::Table, SupportTickets::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_support_tickets_user_status")
                    .table(SupportTickets::Table)
                    .col(SupportTickets::UserId)
                    .col(SupportTickets::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TicketReplies::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TicketReplies::Id).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(TicketReplies::TicketId).big_integer().not_null())
                    .col(ColumnDef::new(TicketReplies::UserId).big_integer().not_null())
                    .col(ColumnDef::new(TicketReplies::Message).text().not_null())
                    .col(ColumnDef::new(TicketReplies::IsStaff).boolean().not_null().default(false))
                    .col(ColumnDef::new(TicketReplies::CreatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ticket_replies_ticket")
                            .from(TicketReplies::Table, TicketReplies::TicketId)
                            .to(SupportTickets::Table, SupportTickets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(TicketReplies::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(SupportTickets::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(PlanSubscriptions::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Plans::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Plans {
    Table,
    Id,
    Name,
    Price,
    DurationDays,
    Features,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PlanSubscriptions {
    Table,
    Id,
    UserId,
    PlanId,
    PricePaid,
    StartsAt,
    ExpiresAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum SupportTickets {
    Table,
    Id,
    Reference,
    UserId,
    Subject,
    Message,
    Status,
    Priority,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TicketReplies {
    Table,
    Id,
    TicketId,
    UserId,
    Message,
    IsStaff,
    CreatedAt,
}
