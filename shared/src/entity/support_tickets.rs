//! `SeaORM` Entity, @generated manually

use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize)]
#[sea_orm(table_name = "support_tickets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub reference: String,
    pub user_id: i64,
    pub subject: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub status: String,   // "open", "in_progress", "closed"
    pub priority: String, // "low", "medium", "high"
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ticket_replies::Entity")]
    TicketReplies,
}

impl Related<super::ticket_replies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TicketReplies.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
