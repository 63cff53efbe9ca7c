//! `SeaORM` Entity, @generated manually

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize)]
#[sea_orm(table_name = "strategies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub segment: String, // "equity", "futures", "options", "commodity", "currency", "crypto"
    pub symbol: String,
    pub timeframe: String,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub capital: Decimal,
    #[sea_orm(column_type = "Text")]
    #[serde(skip_serializing)]
    pub rules: String, // JSON array of StrategyRule
    #[sea_orm(column_type = "Text")]
    #[serde(skip_serializing)]
    pub generated_code: String,
    pub is_running: bool,
    pub is_public: bool,
    pub is_admin_strategy: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
    #[sea_orm(has_many = "super::strategy_subscriptions::Entity")]
    StrategySubscriptions,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::strategy_subscriptions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StrategySubscriptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
