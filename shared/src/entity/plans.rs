//! `SeaORM` Entity, @generated manually

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize)]
#[sea_orm(table_name = "plans")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub price: Decimal,
    pub duration_days: i32,
    #[sea_orm(column_type = "Text")]
    #[serde(skip_serializing)]
    pub features: String, // JSON array of strings
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::plan_subscriptions::Entity")]
    PlanSubscriptions,
}

impl Related<super::plan_subscriptions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlanSubscriptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
