//! `SeaORM` Entity, @generated manually

use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String, // "user", "admin", "franchise"
    pub franchise_id: Option<i64>,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::franchises::Entity",
        from = "Column::FranchiseId",
        to = "super::franchises::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Franchises,
    #[sea_orm(has_one = "super::wallets::Entity")]
    Wallets,
}

impl Related<super::franchises::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Franchises.def()
    }
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
