use sea_orm::{prelude::*, ConnectionTrait, QueryOrder};
use shared::entity::users;
use shared::AppResult;

/// Queries over `users`, usable with a connection or an open transaction
pub struct UserRepository;

impl UserRepository {
    pub async fn find_by_id<C: ConnectionTrait>(db: &C, user_id: i64) -> AppResult<Option<users::Model>> {
        let user = users::Entity::find_by_id(user_id).one(db).await?;
        Ok(user)
    }

    pub async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> AppResult<Option<users::Model>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(db)
            .await?;
        Ok(user)
    }

    pub async fn create<C: ConnectionTrait>(db: &C, active_model: users::ActiveModel) -> AppResult<users::Model> {
        let user = active_model.insert(db).await?;
        Ok(user)
    }

    pub async fn update<C: ConnectionTrait>(db: &C, active_model: users::ActiveModel) -> AppResult<users::Model> {
        let user = active_model.update(db).await?;
        Ok(user)
    }

    /// Users filtered by optional role and a name/email substring
    pub async fn search<C: ConnectionTrait>(
        db: &C,
        role: Option<&str>,
        search: Option<&str>,
    ) -> AppResult<Vec<users::Model>> {
        let mut query = users::Entity::find().order_by_desc(users::Column::Id);
        if let Some(role) = role {
            query = query.filter(users::Column::Role.eq(role));
        }
        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(
                users::Column::Name
                    .contains(term)
                    .or(users::Column::Email.contains(term.to_lowercase())),
            );
        }
        Ok(query.all(db).await?)
    }

    pub async fn list_by_franchise<C: ConnectionTrait>(db: &C, franchise_id: i64) -> AppResult<Vec<users::Model>> {
        let users = users::Entity::find()
            .filter(users::Column::FranchiseId.eq(franchise_id))
            .order_by_desc(users::Column::Id)
            .all(db)
            .await?;
        Ok(users)
    }

    pub async fn count<C: ConnectionTrait>(db: &C) -> AppResult<u64> {
        Ok(users::Entity::find().count(db).await?)
    }

    pub async fn count_active<C: ConnectionTrait>(db: &C) -> AppResult<u64> {
        let count = users::Entity::find()
            .filter(users::Column::IsActive.eq(true))
            .count(db)
            .await?;
        Ok(count)
    }
}
