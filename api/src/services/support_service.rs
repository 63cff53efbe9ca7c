use std::sync::Arc;

use chrono::Utc;
use sea_orm::{prelude::*, DatabaseConnection, QueryOrder, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use shared::entity::{support_tickets, ticket_replies, users};
use shared::templates::markdown_to_html;
use shared::{AppError, AppResult, Notifier, Role, TicketPriority, TicketStatus};
use tracing::info;
use uuid::Uuid;

use super::required_text;

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub priority: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ReplyView {
    #[serde(flatten)]
    pub reply: ticket_replies::Model,
    pub message_html: String,
}

#[derive(Debug, Serialize)]
pub struct TicketDetail {
    #[serde(flatten)]
    pub ticket: support_tickets::Model,
    pub message_html: String,
    pub replies: Vec<ReplyView>,
}

fn is_staff(user: &users::Model) -> bool {
    user.role == Role::Admin.as_str()
}

/// Status changes allowed for the actor; owners may only close their ticket
pub fn can_change_status(staff: bool, to: TicketStatus) -> bool {
    staff || to == TicketStatus::Closed
}

pub struct SupportService {
    db: Arc<DatabaseConnection>,
    notifier: Notifier,
}

impl SupportService {
    pub fn new(db: Arc<DatabaseConnection>, notifier: Notifier) -> Self {
        Self { db, notifier }
    }

    pub async fn create(&self, user_id: i64, req: CreateTicketRequest) -> AppResult<support_tickets::Model> {
        let subject = required_text("subject", &req.subject, 200)?;
        let message = required_text("message", &req.message, 10_000)?;
        let priority = match req.priority.as_deref() {
            Some(p) => TicketPriority::parse(p)?,
            None => TicketPriority::Medium,
        };

        let now = Utc::now();
        let ticket = support_tickets::ActiveModel {
            reference: Set(Uuid::new_v4().to_string()),
            user_id: Set(user_id),
            subject: Set(subject),
            message: Set(message),
            status: Set(TicketStatus::Open.as_str().to_string()),
            priority: Set(priority.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        info!("🎫 Ticket {} opened by user {}", ticket.reference, user_id);
        self.notifier.emit_dashboard_update(user_id, "support");
        Ok(ticket)
    }

    /// Own tickets, or every ticket for support staff
    pub async fn list(&self, actor: &users::Model, status: Option<&str>) -> AppResult<Vec<support_tickets::Model>> {
        let mut query = support_tickets::Entity::find()
            .order_by_desc(support_tickets::Column::UpdatedAt)
            .order_by_desc(support_tickets::Column::Id);
        if !is_staff(actor) {
            query = query.filter(support_tickets::Column::UserId.eq(actor.id));
        }
        if let Some(status) = status.map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(support_tickets::Column::Status.eq(TicketStatus::parse(status)?.as_str()));
        }
        Ok(query.all(self.db.as_ref()).await?)
    }

    pub async fn get(&self, actor: &users::Model, id: i64) -> AppResult<TicketDetail> {
        let ticket = self.find_visible(self.db.as_ref(), actor, id).await?;
        let replies = ticket_replies::Entity::find()
            .filter(ticket_replies::Column::TicketId.eq(ticket.id))
            .order_by_asc(ticket_replies::Column::CreatedAt)
            .order_by_asc(ticket_replies::Column::Id)
            .all(self.db.as_ref())
            .await?;

        Ok(TicketDetail {
            message_html: markdown_to_html(&ticket.message),
            ticket,
            replies: replies
                .into_iter()
                .map(|reply| ReplyView {
                    message_html: markdown_to_html(&reply.message),
                    reply,
                })
                .collect(),
        })
    }

    pub async fn reply(&self, actor: &users::Model, id: i64, req: ReplyRequest) -> AppResult<ReplyView> {
        let message = required_text("message", &req.message, 10_000)?;
        let staff = is_staff(actor);

        let txn = self.db.begin().await?;
        let ticket = self.find_visible(&txn, actor, id).await?;
        if ticket.status == TicketStatus::Closed.as_str() {
            return Err(AppError::conflict("ticket is closed"));
        }

        let now = Utc::now();
        let reply = ticket_replies::ActiveModel {
            ticket_id: Set(ticket.id),
            user_id: Set(actor.id),
            message: Set(message),
            is_staff: Set(staff),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let owner_id = ticket.user_id;
        let picks_up = staff && ticket.status == TicketStatus::Open.as_str();
        let mut active: support_tickets::ActiveModel = ticket.into();
        if picks_up {
            active.status = Set(TicketStatus::InProgress.as_str().to_string());
        }
        active.updated_at = Set(now);
        active.update(&txn).await?;
        txn.commit().await?;

        self.notifier.emit_dashboard_update(owner_id, "support");
        Ok(ReplyView {
            message_html: markdown_to_html(&reply.message),
            reply,
        })
    }

    pub async fn set_status(&self, actor: &users::Model, id: i64, status: &str) -> AppResult<support_tickets::Model> {
        let status = TicketStatus::parse(status)?;
        let ticket = self.find_visible(self.db.as_ref(), actor, id).await?;
        if !can_change_status(is_staff(actor), status) {
            return Err(AppError::forbidden("only support staff can reopen a ticket"));
        }

        let owner_id = ticket.user_id;
        let mut active: support_tickets::ActiveModel = ticket.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(Utc::now());
        let ticket = active.update(self.db.as_ref()).await?;

        info!("Ticket {} is now {}", ticket.reference, status);
        self.notifier.emit_dashboard_update(owner_id, "support");
        Ok(ticket)
    }

    async fn find_visible<C: ConnectionTrait>(
        &self,
        db: &C,
        actor: &users::Model,
        id: i64,
    ) -> AppResult<support_tickets::Model> {
        let mut query = support_tickets::Entity::find_by_id(id);
        if !is_staff(actor) {
            query = query.filter(support_tickets::Column::UserId.eq(actor.id));
        }
        query.one(db).await?.ok_or_else(|| AppError::not_found("ticket"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_may_only_close() {
        assert!(can_change_status(false, TicketStatus::Closed));
        assert!(!can_change_status(false, TicketStatus::Open));
        assert!(!can_change_status(false, TicketStatus::InProgress));
        assert!(can_change_status(true, TicketStatus::Open));
    }
}
