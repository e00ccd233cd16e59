use crate::{dto::NewMessage, entities::message, errors::ServiceError};
use chrono::Utc;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Contact-form inbox
#[derive(Clone)]
pub struct MessageService {
    db: Arc<DatabaseConnection>,
}

impl MessageService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<Option<message::Model>, ServiceError> {
        Ok(message::Entity::find_by_id(id).one(&*self.db).await?)
    }

    #[instrument(skip(self, input), fields(subject = %input.subject))]
    pub async fn create(&self, input: NewMessage) -> Result<message::Model, ServiceError> {
        let model = message::ActiveModel {
            name: Set(input.name),
            email: Set(input.email),
            subject: Set(input.subject),
            message: Set(input.message),
            read: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        counter!("atelier_messages_received_total", 1);
        info!(message_id = model.id, "Stored contact message");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn mark_read(&self, id: i32) -> Result<Option<message::Model>, ServiceError> {
        let Some(existing) = self.get(id).await? else {
            return Ok(None);
        };
        if existing.read {
            return Ok(Some(existing));
        }

        let mut active: message::ActiveModel = existing.into();
        active.read = Set(true);
        Ok(Some(active.update(&*self.db).await?))
    }

    /// Newest first
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<message::Model>, ServiceError> {
        Ok(message::Entity::find()
            .order_by_desc(message::Column::CreatedAt)
            .order_by_desc(message::Column::Id)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn list_unread(&self) -> Result<Vec<message::Model>, ServiceError> {
        Ok(message::Entity::find()
            .filter(message::Column::Read.eq(false))
            .order_by_desc(message::Column::CreatedAt)
            .order_by_desc(message::Column::Id)
            .all(&*self.db)
            .await?)
    }
}
