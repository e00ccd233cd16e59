use crate::{
    dto::NewServiceRequest,
    entities::{
        service_request::{self, ServiceRequestStatus},
        user,
    },
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

/// Service request with its owner's profile attached
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ServiceRequestWithUser {
    #[serde(flatten)]
    pub request: service_request::Model,
    pub user: Option<user::Model>,
}

#[derive(Clone)]
pub struct ServiceRequestService {
    db: Arc<DatabaseConnection>,
}

impl ServiceRequestService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<Option<ServiceRequestWithUser>, ServiceError> {
        let found = service_request::Entity::find_by_id(id)
            .find_also_related(user::Entity)
            .one(&*self.db)
            .await?;
        Ok(found.map(|(request, user)| ServiceRequestWithUser { request, user }))
    }

    /// New requests start `pending`, owned by `user_id`.
    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        user_id: i32,
        input: NewServiceRequest,
    ) -> Result<service_request::Model, ServiceError> {
        let now = Utc::now();
        let model = service_request::ActiveModel {
            user_id: Set(user_id),
            service_type: Set(input.service_type),
            description: Set(input.description),
            status: Set(ServiceRequestStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(request_id = model.id, user_id, "Created service request");
        Ok(model)
    }

    /// Sets the status and refreshes `updated_at` in the same UPDATE.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: i32,
        status: ServiceRequestStatus,
    ) -> Result<Option<service_request::Model>, ServiceError> {
        let Some(existing) = service_request::Entity::find_by_id(id).one(&*self.db).await? else {
            return Ok(None);
        };

        let mut active: service_request::ActiveModel = existing.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());
        let model = active.update(&*self.db).await?;

        info!(request_id = id, status = %status, "Updated service request status");
        Ok(Some(model))
    }

    /// Every request, newest first, owners attached
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<ServiceRequestWithUser>, ServiceError> {
        let rows = service_request::Entity::find()
            .find_also_related(user::Entity)
            .order_by_desc(service_request::Column::CreatedAt)
            .order_by_desc(service_request::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(request, user)| ServiceRequestWithUser { request, user })
            .collect())
    }

    /// One user's requests, newest first
    #[instrument(skip(self))]
    pub async fn list_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<service_request::Model>, ServiceError> {
        Ok(service_request::Entity::find()
            .filter(service_request::Column::UserId.eq(user_id))
            .order_by_desc(service_request::Column::CreatedAt)
            .order_by_desc(service_request::Column::Id)
            .all(&*self.db)
            .await?)
    }
}
