use crate::{
    dto::NewTestimonial,
    entities::{testimonial, user},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

/// Testimonial with its author's profile attached
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TestimonialWithUser {
    #[serde(flatten)]
    pub testimonial: testimonial::Model,
    pub user: Option<user::Model>,
}

#[derive(Clone)]
pub struct TestimonialService {
    db: Arc<DatabaseConnection>,
}

impl TestimonialService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<Option<TestimonialWithUser>, ServiceError> {
        let found = testimonial::Entity::find_by_id(id)
            .find_also_related(user::Entity)
            .one(&*self.db)
            .await?;
        Ok(found.map(|(testimonial, user)| TestimonialWithUser { testimonial, user }))
    }

    /// Stored unapproved; it becomes public once an admin approves it.
    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        user_id: i32,
        input: NewTestimonial,
    ) -> Result<testimonial::Model, ServiceError> {
        let model = testimonial::ActiveModel {
            user_id: Set(user_id),
            text: Set(input.text),
            rating: Set(input.rating),
            approved: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(testimonial_id = model.id, user_id, "Created testimonial");
        Ok(model)
    }

    /// Flags exactly one testimonial as approved.
    #[instrument(skip(self))]
    pub async fn approve(&self, id: i32) -> Result<Option<testimonial::Model>, ServiceError> {
        let result = testimonial::Entity::update_many()
            .col_expr(testimonial::Column::Approved, Expr::value(true))
            .filter(testimonial::Column::Id.eq(id))
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Ok(None);
        }

        info!(testimonial_id = id, "Approved testimonial");
        Ok(testimonial::Entity::find_by_id(id).one(&*self.db).await?)
    }

    /// Public listing: approved only, newest first
    #[instrument(skip(self))]
    pub async fn list_approved(&self) -> Result<Vec<TestimonialWithUser>, ServiceError> {
        self.list(true).await
    }

    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<TestimonialWithUser>, ServiceError> {
        self.list(false).await
    }

    async fn list(&self, approved_only: bool) -> Result<Vec<TestimonialWithUser>, ServiceError> {
        let mut select = testimonial::Entity::find().find_also_related(user::Entity);
        if approved_only {
            select = select.filter(testimonial::Column::Approved.eq(true));
        }
        let rows = select
            .order_by_desc(testimonial::Column::CreatedAt)
            .order_by_desc(testimonial::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(testimonial, user)| TestimonialWithUser { testimonial, user })
            .collect())
    }
}
