use crate::{
    dto::NewUser,
    entities::user,
    errors::{FieldError, FieldErrors, ServiceError},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Account storage. Accounts are created and read, never updated or deleted.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
}

impl UserService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: i32) -> Result<Option<user::Model>, ServiceError> {
        Ok(user::Entity::find_by_id(id).one(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<user::Model>, ServiceError> {
        Ok(user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<user::Model>, ServiceError> {
        Ok(user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await?)
    }

    /// Inserts an account. `password_hash` must already be a PHC string;
    /// username and email collisions are reported as field errors.
    #[instrument(skip(self, input, password_hash), fields(username = %input.username))]
    pub async fn create_user(
        &self,
        input: NewUser,
        password_hash: String,
        is_admin: bool,
    ) -> Result<user::Model, ServiceError> {
        let mut conflicts = Vec::new();
        if self.get_user_by_username(&input.username).await?.is_some() {
            conflicts.push(FieldError::new("username", "Username already exists"));
        }
        if self.get_user_by_email(&input.email).await?.is_some() {
            conflicts.push(FieldError::new("email", "Email already registered"));
        }
        if !conflicts.is_empty() {
            return Err(ServiceError::Validation(FieldErrors(conflicts)));
        }

        let model = user::ActiveModel {
            username: Set(input.username),
            password: Set(password_hash),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            email: Set(input.email),
            phone: Set(input.phone.filter(|p| !p.trim().is_empty())),
            is_admin: Set(is_admin),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(user_id = model.id, is_admin, "Created user");
        Ok(model)
    }

    /// All accounts in registration order
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<user::Model>, ServiceError> {
        Ok(user::Entity::find()
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// Non-admin accounts in registration order
    #[instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<user::Model>, ServiceError> {
        Ok(user::Entity::find()
            .filter(user::Column::IsAdmin.eq(false))
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id)
            .all(&*self.db)
            .await?)
    }
}
