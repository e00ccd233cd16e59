use crate::{auth::AdminUser, entities::user, errors::ServiceError, AppState};
use axum::{extract::State, Json};

#[utoipa::path(
    get,
    path = "/api/admin/customers",
    summary = "List customers",
    description = "Non-admin accounts in registration order",
    responses(
        (status = 200, description = "Customers", body = [user::Model]),
        (status = 401, description = "Not authenticated or not admin", body = crate::errors::ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<user::Model>>, ServiceError> {
    Ok(Json(state.services.users.list_customers().await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    summary = "List users",
    description = "Every account, admins included, in registration order",
    responses(
        (status = 200, description = "Users", body = [user::Model]),
        (status = 401, description = "Not authenticated or not admin", body = crate::errors::ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<user::Model>>, ServiceError> {
    Ok(Json(state.services.users.list_users().await?))
}
