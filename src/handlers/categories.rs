use super::common::{created_response, no_content_response, PathId, ValidatedJson};
use crate::{
    auth::AdminUser,
    dto::{CategoryPatch, NewCategory},
    entities::category,
    errors::ServiceError,
    AppState,
};
use axum::{extract::State, response::IntoResponse, Json};
use tracing::info;

#[utoipa::path(
    get,
    path = "/api/categories",
    summary = "List categories",
    description = "All categories ordered by name",
    responses(
        (status = 200, description = "Categories", body = [category::Model]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "catalog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<category::Model>>, ServiceError> {
    Ok(Json(state.services.catalog.list_categories().await?))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    summary = "Get category",
    params(("id" = i32, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category", body = category::Model),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
    ),
    tag = "catalog"
)]
pub async fn get_category(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<Json<category::Model>, ServiceError> {
    state
        .services
        .catalog
        .get_category(id)
        .await?
        .map(Json)
        .ok_or_else(|| ServiceError::NotFound("Category".to_string()))
}

#[utoipa::path(
    post,
    path = "/api/admin/categories",
    summary = "Create category",
    request_body = NewCategory,
    responses(
        (status = 201, description = "Category created", body = category::Model),
        (status = 400, description = "Invalid or duplicate name", body = crate::errors::ErrorResponse),
        (status = 401, description = "Not authenticated or not admin", body = crate::errors::ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn create_category(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidatedJson(input): ValidatedJson<NewCategory>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state.services.catalog.create_category(input).await?;
    info!(admin_id = admin.id, category_id = category.id, "Category created");
    Ok(created_response(category))
}

#[utoipa::path(
    put,
    path = "/api/admin/categories/{id}",
    summary = "Update category",
    params(("id" = i32, Path, description = "Category id")),
    request_body = CategoryPatch,
    responses(
        (status = 200, description = "Category updated", body = category::Model),
        (status = 400, description = "Invalid or duplicate name", body = crate::errors::ErrorResponse),
        (status = 401, description = "Not authenticated or not admin", body = crate::errors::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn update_category(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    PathId(id): PathId,
    ValidatedJson(patch): ValidatedJson<CategoryPatch>,
) -> Result<Json<category::Model>, ServiceError> {
    state
        .services
        .catalog
        .update_category(id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| ServiceError::NotFound("Category".to_string()))
}

#[utoipa::path(
    delete,
    path = "/api/admin/categories/{id}",
    summary = "Delete category",
    params(("id" = i32, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 401, description = "Not authenticated or not admin", body = crate::errors::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Category still has products", body = crate::errors::ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    PathId(id): PathId,
) -> Result<impl IntoResponse, ServiceError> {
    if !state.services.catalog.delete_category(id).await? {
        return Err(ServiceError::NotFound("Category".to_string()));
    }
    Ok(no_content_response())
}
