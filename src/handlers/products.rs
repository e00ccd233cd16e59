use super::common::{created_response, no_content_response, PathId, QueryParams, ValidatedJson};
use crate::{
    auth::AdminUser,
    dto::{NewProduct, ProductPatch, ProductQuery},
    entities::product,
    errors::ServiceError,
    services::ProductWithCategory,
    AppState,
};
use axum::{extract::State, response::IntoResponse, Json};
use tracing::info;

#[utoipa::path(
    get,
    path = "/api/products",
    summary = "List products",
    description = "Products ordered by name, optionally filtered by category and a search term",
    params(ProductQuery),
    responses(
        (status = 200, description = "Products with their category", body = [ProductWithCategory]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "catalog"
)]
pub async fn list_products(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ProductQuery>,
) -> Result<Json<Vec<ProductWithCategory>>, ServiceError> {
    Ok(Json(state.services.catalog.list_products(query).await?))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    summary = "Get product",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product with its category", body = ProductWithCategory),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "catalog"
)]
pub async fn get_product(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<Json<ProductWithCategory>, ServiceError> {
    state
        .services
        .catalog
        .get_product(id)
        .await?
        .map(Json)
        .ok_or_else(|| ServiceError::NotFound("Product".to_string()))
}

#[utoipa::path(
    post,
    path = "/api/admin/products",
    summary = "Create product",
    description = "Price may be a number or a string using either ',' or '.' as decimal separator",
    request_body = NewProduct,
    responses(
        (status = 201, description = "Product created", body = product::Model),
        (status = 400, description = "Invalid product data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Not authenticated or not admin", body = crate::errors::ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn create_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidatedJson(input): ValidatedJson<NewProduct>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.catalog.create_product(input).await?;
    info!(admin_id = admin.id, product_id = product.id, "Product created");
    Ok(created_response(product))
}

#[utoipa::path(
    put,
    path = "/api/admin/products/{id}",
    summary = "Update product",
    params(("id" = i32, Path, description = "Product id")),
    request_body = ProductPatch,
    responses(
        (status = 200, description = "Product updated", body = product::Model),
        (status = 400, description = "Invalid product data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Not authenticated or not admin", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn update_product(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    PathId(id): PathId,
    ValidatedJson(patch): ValidatedJson<ProductPatch>,
) -> Result<Json<product::Model>, ServiceError> {
    state
        .services
        .catalog
        .update_product(id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| ServiceError::NotFound("Product".to_string()))
}

#[utoipa::path(
    delete,
    path = "/api/admin/products/{id}",
    summary = "Delete product",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 401, description = "Not authenticated or not admin", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Product appears in orders", body = crate::errors::ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    PathId(id): PathId,
) -> Result<impl IntoResponse, ServiceError> {
    if !state.services.catalog.delete_product(id).await? {
        return Err(ServiceError::NotFound("Product".to_string()));
    }
    Ok(no_content_response())
}
