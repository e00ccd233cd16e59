use super::common::{created_response, JsonBody, PathId, ValidatedJson};
use crate::{
    auth::{AdminUser, CurrentUser},
    dto::{OrderStatusUpdate, PlaceOrder},
    entities::order,
    errors::ServiceError,
    services::OrderWithDetails,
    AppState,
};
use axum::{extract::State, response::IntoResponse, Json};
use tracing::info;

#[utoipa::path(
    post,
    path = "/api/orders",
    summary = "Place order",
    description = "Creates the order and its lines in one transaction at current product prices",
    request_body = PlaceOrder,
    responses(
        (status = 201, description = "Order placed", body = OrderWithDetails),
        (status = 400, description = "Empty order, bad quantity, unknown or unavailable product", body = crate::errors::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn place_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(input): JsonBody<PlaceOrder>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.place_order(user.id, input).await?;
    Ok(created_response(order))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    summary = "List own orders",
    responses(
        (status = 200, description = "Caller's orders with lines, newest first", body = [OrderWithDetails]),
        (status = 401, description = "Not authenticated", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn list_own_orders(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<OrderWithDetails>>, ServiceError> {
    Ok(Json(state.services.orders.list_for_user(user.id).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    summary = "List all orders",
    responses(
        (status = 200, description = "Every order with customer and lines, newest first", body = [OrderWithDetails]),
        (status = 401, description = "Not authenticated or not admin", body = crate::errors::ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<OrderWithDetails>>, ServiceError> {
    Ok(Json(state.services.orders.list_all().await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    summary = "Get order",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with customer and lines", body = OrderWithDetails),
        (status = 401, description = "Not authenticated or not admin", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn get_order(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    PathId(id): PathId,
) -> Result<Json<OrderWithDetails>, ServiceError> {
    state
        .services
        .orders
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ServiceError::NotFound("Order".to_string()))
}

#[utoipa::path(
    put,
    path = "/api/admin/orders/{id}/status",
    summary = "Update order status",
    params(("id" = i32, Path, description = "Order id")),
    request_body = OrderStatusUpdate,
    responses(
        (status = 200, description = "Status updated", body = order::Model),
        (status = 400, description = "Missing or overlong status", body = crate::errors::ErrorResponse),
        (status = 401, description = "Not authenticated or not admin", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    PathId(id): PathId,
    ValidatedJson(input): ValidatedJson<OrderStatusUpdate>,
) -> Result<Json<order::Model>, ServiceError> {
    let order = state
        .services
        .orders
        .update_status(id, input.status)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Order".to_string()))?;
    info!(admin_id = admin.id, order_id = id, status = %order.status, "Order status changed");
    Ok(Json(order))
}
