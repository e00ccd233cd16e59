use super::common::{created_response, PathId, QueryParams, ValidatedJson};
use crate::{
    auth::AdminUser,
    dto::{MessageQuery, NewMessage},
    entities::message,
    errors::ServiceError,
    AppState,
};
use axum::{extract::State, response::IntoResponse, Json};

#[utoipa::path(
    post,
    path = "/api/messages",
    summary = "Send contact message",
    request_body = NewMessage,
    responses(
        (status = 201, description = "Message stored unread", body = message::Model),
        (status = 400, description = "Invalid message", body = crate::errors::ErrorResponse),
    ),
    tag = "messages"
)]
pub async fn create_message(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<NewMessage>,
) -> Result<impl IntoResponse, ServiceError> {
    let message = state.services.messages.create(input).await?;
    Ok(created_response(message))
}

#[utoipa::path(
    get,
    path = "/api/admin/messages",
    summary = "List messages",
    params(MessageQuery),
    responses(
        (status = 200, description = "Messages, newest first", body = [message::Model]),
        (status = 401, description = "Not authenticated or not admin", body = crate::errors::ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn list_messages(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    QueryParams(query): QueryParams<MessageQuery>,
) -> Result<Json<Vec<message::Model>>, ServiceError> {
    let messages = if query.unread {
        state.services.messages.list_unread().await?
    } else {
        state.services.messages.list_all().await?
    };
    Ok(Json(messages))
}

#[utoipa::path(
    get,
    path = "/api/admin/messages/{id}",
    summary = "Get message",
    params(("id" = i32, Path, description = "Message id")),
    responses(
        (status = 200, description = "Message", body = message::Model),
        (status = 401, description = "Not authenticated or not admin", body = crate::errors::ErrorResponse),
        (status = 404, description = "Message not found", body = crate::errors::ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn get_message(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    PathId(id): PathId,
) -> Result<Json<message::Model>, ServiceError> {
    state
        .services
        .messages
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ServiceError::NotFound("Message".to_string()))
}

#[utoipa::path(
    put,
    path = "/api/admin/messages/{id}/read",
    summary = "Mark message read",
    params(("id" = i32, Path, description = "Message id")),
    responses(
        (status = 200, description = "Message marked read", body = message::Model),
        (status = 401, description = "Not authenticated or not admin", body = crate::errors::ErrorResponse),
        (status = 404, description = "Message not found", body = crate::errors::ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn mark_message_read(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    PathId(id): PathId,
) -> Result<Json<message::Model>, ServiceError> {
    state
        .services
        .messages
        .mark_read(id)
        .await?
        .map(Json)
        .ok_or_else(|| ServiceError::NotFound("Message".to_string()))
}
