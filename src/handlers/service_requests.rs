use super::common::{created_response, PathId, ValidatedJson};
use crate::{
    auth::{AdminUser, CurrentUser},
    dto::{NewServiceRequest, StatusUpdate},
    entities::service_request,
    errors::ServiceError,
    services::ServiceRequestWithUser,
    AppState,
};
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};

#[utoipa::path(
    get,
    path = "/api/service-requests",
    summary = "List service requests",
    description = "Admins receive every request with its owner attached; customers receive only their own",
    responses(
        (status = 200, description = "Admin view", body = [ServiceRequestWithUser]),
        (status = 401, description = "Not authenticated", body = crate::errors::ErrorResponse),
    ),
    tag = "service-requests"
)]
pub async fn list_service_requests(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, ServiceError> {
    let service = &state.services.service_requests;
    if user.is_admin {
        Ok(Json(service.list_all().await?).into_response())
    } else {
        Ok(Json(service.list_for_user(user.id).await?).into_response())
    }
}

#[utoipa::path(
    post,
    path = "/api/service-requests",
    summary = "Submit service request",
    request_body = NewServiceRequest,
    responses(
        (status = 201, description = "Request stored as pending", body = service_request::Model),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::errors::ErrorResponse),
    ),
    tag = "service-requests"
)]
pub async fn create_service_request(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(input): ValidatedJson<NewServiceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let request = state
        .services
        .service_requests
        .create(user.id, input)
        .await?;
    Ok(created_response(request))
}

#[utoipa::path(
    put,
    path = "/api/admin/service-requests/{id}/status",
    summary = "Update service request status",
    params(("id" = i32, Path, description = "Service request id")),
    request_body = StatusUpdate,
    responses(
        (status = 200, description = "Status updated", body = service_request::Model),
        (status = 400, description = "Missing or unknown status", body = crate::errors::ErrorResponse),
        (status = 401, description = "Not authenticated or not admin", body = crate::errors::ErrorResponse),
        (status = 404, description = "Service request not found", body = crate::errors::ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn update_service_request_status(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    PathId(id): PathId,
    ValidatedJson(input): ValidatedJson<StatusUpdate>,
) -> Result<Json<service_request::Model>, ServiceError> {
    let status = input
        .service_status()
        .ok_or_else(|| ServiceError::field("status", "Status is required"))?;
    state
        .services
        .service_requests
        .update_status(id, status)
        .await?
        .map(Json)
        .ok_or_else(|| ServiceError::NotFound("Service request".to_string()))
}
