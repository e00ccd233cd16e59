use super::common::{created_response, PathId, ValidatedJson};
use crate::{
    auth::{AdminUser, CurrentUser},
    dto::NewTestimonial,
    entities::testimonial,
    errors::ServiceError,
    services::TestimonialWithUser,
    AppState,
};
use axum::{extract::State, response::IntoResponse, Json};

#[utoipa::path(
    get,
    path = "/api/testimonials",
    summary = "List approved testimonials",
    responses(
        (status = 200, description = "Approved testimonials, newest first", body = [TestimonialWithUser]),
    ),
    tag = "testimonials"
)]
pub async fn list_approved_testimonials(
    State(state): State<AppState>,
) -> Result<Json<Vec<TestimonialWithUser>>, ServiceError> {
    Ok(Json(state.services.testimonials.list_approved().await?))
}

#[utoipa::path(
    post,
    path = "/api/testimonials",
    summary = "Submit testimonial",
    description = "Stored unapproved until an admin approves it",
    request_body = NewTestimonial,
    responses(
        (status = 201, description = "Testimonial stored", body = testimonial::Model),
        (status = 400, description = "Invalid testimonial", body = crate::errors::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::errors::ErrorResponse),
    ),
    tag = "testimonials"
)]
pub async fn create_testimonial(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(input): ValidatedJson<NewTestimonial>,
) -> Result<impl IntoResponse, ServiceError> {
    let testimonial = state.services.testimonials.create(user.id, input).await?;
    Ok(created_response(testimonial))
}

#[utoipa::path(
    get,
    path = "/api/admin/testimonials",
    summary = "List all testimonials",
    responses(
        (status = 200, description = "Every testimonial, newest first", body = [TestimonialWithUser]),
        (status = 401, description = "Not authenticated or not admin", body = crate::errors::ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn list_all_testimonials(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<TestimonialWithUser>>, ServiceError> {
    Ok(Json(state.services.testimonials.list_all().await?))
}

#[utoipa::path(
    put,
    path = "/api/admin/testimonials/{id}/approve",
    summary = "Approve testimonial",
    params(("id" = i32, Path, description = "Testimonial id")),
    responses(
        (status = 200, description = "Testimonial approved", body = testimonial::Model),
        (status = 401, description = "Not authenticated or not admin", body = crate::errors::ErrorResponse),
        (status = 404, description = "Testimonial not found", body = crate::errors::ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn approve_testimonial(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    PathId(id): PathId,
) -> Result<Json<testimonial::Model>, ServiceError> {
    state
        .services
        .testimonials
        .approve(id)
        .await?
        .map(Json)
        .ok_or_else(|| ServiceError::NotFound("Testimonial".to_string()))
}
