use super::common::ValidatedJson;
use crate::{
    auth::{CurrentUser, SessionRecord},
    config::AppConfig,
    dto::{LoginRequest, NewUser},
    entities::user,
    errors::ServiceError,
    AppState,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;

fn session_cookie(config: &AppConfig, session: &SessionRecord) -> Cookie<'static> {
    Cookie::build((config.session_cookie_name.clone(), session.id.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .build()
}

#[utoipa::path(
    post,
    path = "/api/register",
    summary = "Register",
    description = "Create a customer account and start a session",
    request_body = NewUser,
    responses(
        (status = 201, description = "Account created; session cookie set", body = user::Model),
        (status = 400, description = "Invalid or duplicate fields", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(input): ValidatedJson<NewUser>,
) -> Result<impl IntoResponse, ServiceError> {
    let (user, session) = state.services.auth.register(input).await?;
    let jar = jar.add(session_cookie(&state.config, &session));
    Ok((StatusCode::CREATED, jar, Json(user)))
}

#[utoipa::path(
    post,
    path = "/api/login",
    summary = "Log in",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; session cookie set", body = user::Model),
        (status = 400, description = "Missing fields", body = crate::errors::ErrorResponse),
        (status = 401, description = "Invalid username or password", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let (user, session) = state.services.auth.login(input).await?;
    let jar = jar.add(session_cookie(&state.config, &session));
    Ok((jar, Json(user)))
}

#[utoipa::path(
    post,
    path = "/api/logout",
    summary = "Log out",
    responses((status = 200, description = "Session ended and cookie cleared")),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ServiceError> {
    let name = state.config.session_cookie_name.clone();
    if let Some(cookie) = jar.get(&name) {
        state.services.auth.logout(cookie.value()).await?;
    }
    let jar = jar.remove(Cookie::build((name, "")).path("/").build());
    Ok((jar, Json(json!({ "message": "Logged out" }))))
}

#[utoipa::path(
    get,
    path = "/api/user",
    summary = "Current user",
    responses(
        (status = 200, description = "Profile of the signed-in account", body = user::Model),
        (status = 401, description = "Not authenticated", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn current_user(CurrentUser(user): CurrentUser) -> Json<user::Model> {
    Json(user)
}
