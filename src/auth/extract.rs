use crate::{entities::user, errors::ServiceError, AppState};
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;

async fn resolve_user(parts: &Parts, state: &AppState) -> Result<Option<user::Model>, ServiceError> {
    let jar = CookieJar::from_headers(&parts.headers);
    let Some(cookie) = jar.get(&state.config.session_cookie_name) else {
        return Ok(None);
    };
    state.services.auth.current_user(cookie.value()).await
}

/// Any signed-in account. Rejects with 401 `not_authenticated`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub user::Model);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve_user(parts, state)
            .await?
            .map(CurrentUser)
            .ok_or(ServiceError::NotAuthenticated)
    }
}

/// A signed-in admin. Signed-in customers get 401 `not_authorized`.
#[derive(Debug, Clone)]
pub struct AdminUser(pub user::Model);

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(ServiceError::NotAuthorized("Admin access required".to_string()));
        }
        Ok(AdminUser(user))
    }
}
