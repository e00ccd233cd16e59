/*!
 * # Authentication
 *
 * Username/password accounts with server-side sessions.
 *
 * - Passwords are hashed with Argon2id and a random salt; only the PHC
 *   string is stored.
 * - A successful register or login issues a session whose id travels in an
 *   http-only cookie.
 * - Handlers obtain the caller through the [`CurrentUser`] and
 *   [`AdminUser`] extractors.
 */

mod extract;
pub mod session;

pub use extract::{AdminUser, CurrentUser};
pub use session::{
    spawn_session_purge, DatabaseSessionStore, InMemorySessionStore, SessionRecord, SessionStore,
};

use crate::{
    dto::{LoginRequest, NewUser},
    entities::user,
    errors::ServiceError,
    services::UserService,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Duration;
use metrics::counter;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

/// Hashes `password` into a PHC string. Runs on the blocking pool.
pub async fn hash_password(password: String) -> Result<String, ServiceError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ServiceError::HashError(e.to_string()))
    })
    .await
    .map_err(|e| ServiceError::InternalError(format!("hashing task failed: {}", e)))?
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub async fn verify_password(password: String, stored_hash: String) -> Result<bool, ServiceError> {
    tokio::task::spawn_blocking(move || {
        let parsed =
            PasswordHash::new(&stored_hash).map_err(|e| ServiceError::HashError(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| ServiceError::InternalError(format!("verification task failed: {}", e)))?
}

#[derive(Clone)]
pub struct AuthService {
    users: UserService,
    sessions: Arc<dyn SessionStore>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(users: UserService, sessions: Arc<dyn SessionStore>, session_ttl: Duration) -> Self {
        Self {
            users,
            sessions,
            session_ttl,
        }
    }

    /// Creates a customer account and signs it in.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register(
        &self,
        input: NewUser,
    ) -> Result<(user::Model, SessionRecord), ServiceError> {
        input.validate()?;
        let user = self.create_account(input, false).await?;
        let session = self.sessions.create(user.id, self.session_ttl).await?;
        counter!("atelier_auth_events_total", 1, "event" => "register");
        Ok((user, session))
    }

    /// Creates an account with the admin flag set. Used by the seed tool and tests.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn create_admin(&self, input: NewUser) -> Result<user::Model, ServiceError> {
        input.validate()?;
        self.create_account(input, true).await
    }

    async fn create_account(&self, mut input: NewUser, is_admin: bool) -> Result<user::Model, ServiceError> {
        let password = std::mem::take(&mut input.password);
        let hash = hash_password(password).await?;
        self.users.create_user(input, hash, is_admin).await
    }

    /// Unknown usernames and wrong passwords fail identically.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn login(
        &self,
        input: LoginRequest,
    ) -> Result<(user::Model, SessionRecord), ServiceError> {
        input.validate()?;
        let Some(user) = self.users.get_user_by_username(&input.username).await? else {
            counter!("atelier_auth_events_total", 1, "event" => "login_failed");
            return Err(ServiceError::InvalidCredentials);
        };

        if !verify_password(input.password, user.password.clone()).await? {
            warn!(user_id = user.id, "Rejected login with wrong password");
            counter!("atelier_auth_events_total", 1, "event" => "login_failed");
            return Err(ServiceError::InvalidCredentials);
        }

        let session = self.sessions.create(user.id, self.session_ttl).await?;
        info!(user_id = user.id, "User logged in");
        counter!("atelier_auth_events_total", 1, "event" => "login");
        Ok((user, session))
    }

    #[instrument(skip_all)]
    pub async fn logout(&self, session_id: &str) -> Result<(), ServiceError> {
        self.sessions.delete(session_id).await
    }

    /// The account behind a live session, if any.
    #[instrument(skip_all)]
    pub async fn current_user(&self, session_id: &str) -> Result<Option<user::Model>, ServiceError> {
        let Some(session) = self.sessions.get(session_id).await? else {
            return Ok(None);
        };
        self.users.get_user(session.user_id).await
    }
}
