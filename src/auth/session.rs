use crate::{entities::session, errors::ServiceError};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

const SESSION_ID_LEN: usize = 48;

/// Server-side session keyed by the id carried in the session cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: i32,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    fn issue(user_id: i32, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: generate_session_id(),
            user_id,
            expires_at: now + ttl,
            created_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

impl From<session::Model> for SessionRecord {
    fn from(model: session::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            expires_at: model.expires_at,
            created_at: model.created_at,
        }
    }
}

pub fn generate_session_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}

/// Backing storage for sessions.
///
/// `get` never returns an expired record; expired records found on lookup
/// are removed. Records nobody looks up again are removed by `purge_expired`,
/// which the server runs periodically.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, user_id: i32, ttl: Duration) -> Result<SessionRecord, ServiceError>;
    async fn get(&self, id: &str) -> Result<Option<SessionRecord>, ServiceError>;
    async fn delete(&self, id: &str) -> Result<(), ServiceError>;
    /// Deletes every expired record and returns how many were removed.
    async fn purge_expired(&self) -> Result<u64, ServiceError>;
}

/// Runs `purge_expired` on `store` every `every` until the task is dropped.
pub fn spawn_session_purge(
    store: Arc<dyn SessionStore>,
    every: std::time::Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match store.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => {
                    info!(removed, "Purged expired sessions");
                    counter!("atelier_sessions_purged_total", removed);
                }
                Err(e) => warn!(error = %e, "Session purge failed"),
            }
        }
    })
}

/// Sessions in the `sessions` table
#[derive(Clone)]
pub struct DatabaseSessionStore {
    db: Arc<DatabaseConnection>,
}

impl DatabaseSessionStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for DatabaseSessionStore {
    async fn create(&self, user_id: i32, ttl: Duration) -> Result<SessionRecord, ServiceError> {
        let record = SessionRecord::issue(user_id, ttl);
        session::ActiveModel {
            id: Set(record.id.clone()),
            user_id: Set(record.user_id),
            expires_at: Set(record.expires_at),
            created_at: Set(record.created_at),
        }
        .insert(&*self.db)
        .await?;
        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<Option<SessionRecord>, ServiceError> {
        let Some(model) = session::Entity::find_by_id(id.to_string())
            .one(&*self.db)
            .await?
        else {
            return Ok(None);
        };

        let record = SessionRecord::from(model);
        if record.is_expired() {
            debug!(user_id = record.user_id, "Dropping expired session");
            self.delete(id).await?;
            return Ok(None);
        }
        Ok(Some(record))
    }

    async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        session::Entity::delete_by_id(id.to_string())
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, ServiceError> {
        let result = session::Entity::delete_many()
            .filter(session::Column::ExpiresAt.lte(Utc::now()))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

/// Process-local sessions; lost on restart
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<DashMap<String, SessionRecord>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, user_id: i32, ttl: Duration) -> Result<SessionRecord, ServiceError> {
        let record = SessionRecord::issue(user_id, ttl);
        self.sessions.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<Option<SessionRecord>, ServiceError> {
        let found = self.sessions.get(id).map(|entry| entry.value().clone());
        match found {
            Some(record) if record.is_expired() => {
                self.sessions.remove(id);
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.sessions.remove(id);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, ServiceError> {
        let before = self.sessions.len();
        self.sessions.retain(|_, record| !record.is_expired());
        Ok(before.saturating_sub(self.sessions.len()) as u64)
    }
}
