pub mod auth;
pub mod categories;
pub mod common;
pub mod customers;
pub mod health;
pub mod messages;
pub mod orders;
pub mod products;
pub mod service_requests;
pub mod testimonials;
pub mod uploads;

use crate::{
    auth::{AuthService, SessionStore},
    config::AppConfig,
    db::DbPool,
    services::{
        CatalogService, ImageStore, MessageService, OrderService, ServiceRequestService,
        TestimonialService, UserService,
    },
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<UserService>,
    pub catalog: Arc<CatalogService>,
    pub service_requests: Arc<ServiceRequestService>,
    pub orders: Arc<OrderService>,
    pub testimonials: Arc<TestimonialService>,
    pub messages: Arc<MessageService>,
    pub auth: Arc<AuthService>,
    pub images: Arc<ImageStore>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, config: &AppConfig, sessions: Arc<dyn SessionStore>) -> Self {
        let users = UserService::new(db_pool.clone());
        let auth = AuthService::new(users.clone(), sessions, config.session_ttl());

        Self {
            users: Arc::new(users),
            catalog: Arc::new(CatalogService::new(db_pool.clone())),
            service_requests: Arc::new(ServiceRequestService::new(db_pool.clone())),
            orders: Arc::new(OrderService::new(db_pool.clone())),
            testimonials: Arc::new(TestimonialService::new(db_pool.clone())),
            messages: Arc::new(MessageService::new(db_pool)),
            auth: Arc::new(auth),
            images: Arc::new(ImageStore::new(config.upload_path(), config.upload_max_bytes)),
        }
    }
}
