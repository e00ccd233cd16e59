//! Atelier API Library
//!
//! Storefront and back-office HTTP API for a craft studio: catalog,
//! service requests, contact messages, testimonials, orders and image
//! uploads, with cookie sessions and an admin tier.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod dto;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod telemetry;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::db::DbPool;

/// Multipart framing allowance on top of the image size limit
const UPLOAD_BODY_OVERHEAD: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DbPool>,
        config: config::AppConfig,
        sessions: Arc<dyn auth::SessionStore>,
    ) -> Self {
        let services = handlers::AppServices::new(db.clone(), &config, sessions);
        Self {
            db,
            config,
            services,
        }
    }
}

/// Routes mounted under `/api`.
///
/// Public, customer and admin routes share one router; the tier is enforced
/// by the `CurrentUser`/`AdminUser` extractors each handler takes.
pub fn api_routes(upload_limit: usize) -> Router<AppState> {
    let auth = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
        .route("/user", get(handlers::auth::current_user));

    let catalog = Router::new()
        .route("/categories", get(handlers::categories::list_categories))
        .route("/categories/:id", get(handlers::categories::get_category))
        .route("/products", get(handlers::products::list_products))
        .route("/products/:id", get(handlers::products::get_product));

    let customer = Router::new()
        .route(
            "/service-requests",
            get(handlers::service_requests::list_service_requests)
                .post(handlers::service_requests::create_service_request),
        )
        .route("/messages", post(handlers::messages::create_message))
        .route(
            "/testimonials",
            get(handlers::testimonials::list_approved_testimonials)
                .post(handlers::testimonials::create_testimonial),
        )
        .route(
            "/orders",
            get(handlers::orders::list_own_orders).post(handlers::orders::place_order),
        );

    let admin = Router::new()
        .route("/categories", post(handlers::categories::create_category))
        .route(
            "/categories/:id",
            put(handlers::categories::update_category)
                .delete(handlers::categories::delete_category),
        )
        .route("/products", post(handlers::products::create_product))
        .route(
            "/products/:id",
            put(handlers::products::update_product).delete(handlers::products::delete_product),
        )
        .route(
            "/service-requests/:id/status",
            put(handlers::service_requests::update_service_request_status),
        )
        .route("/messages", get(handlers::messages::list_messages))
        .route("/messages/:id", get(handlers::messages::get_message))
        .route("/messages/:id/read", put(handlers::messages::mark_message_read))
        .route("/customers", get(handlers::customers::list_customers))
        .route("/users", get(handlers::customers::list_users))
        .route("/orders", get(handlers::orders::list_orders))
        .route("/orders/:id", get(handlers::orders::get_order))
        .route("/orders/:id/status", put(handlers::orders::update_order_status))
        .route(
            "/testimonials",
            get(handlers::testimonials::list_all_testimonials),
        )
        .route(
            "/testimonials/:id/approve",
            put(handlers::testimonials::approve_testimonial),
        )
        .route(
            "/upload",
            post(handlers::uploads::upload_image)
                .layer(DefaultBodyLimit::max(upload_limit + UPLOAD_BODY_OVERHEAD)),
        );

    Router::new()
        .merge(auth)
        .merge(catalog)
        .merge(customer)
        .nest("/admin", admin)
}

/// The full application: API, health check, uploaded files and the OpenAPI
/// document, wrapped in request-id, logging and tracing layers.
pub fn app(state: AppState) -> Router {
    let upload_dir = state.config.upload_path();
    let upload_limit = state.config.upload_max_bytes;

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api", api_routes(upload_limit))
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .merge(openapi::openapi_routes())
        .layer(TraceLayer::new_for_http().make_span_with(telemetry::RequestSpanMaker))
        .layer(axum::middleware::from_fn(
            telemetry::request_logging_middleware,
        ))
        // Outermost so every other layer and every error body sees the id
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
