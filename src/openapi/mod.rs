use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Atelier API",
        version = "1.0.0",
        description = r#"
# Atelier storefront and back office

Catalog browsing, service requests, contact messages, testimonials and orders
for a craft studio, plus the admin operations behind them.

## Authentication

`POST /api/login` (or `/api/register`) sets an http-only session cookie.
Send it back on every request that needs a signed-in user.

- Public routes need no cookie.
- Customer routes answer `401` with code `not_authenticated` without one.
- `/api/admin/*` routes answer `401` with code `not_authorized` for
  signed-in customers.

## Errors

```json
{
  "error": "Bad Request",
  "code": "validation_error",
  "message": "Validation failed",
  "errors": [{ "field": "price", "message": "Price must be a positive number" }],
  "request_id": "8d2f...",
  "timestamp": "2026-01-01T00:00:00Z"
}
```
        "#,
    ),
    tags(
        (name = "auth", description = "Registration and sessions"),
        (name = "catalog", description = "Public catalog"),
        (name = "service-requests", description = "Customer service requests"),
        (name = "messages", description = "Contact form"),
        (name = "testimonials", description = "Customer testimonials"),
        (name = "orders", description = "Customer orders"),
        (name = "admin", description = "Back office"),
        (name = "health", description = "Health check")
    ),
    paths(
        // Auth
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::auth::current_user,

        // Catalog
        crate::handlers::categories::list_categories,
        crate::handlers::categories::get_category,
        crate::handlers::categories::create_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::uploads::upload_image,

        // Service requests
        crate::handlers::service_requests::list_service_requests,
        crate::handlers::service_requests::create_service_request,
        crate::handlers::service_requests::update_service_request_status,

        // Messages
        crate::handlers::messages::create_message,
        crate::handlers::messages::list_messages,
        crate::handlers::messages::get_message,
        crate::handlers::messages::mark_message_read,

        // Testimonials
        crate::handlers::testimonials::list_approved_testimonials,
        crate::handlers::testimonials::create_testimonial,
        crate::handlers::testimonials::list_all_testimonials,
        crate::handlers::testimonials::approve_testimonial,

        // Orders
        crate::handlers::orders::place_order,
        crate::handlers::orders::list_own_orders,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order_status,

        // Customers
        crate::handlers::customers::list_customers,
        crate::handlers::customers::list_users,

        crate::handlers::health::health_check,
    ),
    components(
        schemas(
            crate::entities::user::Model,
            crate::entities::category::Model,
            crate::entities::product::Model,
            crate::entities::service_request::Model,
            crate::entities::service_request::ServiceRequestStatus,
            crate::entities::order::Model,
            crate::entities::order_item::Model,
            crate::entities::testimonial::Model,
            crate::entities::message::Model,

            crate::dto::NewUser,
            crate::dto::LoginRequest,
            crate::dto::NewCategory,
            crate::dto::CategoryPatch,
            crate::dto::NewProduct,
            crate::dto::ProductPatch,
            crate::dto::NewServiceRequest,
            crate::dto::StatusUpdate,
            crate::dto::NewMessage,
            crate::dto::NewTestimonial,
            crate::dto::PlaceOrder,
            crate::dto::PlaceOrderLine,
            crate::dto::OrderStatusUpdate,

            crate::services::ProductWithCategory,
            crate::services::ServiceRequestWithUser,
            crate::services::TestimonialWithUser,
            crate::services::OrderWithDetails,
            crate::services::OrderItemWithProduct,
            crate::handlers::uploads::UploadResponse,
            crate::handlers::health::HealthResponse,

            // Error types
            crate::errors::ErrorResponse,
            crate::errors::FieldError
        )
    )
)]
pub struct ApiDoc;

/// `GET /api-docs/openapi.json`
pub fn openapi_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}
