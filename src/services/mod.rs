//! Storage layer. These services are the only code that talks to the database.
//!
//! Lookups that match nothing return `None`, updates of a missing row return
//! `None` and deletes of a missing row return `false`. Everything else that
//! goes wrong below this layer surfaces as `ServiceError::DatabaseError`.

pub mod catalog;
pub mod messages;
pub mod orders;
pub mod service_requests;
pub mod testimonials;
pub mod uploads;
pub mod users;

use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::ColumnTrait;

pub use catalog::{CatalogService, ProductWithCategory};
pub use messages::MessageService;
pub use orders::{OrderItemWithProduct, OrderService, OrderWithDetails};
pub use service_requests::{ServiceRequestService, ServiceRequestWithUser};
pub use testimonials::{TestimonialService, TestimonialWithUser};
pub use uploads::{ImageStore, StoredImage};
pub use users::UserService;

/// `LOWER(col) LIKE '%needle%'` with LIKE wildcards in `needle` matched literally.
pub(crate) fn contains_ignore_case<C: ColumnTrait>(col: C, needle: &str) -> SimpleExpr {
    let escaped = needle
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    let pattern = LikeExpr::new(format!("%{}%", escaped)).escape('\\');
    Expr::expr(Func::lower(Expr::col((col.entity_name(), col)))).like(pattern)
}
