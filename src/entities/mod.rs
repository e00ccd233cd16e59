//! Persisted record types. One module per table.

pub mod category;
pub mod message;
pub mod order;
pub mod order_item;
pub mod product;
pub mod service_request;
pub mod session;
pub mod testimonial;
pub mod user;
