//! Typed request bodies and their field rules.
//!
//! Every mutating endpoint deserializes into one of these types and runs
//! `validator` over it before any storage call.

pub mod auth;
pub mod catalog;
pub mod message;
pub mod order;
pub mod price;
pub mod service_request;
pub mod testimonial;

pub use auth::{LoginRequest, NewUser};
pub use catalog::{CategoryPatch, NewCategory, NewProduct, ProductPatch, ProductQuery};
pub use message::{MessageQuery, NewMessage};
pub use order::{NewOrder, NewOrderItem, OrderStatusUpdate, PlaceOrder, PlaceOrderLine};
pub use price::PriceValue;
pub use service_request::{NewServiceRequest, StatusUpdate};
pub use testimonial::NewTestimonial;
