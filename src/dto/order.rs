use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::errors::{FieldError, FieldErrors};

fn validate_positive_money(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO {
        Ok(())
    } else {
        let mut err = ValidationError::new("positive");
        err.message = Some("Must be positive".into());
        Err(err)
    }
}

/// Order header insert used by storage; `total` is computed server-side
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub user_id: i32,
    #[validate(custom = "validate_positive_money")]
    pub total: Decimal,
}

/// Order line insert used by storage
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product_id: i32,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    #[validate(custom = "validate_positive_money")]
    pub price: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaceOrderLine {
    #[validate(range(min = 1, message = "Product is required"))]
    pub product_id: i32,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
}

/// Checkout body: the products and quantities to order
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct PlaceOrder {
    pub items: Vec<PlaceOrderLine>,
}

impl PlaceOrder {
    /// Field errors are reported as `items[i].field`.
    pub fn validate_lines(&self) -> Result<(), FieldErrors> {
        if self.items.is_empty() {
            return Err(FieldErrors::single("items", "Order must contain at least one item"));
        }
        let mut errors = Vec::new();
        for (i, line) in self.items.iter().enumerate() {
            if let Err(e) = line.validate() {
                let line_errors: FieldErrors = e.into();
                errors.extend(line_errors.0.into_iter().map(|fe| {
                    FieldError::new(format!("items[{}].{}", i, fe.field), fe.message)
                }));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(FieldErrors(errors))
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(default)]
pub struct OrderStatusUpdate {
    #[validate(custom = "validate_order_status")]
    #[schema(example = "shipped", min_length = 1, max_length = 32)]
    pub status: String,
}

fn validate_order_status(value: &str) -> Result<(), ValidationError> {
    let message = match value.chars().count() {
        0 => "Status is required",
        1..=32 => return Ok(()),
        _ => "Status must be between 1 and 32 characters",
    };
    let mut err = ValidationError::new("status");
    err.message = Some(message.into());
    Err(err)
}
