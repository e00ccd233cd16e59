use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::price::{validate_price, PriceValue};

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct NewCategory {
    #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
    #[schema(example = "Roupas")]
    pub name: String,
    pub description: Option<String>,
}

/// Partial category update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct NewProduct {
    #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
    #[schema(example = "Vestido Floral Artesanal")]
    pub name: String,
    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: String,
    #[validate(custom = "validate_price")]
    #[schema(value_type = String, example = "289,90")]
    pub price: PriceValue,
    #[validate(url(message = "Must provide a valid image URL"))]
    pub image_url: String,
    #[validate(range(min = 1, message = "Category is required"))]
    pub category_id: i32,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

fn default_in_stock() -> bool {
    true
}

/// Partial product update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: Option<String>,
    #[validate(custom = "validate_price")]
    #[schema(value_type = Option<String>)]
    pub price: Option<PriceValue>,
    #[validate(url(message = "Must provide a valid image URL"))]
    pub image_url: Option<String>,
    pub category_id: Option<i32>,
    pub in_stock: Option<bool>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.image_url.is_none()
            && self.category_id.is_none()
            && self.in_stock.is_none()
    }
}

/// Product listing filters
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Restrict to one category
    pub category_id: Option<i32>,
    /// Case-insensitive substring of name or description
    pub q: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FieldErrors;

    fn product_json(price: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "name": "Bolsa de Crochê",
            "description": "Bolsa feita à mão com linha de algodão",
            "price": price,
            "imageUrl": "https://cdn.example.com/bolsa.jpg",
            "categoryId": 2
        })
    }

    #[test]
    fn in_stock_defaults_to_true() {
        let input: NewProduct = serde_json::from_value(product_json("150,00".into())).unwrap();
        assert!(input.in_stock);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn numeric_and_string_prices_validate() {
        let input: NewProduct = serde_json::from_value(product_json(serde_json::json!(99.5))).unwrap();
        assert!(input.validate().is_ok());
    }

    #[test]
    fn invalid_fields_are_named() {
        let mut json = product_json("zero".into());
        json["imageUrl"] = "not a url".into();
        json["description"] = "curta".into();
        let input: NewProduct = serde_json::from_value(json).unwrap();
        let errors: FieldErrors = input.validate().unwrap_err().into();
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, vec!["description", "imageUrl", "price"]);
        let price = errors.0.iter().find(|e| e.field == "price").unwrap();
        assert_eq!(price.message, "Price must be a positive number");
    }

    #[test]
    fn patch_validates_only_present_fields() {
        let patch = ProductPatch {
            price: Some(PriceValue::Text("12,5".into())),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
        assert!(!patch.is_empty());

        let patch = ProductPatch {
            name: Some("ab".into()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn short_category_name_is_rejected() {
        let input = NewCategory {
            name: "ab".into(),
            description: None,
        };
        let errors: FieldErrors = input.validate().unwrap_err().into();
        assert_eq!(errors.0[0].message, "Name must be at least 3 characters");
    }
}
