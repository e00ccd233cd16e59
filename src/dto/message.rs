use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Contact form body
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(default)]
pub struct NewMessage {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    #[schema(example = "Ana")]
    pub name: String,
    #[validate(email(message = "Must provide a valid email"))]
    #[schema(example = "ana@x.com")]
    pub email: String,
    #[validate(length(min = 3, message = "Subject must be at least 3 characters"))]
    #[schema(example = "Orçamento")]
    pub subject: String,
    #[validate(length(min = 10, message = "Message must be at least 10 characters"))]
    #[schema(example = "Gostaria de saber o preço")]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MessageQuery {
    /// Only messages not yet marked read
    #[serde(default)]
    pub unread: bool,
}
