use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Registration form
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct NewUser {
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    #[schema(example = "maria")]
    pub username: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 2, message = "First name must be at least 2 characters"))]
    pub first_name: String,
    #[validate(length(min = 2, message = "Last name must be at least 2 characters"))]
    pub last_name: String,
    #[validate(email(message = "Must provide a valid email"))]
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FieldErrors;

    fn valid() -> NewUser {
        NewUser {
            username: "maria".into(),
            password: "segredo1".into(),
            first_name: "Maria".into(),
            last_name: "Silva".into(),
            email: "maria@example.com".into(),
            phone: None,
        }
    }

    #[test]
    fn accepts_complete_registration() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn reports_every_short_field() {
        let input = NewUser {
            username: "ma".into(),
            password: "123".into(),
            first_name: "M".into(),
            last_name: "S".into(),
            email: "not-an-email".into(),
            phone: Some("".into()),
        };
        let errors: FieldErrors = input.validate().unwrap_err().into();
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(
            fields,
            vec!["email", "firstName", "lastName", "password", "username"]
        );
    }
}
