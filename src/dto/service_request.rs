use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::entities::service_request::ServiceRequestStatus;

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct NewServiceRequest {
    #[validate(length(min = 3, message = "Service type must be at least 3 characters"))]
    #[schema(example = "Ajuste de vestido")]
    pub service_type: String,
    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: String,
}

/// Body of the status endpoints. The status is kept as text so that an
/// unknown value is reported as a field error rather than a parse failure.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(default)]
pub struct StatusUpdate {
    #[validate(custom = "validate_service_status")]
    #[schema(example = "in_progress")]
    pub status: String,
}

impl StatusUpdate {
    /// Parsed status; only meaningful after `validate` succeeded.
    pub fn service_status(&self) -> Option<ServiceRequestStatus> {
        self.status.parse().ok()
    }
}

fn validate_service_status(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("Status is required".into());
        return Err(err);
    }
    value.parse::<ServiceRequestStatus>().map(|_| ()).map_err(|_| {
        let mut err = ValidationError::new("status");
        err.message = Some(
            "Status must be one of: pending, in_progress, completed, cancelled".into(),
        );
        err
    })
}
