use crate::{
    auth::AdminUser, config::AppConfig, errors::ServiceError, services::ImageStore, AppState,
};
use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

/// Multipart field the image must be sent under
pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Absolute URL the stored image is served from
    pub image_url: String,
    pub filename: String,
    #[serde(rename = "originalname")]
    pub original_name: Option<String>,
}

fn multipart_error(images: &ImageStore, err: MultipartError) -> ServiceError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        images.too_large_error()
    } else {
        ServiceError::BadRequest(err.body_text())
    }
}

/// Reads a field into memory, giving up as soon as it exceeds the limit.
async fn read_capped(images: &ImageStore, field: &mut Field<'_>) -> Result<Vec<u8>, ServiceError> {
    let mut data = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(images, e))?
    {
        if data.len() + chunk.len() > images.max_bytes() {
            return Err(images.too_large_error());
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

fn public_base_url(config: &AppConfig, headers: &HeaderMap) -> String {
    if let Some(base) = config.public_base_url.as_deref() {
        return base.trim_end_matches('/').to_string();
    }
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get(header::HOST))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{}://{}", scheme, host)
}

#[utoipa::path(
    post,
    path = "/api/admin/upload",
    summary = "Upload product image",
    description = "Accepts one JPEG, PNG, GIF or WebP file under the `image` field, at most 5 MiB by default",
    request_body(content_type = "multipart/form-data", description = "Form with an `image` file field"),
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Missing file, wrong type or too large", body = crate::errors::ErrorResponse),
        (status = 401, description = "Not authenticated or not admin", body = crate::errors::ErrorResponse),
    ),
    tag = "admin"
)]
pub async fn upload_image(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ServiceError> {
    let images = &state.services.images;
    let mut multipart = multipart.map_err(|e| ServiceError::BadRequest(e.body_text()))?;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(images, e))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let extension = ImageStore::check_type(field.content_type())?;
        let original_name = field.file_name().map(str::to_string);
        let bytes = match read_capped(images, &mut field).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(admin_id = admin.id, error = %err, "Rejected image upload");
                return Err(err);
            }
        };
        if bytes.is_empty() {
            return Err(ServiceError::BadRequest("No file uploaded".to_string()));
        }

        let stored = images.store(extension, &bytes).await?;
        let image_url = format!(
            "{}/uploads/{}",
            public_base_url(&state.config, &headers),
            stored.filename
        );
        info!(admin_id = admin.id, image_url = %image_url, "Image uploaded");

        return Ok(Json(UploadResponse {
            image_url,
            filename: stored.filename,
            original_name,
        }));
    }

    Err(ServiceError::BadRequest("No file uploaded".to_string()))
}
