use crate::errors::{FieldError, FieldErrors, ServiceError};
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Query, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

fn json_rejection(rejection: JsonRejection) -> ServiceError {
    match rejection {
        JsonRejection::JsonSyntaxError(_) => ServiceError::field("body", "Malformed JSON body"),
        other => ServiceError::field("body", other.body_text()),
    }
}

/// Decodes a request body into `T`.
///
/// Request DTOs default every field, so a failure here is a value of the
/// wrong type. Each top-level key is decoded on its own to name every
/// offending field.
pub(crate) fn decode_body<T: DeserializeOwned>(value: Value) -> Result<T, ServiceError> {
    let err = match serde_json::from_value::<T>(value.clone()) {
        Ok(decoded) => return Ok(decoded),
        Err(err) => err,
    };
    let Value::Object(fields) = value else {
        return Err(ServiceError::field("body", "Request body must be a JSON object"));
    };

    let errors: Vec<FieldError> = fields
        .into_iter()
        .filter_map(|(key, field_value)| {
            let single = Value::Object(Map::from_iter([(key.clone(), field_value)]));
            serde_json::from_value::<T>(single)
                .err()
                .map(|e| FieldError::new(key, e.to_string()))
        })
        .collect();

    if errors.is_empty() {
        Err(ServiceError::field("body", err.to_string()))
    } else {
        Err(ServiceError::Validation(FieldErrors(errors)))
    }
}

async fn json_value<S: Send + Sync>(req: Request, state: &S) -> Result<Value, ServiceError> {
    let Json(value) = Json::<Value>::from_request(req, state)
        .await
        .map_err(json_rejection)?;
    Ok(value)
}

/// JSON body that has passed its `validator` rules.
///
/// Malformed JSON is reported as a field error on `body`, a wrongly typed
/// value as an error on its own field, and rule failures as one field error
/// per offending field. Either way nothing downstream runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let value: T = decode_body(json_value(req, state).await?)?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// JSON body whose rules are checked by the service itself
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(decode_body(json_value(req, state).await?)?))
    }
}

/// Integer id path segment; anything else is a 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathId(pub i32);

#[async_trait]
impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i32>::from_request_parts(parts, state)
            .await
            .map_err(|_| ServiceError::BadRequest("Invalid id".to_string()))?;
        Ok(Self(id))
    }
}

/// Query string with errors reported in the JSON error shape
#[derive(Debug, Clone, Default)]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ServiceError::BadRequest(e.body_text()))?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::{NewMessage, NewProduct};
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn missing_fields_fall_back_to_validation() {
        let input: NewMessage = decode_body(json!({ "email": "ana@x.com" })).unwrap();
        let errors: FieldErrors = input.validate().unwrap_err().into();
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, vec!["message", "name", "subject"]);
    }

    #[test]
    fn every_mistyped_field_is_named() {
        let err = decode_body::<NewProduct>(json!({
            "name": "Vestido Floral",
            "categoryId": "roupas",
            "inStock": "sim",
        }))
        .unwrap_err();
        let ServiceError::Validation(errors) = err else {
            panic!("expected validation error, got {:?}", err);
        };
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, vec!["categoryId", "inStock"]);
        assert!(errors.0.iter().all(|e| !e.message.contains("line")));
    }

    #[test]
    fn non_object_body_is_rejected() {
        assert_matches!(
            decode_body::<NewMessage>(json!([1, 2, 3])),
            Err(ServiceError::Validation(errors)) if errors.0[0].field == "body"
        );
    }
}
