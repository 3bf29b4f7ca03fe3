//! Request extractors that validate input before a handler runs.

use agora_core::storage::PhotoUpload;
use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Multipart, Path, Query, Request},
    http::{header::CONTENT_TYPE, request::Parts},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use validator::Validate;

use crate::error::ApiError;

/// Multipart field that carries the photo file.
pub const PHOTO_FIELD: &str = "photo";

/// JSON body deserialized and validated.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Path parameters that failed to parse become a 400 instead of axum's
/// plain-text rejection.
#[derive(Debug, Clone)]
pub struct ValidatedPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Query string deserialized and validated.
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// A form that may carry a photo.
///
/// Accepts either a JSON body (no photo) or `multipart/form-data`, where
/// text fields fill `data` and the optional `photo` file part becomes
/// `photo`. An empty file part counts as no photo.
#[derive(Debug)]
pub struct PhotoForm<T> {
    /// Validated text fields.
    pub data: T,
    /// Uploaded photo, if any.
    pub photo: Option<PhotoUpload>,
}

impl<S, T> FromRequest<S> for PhotoForm<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        let (data, photo) = if is_multipart {
            let multipart = Multipart::from_request(req, state).await?;
            read_multipart::<T>(multipart).await?
        } else {
            let Json(data) = Json::<T>::from_request(req, state).await?;
            (data, None)
        };

        data.validate()?;
        Ok(Self { data, photo })
    }
}

async fn read_multipart<T: DeserializeOwned>(
    mut multipart: Multipart,
) -> Result<(T, Option<PhotoUpload>), ApiError> {
    let mut fields = Map::new();
    let mut photo = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(ToString::to_string) else {
            continue;
        };

        if name == PHOTO_FIELD {
            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field.bytes().await?;
            if !data.is_empty() {
                photo = Some(PhotoUpload {
                    filename,
                    content_type,
                    data,
                });
            }
        } else {
            let text = field.text().await?;
            fields.insert(name, Value::String(text));
        }
    }

    let data = serde_json::from_value(Value::Object(fields))
        .map_err(|e| ApiError::bad_request(format!("Invalid form data: {e}")))?;

    Ok((data, photo))
}
