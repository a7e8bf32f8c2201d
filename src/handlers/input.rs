use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, StatusCode},
};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// One file part of a multipart body
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

/// Create/update body: a JSON object, or `multipart/form-data` whose text
/// parts become string fields and whose file parts are collected as-is.
#[derive(Debug, Default)]
pub struct RecordInput {
    pub fields: Map<String, Value>,
    pub files: Vec<UploadedFile>,
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

#[async_trait]
impl<S> FromRequest<S> for RecordInput
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_multipart(&req) {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request("Invalid multipart request", e.body_text()))?;
            return read_multipart(multipart).await;
        }

        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::payload_too_large(e.body_text())
            } else {
                ApiError::bad_request("Invalid request body", e.body_text())
            }
        })?;
        parse_json_object(&bytes).map(|fields| RecordInput { fields, files: Vec::new() })
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<RecordInput, ApiError> {
    let mut input = RecordInput::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let bytes = field.bytes().await?;
                input.files.push(UploadedFile { field: name, file_name: Some(file_name), bytes });
            }
            None => {
                let text = field.text().await?;
                input.fields.insert(name, Value::String(text));
            }
        }
    }

    Ok(input)
}

/// An empty body reads as `{}`; anything else must be a JSON object
pub fn parse_json_object(bytes: &[u8]) -> Result<Map<String, Value>, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::invalid_json("Request body must be a JSON object")),
        Err(e) => Err(ApiError::invalid_json(e.to_string())),
    }
}
