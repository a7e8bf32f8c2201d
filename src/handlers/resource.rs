//! The five record endpoints, shared by every resource.
//!
//! Each resource gets its own router whose state carries its
//! `ResourceStore`, so handlers never look schemas up at request time.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::error::ApiError;
use crate::handlers::input::{RecordInput, UploadedFile};
use crate::middleware::{ApiResponse, ApiResult};
use crate::resource::ResourceStore;
use crate::types::Operation;
use crate::upload::UploadStore;

#[derive(Clone)]
pub struct ResourceContext {
    pub store: ResourceStore,
    pub uploads: UploadStore,
}

/// POST /api/<resource>
pub async fn create(State(ctx): State<ResourceContext>, input: RecordInput) -> ApiResult<Value> {
    let fields = attach_upload(&ctx, input, Operation::Create).await?;
    let record = ctx.store.create(fields).await?;
    Ok(ApiResponse::created(ctx.store.render(&record)))
}

/// GET /api/<resource>
pub async fn list(State(ctx): State<ResourceContext>) -> ApiResult<Vec<Value>> {
    Ok(ApiResponse::success(ctx.store.list().await?))
}

/// GET /api/<resource>/:id
pub async fn get_one(
    State(ctx): State<ResourceContext>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    Ok(ApiResponse::success(ctx.store.get(&id).await?))
}

/// PUT /api/<resource>/:id
pub async fn update(
    State(ctx): State<ResourceContext>,
    Path(id): Path<String>,
    input: RecordInput,
) -> ApiResult<Value> {
    let fields = attach_upload(&ctx, input, Operation::Update).await?;
    let record = ctx.store.update(&id, fields).await?;
    Ok(ApiResponse::success(ctx.store.render(&record)))
}

/// DELETE /api/<resource>/:id
pub async fn delete(
    State(ctx): State<ResourceContext>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    ctx.store.delete(&id).await?;
    let label = ctx.store.schema().label;
    Ok(ApiResponse::success(json!({ "message": format!("{} deleted successfully", label) })))
}

/// Store an accepted upload and put its reference into the fields.
/// Only an upload can set the upload field; a text value for it is ignored.
async fn attach_upload(
    ctx: &ResourceContext,
    input: RecordInput,
    op: Operation,
) -> Result<Map<String, Value>, ApiError> {
    let RecordInput { mut fields, files } = input;
    let schema = ctx.store.schema();

    let file = single_file(files, schema.upload.as_ref().map(|u| u.field))
        .map_err(|detail| {
            warn!("Rejected upload for {}: {}", schema.collection, detail);
            ApiError::bad_request(ctx.store.error_message(op), detail)
        })?;

    let Some(spec) = &schema.upload else {
        return Ok(fields);
    };
    fields.remove(spec.field);

    // Written before casting or the id lookup; a later 400/404 leaves the file behind
    if let Some(file) = file {
        let stored = ctx.uploads.save(file.file_name.as_deref(), &file.bytes).await?;
        let reference = ctx.uploads.reference(&stored, spec.reference);
        fields.insert(spec.field.to_string(), Value::String(reference));
    }
    Ok(fields)
}

/// At most one file, and only under the accepted field name
fn single_file(
    files: Vec<UploadedFile>,
    accepted: Option<&str>,
) -> Result<Option<UploadedFile>, String> {
    let mut files = files.into_iter();
    let Some(file) = files.next() else {
        return Ok(None);
    };
    if accepted != Some(file.field.as_str()) {
        return Err(format!("Unexpected field: {}", file.field));
    }
    if let Some(extra) = files.next() {
        return Err(format!("Unexpected field: {}", extra.field));
    }
    Ok(Some(file))
}

/// Routes for one resource: collection routes and record routes
pub fn router(ctx: ResourceContext) -> Router {
    let path = ctx.store.schema().path;
    let item_path = ctx.store.schema().item_path();

    Router::new()
        .route(path, post(create).get(list))
        .route(&item_path, get(get_one).put(update).delete(delete))
        .with_state(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    fn file(field: &str) -> UploadedFile {
        UploadedFile {
            field: field.to_string(),
            file_name: Some("a.jpg".to_string()),
            bytes: Bytes::from_static(b"x"),
        }
    }

    #[test]
    fn accepts_one_file_on_the_upload_field() {
        assert!(single_file(vec![], Some("image")).unwrap().is_none());
        assert!(single_file(vec![], None).unwrap().is_none());
        let accepted = single_file(vec![file("image")], Some("image")).unwrap();
        assert_eq!(accepted.map(|f| f.field), Some("image".to_string()));
    }

    #[test]
    fn rejects_unexpected_or_extra_files() {
        assert_eq!(
            single_file(vec![file("photo")], Some("image")).unwrap_err(),
            "Unexpected field: photo"
        );
        assert!(single_file(vec![file("image"), file("image")], Some("image")).is_err());
        assert!(single_file(vec![file("image")], None).is_err());
    }
}
