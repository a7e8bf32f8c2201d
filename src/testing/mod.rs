use axum::body::{to_bytes, Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::app::{build_app, ensure_collections, resource_stores};
use crate::config::AppConfig;
use crate::database::DocumentStore;
use crate::upload::UploadStore;

const BOUNDARY: &str = "hr-records-test-boundary";

/// In-process application over a fresh memory store and a temporary
/// upload directory
pub struct TestContext {
    pub store: DocumentStore,
    pub uploads: UploadStore,
    pub app: Router,
    _upload_root: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_store(DocumentStore::memory()).await
    }

    /// Same wiring over a caller-supplied storage client
    pub async fn with_store(store: DocumentStore) -> Self {
        let upload_root = TempDir::new().expect("temp upload dir");
        let mut config = AppConfig::development();
        config.api.enable_request_logging = false;
        config.uploads.dir = upload_root.path().join("uploads");

        let uploads = UploadStore::from_config(&config.uploads);
        uploads.prepare().await.expect("prepare uploads");

        let resources = resource_stores(&store);
        ensure_collections(&resources).await.expect("ensure collections");
        let app = build_app(&config, store.clone(), resources, uploads.clone());

        Self { store, uploads, app, _upload_root: upload_root }
    }

    /// Send a request and read the body as raw bytes
    pub async fn send_raw(&self, req: Request<Body>) -> (StatusCode, Bytes) {
        let response = self.app.clone().oneshot(req).await.expect("infallible router");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("read body");
        (status, bytes)
    }

    /// Send a request and parse the body as JSON (`Null` when empty)
    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = self.send_raw(req).await;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, body)
    }
}

/// Build a `multipart/form-data` body; returns the content type and bytes
pub fn multipart_body(
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((field, file_name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
                 filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn contexts_are_isolated() {
        let a = TestContext::new().await;
        let b = TestContext::new().await;
        assert_ne!(a.uploads.dir(), b.uploads.dir());

        a.store.backend().insert("receipts", &crate::database::Record::new(Default::default()))
            .await
            .unwrap();
        assert_eq!(a.store.backend().find_all("receipts").await.unwrap().len(), 1);
        assert!(b.store.backend().find_all("receipts").await.unwrap().is_empty());
    }

    #[test]
    fn multipart_body_ends_with_closing_boundary() {
        let file = ("image", "a.jpg", &b"xy"[..]);
        let (content_type, body) = multipart_body(&[("name", "A")], Some(file));
        assert!(content_type.ends_with(BOUNDARY));
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("filename=\"a.jpg\""));
        assert!(text.ends_with(&format!("--{}--\r\n", BOUNDARY)));
    }
}
