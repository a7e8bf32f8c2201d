//! Router assembly: service endpoints, one router per resource, the static
//! upload directory and the global layers.

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::database::{DatabaseError, DocumentStore};
use crate::handlers::{self, ResourceContext};
use crate::resource::ResourceStore;
use crate::schema::{catalog, ResourceSchema};
use crate::types::{Operation, Tenant};
use crate::upload::UploadStore;

/// State for the service-level endpoints
#[derive(Clone)]
pub struct AppState {
    pub store: DocumentStore,
    pub resources: Arc<Vec<ResourceInfo>>,
    pub uploads_prefix: String,
}

/// Resource summary shown at `GET /`
#[derive(Debug, Clone, Serialize)]
pub struct ResourceInfo {
    pub tenant: Tenant,
    pub label: &'static str,
    pub path: &'static str,
    pub collection: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_field: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub populates: Option<&'static str>,
}

impl From<&ResourceSchema> for ResourceInfo {
    fn from(schema: &ResourceSchema) -> Self {
        Self {
            tenant: schema.tenant,
            label: schema.label,
            path: schema.path,
            collection: schema.collection,
            upload_field: schema.upload.as_ref().map(|u| u.field),
            populates: schema.reference.as_ref().map(|r| r.field),
        }
    }
}

/// One HTTP endpoint of a resource
#[derive(Debug, Clone, Serialize)]
pub struct RouteEntry {
    pub method: &'static str,
    pub path: String,
    pub tenant: Tenant,
    pub resource: &'static str,
    pub operation: Operation,
}

pub fn route_table(schemas: &[ResourceSchema]) -> Vec<RouteEntry> {
    schemas
        .iter()
        .flat_map(|schema| {
            Operation::ALL.into_iter().map(move |op| {
                let (method, with_id) = op.route();
                RouteEntry {
                    method,
                    path: if with_id { schema.item_path() } else { schema.path.to_string() },
                    tenant: schema.tenant,
                    resource: schema.label,
                    operation: op,
                }
            })
        })
        .collect()
}

/// One store per catalog schema, all sharing the same storage client
pub fn resource_stores(store: &DocumentStore) -> Vec<ResourceStore> {
    catalog::all()
        .into_iter()
        .map(|schema| ResourceStore::new(schema, store.clone()))
        .collect()
}

/// Create every backing collection; run once before serving
pub async fn ensure_collections(resources: &[ResourceStore]) -> Result<(), DatabaseError> {
    for resource in resources {
        resource.ensure().await?;
    }
    info!("Ensured {} collections", resources.len());
    Ok(())
}

pub fn build_app(
    config: &AppConfig,
    store: DocumentStore,
    resources: Vec<ResourceStore>,
    uploads: UploadStore,
) -> Router {
    let state = AppState {
        store,
        resources: Arc::new(resources.iter().map(|r| ResourceInfo::from(r.schema())).collect()),
        uploads_prefix: uploads.public_prefix().to_string(),
    };

    let mut app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(state);

    for resource in resources {
        app = app.merge(handlers::router(ResourceContext {
            store: resource,
            uploads: uploads.clone(),
        }));
    }

    app = app
        .nest_service(uploads.public_prefix(), ServeDir::new(uploads.dir()))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.security.enable_cors {
        app = app.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }
    app
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {}", o);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": "HR Records API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Employee, payslip, letter, receipt and beneficiary records",
        "storage": state.store.kind(),
        "endpoints": {
            "health": "/health",
            "uploads": format!("{}/:file", state.uploads_prefix),
        },
        "resources": state.resources.as_ref(),
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": state.store.kind(),
            })),
        ),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": state.store.kind(),
                    "error": "database unavailable",
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{DocumentBackend, Record};
    use crate::testing::{multipart_body, TestContext};
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use uuid::Uuid;

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: Method, uri: &str) -> Request<Body> {
        Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn route_table_has_five_endpoints_per_resource() {
        let routes = route_table(&catalog::all());
        assert_eq!(routes.len(), 60);
        let employees: Vec<_> = routes
            .iter()
            .filter(|r| r.resource == "Employee")
            .map(|r| format!("{} {}", r.method, r.path))
            .collect();
        assert_eq!(
            employees,
            vec![
                "POST /api/employees",
                "GET /api/employees",
                "GET /api/employees/:id",
                "PUT /api/employees/:id",
                "DELETE /api/employees/:id",
            ]
        );
    }

    /// Backend whose connection is gone: collections exist, every call fails
    struct UnreachableBackend;

    fn refused() -> DatabaseError {
        DatabaseError::QueryError("connection refused".into())
    }

    #[async_trait::async_trait]
    impl DocumentBackend for UnreachableBackend {
        fn kind(&self) -> &'static str {
            "postgres"
        }

        async fn ensure_collection(&self, _collection: &str) -> Result<(), DatabaseError> {
            Ok(())
        }

        async fn insert(&self, _collection: &str, _record: &Record) -> Result<(), DatabaseError> {
            Err(refused())
        }

        async fn find_all(&self, _collection: &str) -> Result<Vec<Record>, DatabaseError> {
            Err(refused())
        }

        async fn find_by_id(
            &self,
            _collection: &str,
            _id: Uuid,
        ) -> Result<Option<Record>, DatabaseError> {
            Err(refused())
        }

        async fn find_by_ids(
            &self,
            _collection: &str,
            _ids: &[Uuid],
        ) -> Result<Vec<Record>, DatabaseError> {
            Err(refused())
        }

        async fn replace(
            &self,
            _collection: &str,
            _record: &Record,
        ) -> Result<Option<Record>, DatabaseError> {
            Err(refused())
        }

        async fn delete(
            &self,
            _collection: &str,
            _id: Uuid,
        ) -> Result<Option<Record>, DatabaseError> {
            Err(refused())
        }

        async fn ping(&self) -> Result<(), DatabaseError> {
            Err(refused())
        }

        async fn close(&self) {}
    }

    #[tokio::test]
    async fn health_reports_degraded_when_storage_is_down() {
        let ctx = TestContext::with_store(DocumentStore::new(Arc::new(UnreachableBackend))).await;
        let (status, body) = ctx.send(empty_request(Method::GET, "/health")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], json!("degraded"));
        assert_eq!(body["database"], json!("postgres"));
        assert!(!body.to_string().contains("refused"));
    }

    #[tokio::test]
    async fn storage_failure_on_list_is_500_without_detail() {
        let ctx = TestContext::with_store(DocumentStore::new(Arc::new(UnreachableBackend))).await;
        let (status, body) = ctx.send(empty_request(Method::GET, "/api/employees")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], json!("Error fetching employee"));
        assert!(!body.to_string().contains("refused"));
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let ctx = TestContext::new().await;
        let (status, body) = ctx.send(empty_request(Method::GET, "/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!("ok"));
        assert_eq!(body["database"], json!("memory"));
    }

    #[tokio::test]
    async fn root_lists_every_resource() {
        let ctx = TestContext::new().await;
        let (status, body) = ctx.send(empty_request(Method::GET, "/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resources"].as_array().map(Vec::len), Some(12));
    }

    #[tokio::test]
    async fn delete_unknown_employee_is_404() {
        let ctx = TestContext::new().await;
        let uri = format!("/api/employees/{}", Uuid::new_v4());
        let (status, body) = ctx.send(empty_request(Method::DELETE, &uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "Employee not found!" }));
    }

    #[tokio::test]
    async fn receipt_crud_round() {
        let ctx = TestContext::new().await;
        let (status, created) = ctx
            .send(json_request(
                Method::POST,
                "/api/receipts",
                json!({ "name": "Donor", "amount": "2500", "pan": "ABCDE1234F" }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["amount"], json!(2500));
        let id = created["_id"].as_str().unwrap().to_string();
        let uri = format!("/api/receipts/{}", id);

        let (status, fetched) = ctx.send(empty_request(Method::GET, &uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (status, updated) = ctx
            .send(json_request(Method::PUT, &uri, json!({ "amount": 3000 })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["amount"], json!(3000));
        assert_eq!(updated["name"], json!("Donor"));

        let (status, body) = ctx.send(empty_request(Method::DELETE, &uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Receipt deleted successfully" }));

        let (status, _) = ctx.send(empty_request(Method::GET, &uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_required_fields_are_400() {
        let ctx = TestContext::new().await;
        let (status, body) = ctx
            .send(json_request(Method::POST, "/api/offerletters", json!({ "name": "A" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!("Error adding offer letter"));
        assert_eq!(body["field_errors"]["details"], json!("This field is required"));
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let ctx = TestContext::new().await;
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/receipts")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _) = ctx.send(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn employee_image_is_stored_and_served() {
        let ctx = TestContext::new().await;
        let (content_type, body) = multipart_body(
            &[("name", "A"), ("phone", "123"), ("salary", "50000")],
            Some(("image", "face.jpg", &b"JPEGBYTES"[..])),
        );
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/employees")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();

        let (status, created) = ctx.send(req).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["salary"], json!(50000));
        let image = created["image"].as_str().unwrap().to_string();
        assert!(image.ends_with(".jpg"));

        let uri = format!("/uploads/{}", image);
        let (status, bytes) = ctx.send_raw(empty_request(Method::GET, &uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&bytes[..], b"JPEGBYTES");
    }

    #[tokio::test]
    async fn nirvin_employee_image_stores_relative_path() {
        let ctx = TestContext::new().await;
        let fields = [
            ("nirvinName", "N"),
            ("nirvinPhone", "1"),
            ("nirvinEmail", "n@example.com"),
            ("nirvinAddress", "Street 1"),
            ("nirvinPosition", "Dev"),
            ("nirvinDateOfJoining", "2024-01-15"),
            ("nirvinPan", "P"),
            ("nirvinAadhar", "A"),
            ("nirvinSalary", "40000"),
            ("nirvinPfNumber", "PF"),
            ("nirvinEsiNumber", "ESI"),
            ("nirvinAccountNumber", "0012"),
            ("nirvinBankName", "Bank"),
        ];
        let file = ("nirvinImage", "n.png", &b"PNG"[..]);
        let (content_type, body) = multipart_body(&fields, Some(file));
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/nirvin-employees")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();

        let (status, created) = ctx.send(req).await;
        assert_eq!(status, StatusCode::CREATED);
        let image = created["nirvinImage"].as_str().unwrap();
        assert!(image.starts_with("uploads/") && image.ends_with(".png"), "{}", image);
        assert_eq!(created["nirvinAccountNumber"], json!("0012"));
    }

    #[tokio::test]
    async fn upload_to_unknown_employee_is_404_and_keeps_the_file() {
        let ctx = TestContext::new().await;
        let file = ("image", "late.jpg", &b"JPEG"[..]);
        let (content_type, body) = multipart_body(&[("name", "A")], Some(file));
        let req = Request::builder()
            .method(Method::PUT)
            .uri(format!("/api/employees/{}", Uuid::new_v4()))
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();

        let (status, body) = ctx.send(req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "Employee not found!" }));
        let saved = std::fs::read_dir(ctx.uploads.dir()).unwrap().count();
        assert_eq!(saved, 1);
    }

    #[tokio::test]
    async fn unexpected_file_field_is_400() {
        let ctx = TestContext::new().await;
        let file = ("photo", "a.jpg", &b"x"[..]);
        let (content_type, body) = multipart_body(&[("name", "A")], Some(file));
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/employees")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();

        let (status, body) = ctx.send(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("Unexpected field: photo"));
    }

    #[tokio::test]
    async fn payslip_with_deleted_employee_keeps_raw_reference() {
        let ctx = TestContext::new().await;
        let (_, employee) = ctx
            .send(json_request(Method::POST, "/api/employees", json!({ "name": "Gone" })))
            .await;
        let employee_id = employee["_id"].as_str().unwrap().to_string();

        let (status, _) = ctx
            .send(json_request(
                Method::POST,
                "/api/payslips",
                json!({
                    "employeeId": employee_id,
                    "netSalary": 900,
                    "dateOfIssuing": "2024-06-30",
                }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        ctx.send(empty_request(Method::DELETE, &format!("/api/employees/{}", employee_id)))
            .await;

        let (status, list) = ctx.send(empty_request(Method::GET, "/api/payslips")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list[0]["employeeId"], json!(employee_id));
        assert_eq!(list[0]["netSalary"], json!(900));
    }
}
