//! Helpers for router-level tests: an in-memory database, local photo
//! storage in a temp directory, and request builders.

use std::path::PathBuf;

use agora_core::storage::{PhotoStorage, StorageConfig};
use agora_db::migration::{Migrator, MigratorTrait};
use agora_shared::JwtService;
use agora_shared::config::StorageProvider;
use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use crate::{AppState, create_router};

pub const PRIVATE_PEM: &str = include_str!("../tests/fixtures/jwt_private.pem");
pub const PUBLIC_PEM: &str = include_str!("../tests/fixtures/jwt_public.pem");

const BOUNDARY: &str = "agora-test-boundary";

pub const PASSWORD: &str = "correct horse";

/// A router wired to fresh state.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    upload_root: Option<PathBuf>,
}

/// A collected response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub raw: Bytes,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(root) = &self.upload_root {
            let _ = std::fs::remove_dir_all(root);
        }
    }
}

pub async fn test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

pub fn jwt_service(expiry_secs: u64) -> JwtService {
    JwtService::from_pem(PRIVATE_PEM.as_bytes(), PUBLIC_PEM.as_bytes(), expiry_secs)
        .expect("test keys should parse")
}

/// App with local photo storage.
pub async fn spawn_app() -> TestApp {
    let root = std::env::temp_dir().join(format!("agora-api-{}", Uuid::new_v4()));
    let storage = PhotoStorage::from_config(StorageConfig::new(StorageProvider::LocalFs {
        root: root.clone(),
        public_base_url: "http://localhost:8080/uploads".to_string(),
    }))
    .expect("local storage should build");

    let state = AppState::new(test_db().await, jwt_service(600), Some(storage));
    TestApp {
        router: create_router(state.clone()),
        state,
        upload_root: Some(root),
    }
}

/// App with no photo storage configured.
pub async fn spawn_app_without_storage() -> TestApp {
    let state = AppState::new(test_db().await, jwt_service(600), None);
    TestApp {
        router: create_router(state.clone()),
        state,
        upload_root: None,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");

        let status = response.status();
        let headers = response.headers().clone();
        let raw = response
            .into_body()
            .collect()
            .await
            .expect("body should collect")
            .to_bytes();
        let body = serde_json::from_slice(&raw).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
            raw,
        }
    }

    /// Registers a user and returns the serialized user.
    pub async fn register(&self, name: &str, email: &str) -> Value {
        let response = self
            .send(json_request(
                "POST",
                "/users",
                None,
                Some(json!({ "name": name, "email": email, "password": PASSWORD })),
            ))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["user"].clone()
    }

    pub async fn sign_in(&self, email: &str) -> String {
        let response = self
            .send(json_request(
                "POST",
                "/sign-in",
                None,
                Some(json!({ "email": email, "password": PASSWORD })),
            ))
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body["token"]
            .as_str()
            .expect("token should be a string")
            .to_string()
    }

    /// Registers and signs in a user with a unique email.
    pub async fn signed_in_user(&self, name: &str) -> (String, String) {
        let email = format!("{}@example.com", Uuid::new_v4().simple());
        let user = self.register(name, &email).await;
        let token = self.sign_in(&email).await;
        let id = user["id"].as_str().expect("id should be a string").to_string();
        (id, token)
    }

    pub async fn create_post(&self, token: &str, content: &str) -> Value {
        let response = self
            .send(json_request(
                "POST",
                "/posts",
                Some(token),
                Some(json!({ "content": content })),
            ))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["post"].clone()
    }
}

pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// A file part of a multipart request.
pub struct FilePart<'a> {
    pub filename: &'a str,
    pub content_type: &'a str,
    pub data: &'a [u8],
}

pub fn multipart_request(
    method: &str,
    uri: &str,
    token: &str,
    fields: &[(&str, &str)],
    photo: Option<FilePart<'_>>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(file) = photo {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file.filename, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";
