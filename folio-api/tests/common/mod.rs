//! Common test utilities for the API integration tests
//!
//! Builds the real router over the in-memory store and a throwaway media
//! root, so no database is required.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use folio_api::app::{build_router, AppState};
use folio_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig, MediaConfig};
use folio_shared::auth::jwt::{create_token, Claims, TokenType};
use folio_shared::auth::password::hash_password;
use folio_shared::files::backend::FilesystemStore;
use folio_shared::models::user::{CreateUser, User};
use folio_shared::store::{MemoryStore, Store};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret-at-least-32-bytes";
pub const PASSWORD: &str = "correct horse battery";
const BOUNDARY: &str = "folio-test-boundary";

/// Test context containing the router and two registered users
pub struct TestContext {
    pub app: Router,
    pub media: TempDir,
    pub alice: User,
    pub bob: User,
    pub alice_token: String,
    pub bob_token: String,
}

impl TestContext {
    pub async fn new() -> Self {
        let media = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        let files = Arc::new(FilesystemStore::new(media.path()));

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url: "postgresql://unused".to_string(),
                max_connections: 1,
            },
            jwt: JwtConfig {
                secret: SECRET.to_string(),
            },
            media: MediaConfig {
                root: media.path().to_path_buf(),
                max_upload_bytes: 1024 * 1024,
            },
        };

        let alice = create_user(&store, "alice").await;
        let bob = create_user(&store, "bob").await;

        let app = build_router(AppState::new(store, files, config));

        Self {
            app,
            media,
            alice_token: token_for(&alice),
            bob_token: token_for(&bob),
            alice,
            bob,
        }
    }

    /// Sends a request and returns the status with the parsed JSON body
    /// (`Value::Null` for empty or non-JSON bodies)
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = self.send_raw(request).await;
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn send_raw(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    /// Every file currently under the media root
    pub fn stored_files(&self) -> Vec<std::path::PathBuf> {
        fn walk(dir: &std::path::Path, out: &mut Vec<std::path::PathBuf>) {
            let Ok(entries) = std::fs::read_dir(dir) else {
                return;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    walk(&path, out);
                } else {
                    out.push(path);
                }
            }
        }

        let mut out = Vec::new();
        walk(self.media.path(), &mut out);
        out
    }

    /// Creates a project as `token` and returns its id
    pub async fn project(&self, token: &str, name: &str) -> String {
        let (status, body) = self
            .send(json(Method::POST, "/api/projects", Some(token), serde_json::json!({ "name": name })))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }

    /// Creates a task under `project` as `token` and returns its id
    pub async fn task(&self, token: &str, project: &str, title: &str) -> String {
        let (status, body) = self
            .send(json(
                Method::POST,
                &format!("/api/projects/{}/tasks", project),
                Some(token),
                serde_json::json!({ "title": title }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }
}

async fn create_user(store: &MemoryStore, username: &str) -> User {
    store
        .create_user(CreateUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash: hash_password(PASSWORD).unwrap(),
            first_name: String::new(),
            last_name: String::new(),
        })
        .await
        .unwrap()
}

pub fn token_for(user: &User) -> String {
    create_token(&Claims::new(user.id, TokenType::Access), SECRET).unwrap()
}

/// JSON request, optionally authenticated
pub fn json(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Body-less request, optionally authenticated
pub fn empty(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Multipart upload with an optional `file` part and `file_name` text part
pub fn multipart(
    method: Method,
    uri: &str,
    token: &str,
    file: Option<(&str, &str)>,
    file_name: Option<&str>,
) -> Request<Body> {
    let mut body = Vec::new();

    if let Some((name, contents)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, name
            )
            .as_bytes(),
        );
        body.extend_from_slice(contents.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    if let Some(display) = file_name {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file_name\"\r\n\r\n{}\r\n",
                BOUNDARY, display
            )
            .as_bytes(),
        );
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}
