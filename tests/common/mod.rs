#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use practice_api::app::{build_router, AppState};
use practice_api::auth::{generate_jwt, Claims};
use practice_api::config::AppConfig;
use practice_api::database::MemoryDatabase;
use practice_api::storage::MemoryObjectStore;
use practice_api::video::{VideoError, VideoProvider, VideoRoom};

pub const JWT_SECRET: &str = "integration-test-secret";
pub const ROOT_EMAIL: &str = "ops@platform.test";
pub const PASSWORD: &str = "correct-horse-battery";

/// Room provider that never leaves the process
pub struct LoopbackVideo;

#[async_trait]
impl VideoProvider for LoopbackVideo {
    async fn create_room(&self, unique_name: &str) -> Result<VideoRoom, VideoError> {
        Ok(VideoRoom {
            sid: format!("RM-{}", unique_name),
            unique_name: unique_name.to_string(),
            status: "in-progress".to_string(),
        })
    }

    async fn complete_room(&self, room_sid: &str) -> Result<VideoRoom, VideoError> {
        Ok(VideoRoom {
            sid: room_sid.to_string(),
            unique_name: String::new(),
            status: "completed".to_string(),
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub resources: Arc<MemoryObjectStore>,
    pub documents: Arc<MemoryObjectStore>,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.jwt_secret = JWT_SECRET.to_string();
    config.security.root_emails = vec![ROOT_EMAIL.to_string()];
    config.api.enable_request_logging = false;
    config.video.account_sid = "AC-test".to_string();
    config.video.api_key_sid = "SK-test".to_string();
    config.video.api_key_secret = "video-secret".to_string();
    config
}

pub fn test_app() -> TestApp {
    let resources = Arc::new(MemoryObjectStore::new("client-resources"));
    let documents = Arc::new(MemoryObjectStore::new("documents"));
    let state = AppState::new(
        test_config(),
        Arc::new(MemoryDatabase::new()),
        resources.clone(),
        documents.clone(),
        Arc::new(LoopbackVideo),
    );

    TestApp {
        router: build_router(state.clone()),
        state,
        resources,
        documents,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap_or(Value::Null)
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body")
            .to_vec();
        TestResponse {
            status,
            content_type,
            bytes,
        }
    }

    pub async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        self.send(json_request(method, uri, token, body)).await
    }

    /// Registers a practice and returns the owner's token and tenant id
    pub async fn register(&self, practice: &str, email: &str) -> (String, Uuid) {
        let res = self
            .call(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({
                    "practice_name": practice,
                    "email": email,
                    "first_name": "Avery",
                    "last_name": "Stone",
                    "password": PASSWORD,
                })),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "register failed: {}", res.json());

        let body = res.json();
        let token = body["data"]["token"].as_str().expect("token").to_string();
        let tenant_id = body["data"]["tenant"]["tenant_id"]
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .expect("tenant id");
        (token, tenant_id)
    }
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

/// Builds a multipart body from text fields and an optional `(file_name, content_type, bytes)` file
pub fn multipart_request(
    uri: &str,
    token: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> Request<Body> {
    let boundary = "practice-test-boundary";
    let mut body: Vec<u8> = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes());
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    if let Some((file_name, content_type, bytes)) = file {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file_name, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))
        .expect("request")
}

/// Signs a token directly, for identities that cannot log in (invited users, operators)
pub fn mint_token(user_id: Uuid, tenant_id: Uuid, email: &str, role: &str, root: bool) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        tenant_id,
        email: email.to_string(),
        role: role.to_string(),
        root,
        exp: now + 3600,
        iat: now,
    };
    generate_jwt(&claims, JWT_SECRET).expect("sign")
}

/// Serves the in-memory app on a free port and returns its base URL
pub async fn spawn_server() -> Result<String> {
    let app = test_app();
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;

    tokio::spawn(async move {
        let _ = axum::serve(listener, app.router).await;
    });

    Ok(format!("http://127.0.0.1:{}", port))
}
