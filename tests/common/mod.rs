//! Common test utilities and helpers
//!
//! Builds the full router over in-memory stores and a manual clock, and
//! drives it with `tower::ServiceExt::oneshot`. No sockets are opened.

#![allow(dead_code)]

pub mod assertions;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

use noteshare::backend::clock::ManualClock;
use noteshare::backend::content::files::FileStore;
use noteshare::backend::routes::create_router;
use noteshare::backend::server::{build_state, AppState, Stores};
use noteshare::backend::store::memory::MemoryFileStore;
use noteshare::shared::{AppConfig, AppConfigBuilder};

pub const PASSWORD: &str = "correct horse";

const BOUNDARY: &str = "noteshare-test-boundary";

/// Router plus handles on everything a test needs to arrange
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub files: Arc<MemoryFileStore>,
}

/// A registered, logged-in user
pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|builder| builder)
    }

    /// Like [`TestApp::new`], with extra settings applied to the config
    pub fn with_config(configure: impl FnOnce(AppConfigBuilder) -> AppConfigBuilder) -> Self {
        let builder = AppConfig::builder()
            .jwt_secret("integration-test-secret")
            .jwt_ttl(Duration::from_secs(24 * 3600))
            .bcrypt_cost(4);
        let config = configure(builder).build().expect("test config is valid");

        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap(),
        ));
        let files = Arc::new(MemoryFileStore::new());

        let mut stores = Stores::memory();
        stores.files = files.clone() as Arc<dyn FileStore>;

        let state = build_state(&config, stores, clock.clone(), None);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            clock,
            files,
        }
    }

    /// Send a request and decode the JSON body (`Value::Null` when empty)
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body is readable");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body is JSON")
        };
        (status, body)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, auth_header(token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        };
        self.send(request.expect("request is well formed")).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> (StatusCode, Value) {
        self.post(
            "/api/v1/register",
            None,
            serde_json::json!({
                "username": username,
                "email": email,
                "password": password,
            }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.post(
            "/api/v1/login",
            None,
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Register `username`, log in, and look up the assigned id
    pub async fn signup(&self, username: &str) -> TestUser {
        let email = format!("{}@example.com", username);

        let (status, body) = self.register(username, &email, PASSWORD).await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        let (status, body) = self.login(&email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        let token = body["token"].as_str().expect("token in body").to_string();

        let (status, profile) = self.get("/api/v1/profile", Some(&token)).await;
        assert_eq!(status, StatusCode::OK, "profile failed: {}", profile);
        let id = profile["id"].as_i64().expect("numeric id");

        TestUser { id, email, token }
    }
}

impl TestApp {
    /// Create a note through the API and return its JSON
    pub async fn create_note(&self, owner: &TestUser, title: &str, is_public: bool) -> Value {
        let (status, body) = self
            .post(
                "/api/v1/notes",
                Some(&owner.token),
                serde_json::json!({
                    "title": title,
                    "content": "Gaussian elimination, pivots",
                    "isPublic": is_public,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create note failed: {}", body);
        body
    }

    /// Multipart `POST /api/v1/pdfs`; `fields` are sent before the file
    pub async fn upload_pdf(
        &self,
        token: Option<&str>,
        fields: &[(&str, &str)],
        file: Option<&[u8]>,
    ) -> (StatusCode, Value) {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some(bytes) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"slides.pdf\"\r\nContent-Type: application/pdf\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/pdfs")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, auth_header(token));
        }
        self.send(builder.body(Body::from(body)).expect("request is well formed"))
            .await
    }
}

/// JSON id field as an integer
pub fn id_of(body: &Value) -> i64 {
    body["id"].as_i64().expect("numeric id")
}

/// Create authorization header value
pub fn auth_header(token: &str) -> String {
    format!("Bearer {}", token)
}
