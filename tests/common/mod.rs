//! Shared harness for the integration tests: builds the full router over
//! the in-memory store and drives it in-process with tower's `oneshot`,
//! so no port, database, or running server is needed.

use std::sync::Arc;

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use geomark_api::store::memory::MemoryStore;
use geomark_api::{app, AppState};

pub fn test_app() -> Router {
    // Deterministic signing key for every test binary
    std::env::set_var("JWT_SECRET", "geomark-test-secret");
    app(AppState::new(Arc::new(MemoryStore::new())))
}

/// Fire one request at the router. `token` becomes a bearer Authorization
/// header; a JSON body sets the content type.
pub async fn send(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<&Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(value)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

pub async fn register(app: &Router, email: &str, password: &str) -> Result<(StatusCode, Value)> {
    send(
        app,
        "POST",
        "/register",
        None,
        Some(&json!({"email": email, "password": password})),
    )
    .await
}

/// Register + login, returning a usable bearer token.
pub async fn signup_and_login(app: &Router, email: &str, password: &str) -> Result<String> {
    let (status, _) = register(app, email, password).await?;
    anyhow::ensure!(status == StatusCode::CREATED, "registration failed: {}", status);

    let (status, body) = send(
        app,
        "POST",
        "/login",
        None,
        Some(&json!({"email": email, "password": password})),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::OK, "login failed: {}", status);

    body["token"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("login response missing token: {}", body))
}
