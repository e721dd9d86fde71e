//! Public authentication endpoints: registration and login.

use axum::{http::StatusCode, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{self, password};
use crate::error::ApiError;
use crate::store::AppState;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

fn require_credentials(body: Credentials) -> Result<(String, String), ApiError> {
    match (body.email, body.password) {
        (Some(email), Some(pw)) if !email.trim().is_empty() && !pw.is_empty() => Ok((email, pw)),
        _ => Err(ApiError::bad_request("Email and password are required")),
    }
}

/// Minimal shape check - a full RFC address grammar is not the point here,
/// the store's unique constraint is what actually guards the namespace.
fn validate_email_shape(email: &str) -> Result<(), ApiError> {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ApiError::bad_request("Invalid email format"));
    }
    Ok(())
}

/// POST /register - create an account
///
/// 201 `{user: {id, email}}` on success; 400 on missing fields or an
/// already-registered email. The raw password is hashed before it goes
/// anywhere near the store and is never logged.
pub async fn register(
    Extension(state): Extension<AppState>,
    Json(body): Json<Credentials>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (email, raw_password) = require_credentials(body)?;
    validate_email_shape(&email)?;

    let hash = password::hash(&raw_password).map_err(|e| {
        tracing::error!("Password hashing failed: {}", e);
        ApiError::internal_server_error("Registration failed")
    })?;

    let account = state.store.create_account(&email, &hash).await?;
    tracing::info!(account = %account.id, "Registered new account");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "user": { "id": account.id, "email": account.email }
        })),
    ))
}

/// POST /login - verify credentials and mint a session token
///
/// Unknown email and wrong password produce byte-identical 401 responses,
/// so the endpoint cannot be used to enumerate accounts.
pub async fn login(
    Extension(state): Extension<AppState>,
    Json(body): Json<Credentials>,
) -> Result<Json<Value>, ApiError> {
    let (email, raw_password) = require_credentials(body)?;

    let account = state
        .store
        .find_account(&email)
        .await?
        .filter(|account| password::verify(&raw_password, &account.password_hash))
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    let token = auth::issue_token(account.id, &account.email).map_err(|e| {
        tracing::error!("Token issuance failed: {}", e);
        ApiError::internal_server_error("Login failed")
    })?;

    Ok(Json(json!({
        "token": token,
        "user": { "id": account.id, "email": account.email }
    })))
}
