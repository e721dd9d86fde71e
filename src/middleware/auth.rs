use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::{self, Claims};
use crate::error::ApiError;

/// Authenticated caller context extracted from a verified bearer token.
/// Every protected handler binds `account_id` as the owner of whatever it
/// touches; this is the chokepoint that keeps accounts isolated.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub account_id: Uuid,
    pub email: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            account_id: claims.sub,
            email: claims.email,
        }
    }
}

/// Bearer-token middleware for the protected routes.
///
/// A missing Authorization header is 401 (unauthenticated); a header that
/// is present but unusable - wrong scheme, malformed token, bad signature,
/// expired - is 403 (forbidden). No further detail leaks either way.
pub async fn bearer_auth(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = headers
        .get("authorization")
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    let token = header
        .to_str()
        .ok()
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::forbidden("Invalid token"))?;

    let claims = auth::verify_token(token).map_err(|_| ApiError::forbidden("Invalid token"))?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}
