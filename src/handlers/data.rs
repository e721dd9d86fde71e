//! Protected feature endpoints. Every operation here runs behind the
//! bearer-token middleware and binds the verified caller's account id as
//! the record owner - the store is never reachable with anyone else's
//! identity.

use axum::{extract::Path, http::StatusCode, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::store::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateFeature {
    pub geometry: Option<Value>,
    pub properties: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFeature {
    pub properties: Option<Value>,
}

/// GET /data - every feature the caller owns, as a GeoJSON FeatureCollection
pub async fn list(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let features = state.store.features_by_owner(user.account_id).await?;
    let features: Vec<Value> = features.iter().map(|f| f.to_geojson()).collect();

    Ok(Json(json!({
        "type": "FeatureCollection",
        "features": features
    })))
}

/// POST /data - persist a drawn shape; returns the server-assigned identity
/// the client binds for all later operations on it
pub async fn create(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateFeature>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let geometry = body
        .geometry
        .ok_or_else(|| ApiError::bad_request("Geometry is required"))?;
    let properties = body.properties.unwrap_or_else(|| json!({}));

    let id = state
        .store
        .insert_feature(user.account_id, &geometry, &properties)
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// PUT /data/:id - replace the properties mapping of an owned feature
pub async fn update(
    Path(id): Path<Uuid>,
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateFeature>,
) -> Result<Json<Value>, ApiError> {
    let properties = body
        .properties
        .ok_or_else(|| ApiError::bad_request("Properties are required"))?;

    state
        .store
        .update_feature_properties(id, user.account_id, &properties)
        .await?;

    Ok(Json(json!({ "id": id })))
}

/// DELETE /data/:id - remove an owned feature; 204 with no body
pub async fn remove(
    Path(id): Path<Uuid>,
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_feature(id, user.account_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
