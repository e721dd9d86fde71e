pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

use crate::geo::GeometryError;

/// A registered account. The password hash never leaves the store layer:
/// handlers only ever see `id` and `email`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A persisted geometry record, with the geometry already converted back
/// to GeoJSON form. `owner_id` is set once at insert and never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub geometry: Value,
    pub properties: Value,
    pub created_at: DateTime<Utc>,
}

impl Feature {
    /// Render as a GeoJSON Feature object for the wire.
    pub fn to_geojson(&self) -> Value {
        serde_json::json!({
            "type": "Feature",
            "id": self.id,
            "geometry": self.geometry,
            "properties": self.properties,
        })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,

    /// Covers both "no such record" and "record owned by someone else" -
    /// a single signal, so errors cannot be used to probe ownership.
    #[error("record not found")]
    NotFound,

    #[error("invalid geometry: {0}")]
    InvalidGeometry(#[from] GeometryError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Persists account records and owns the only copy of password hashes.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist a new account. Fails with `DuplicateEmail` when the contact
    /// string is already registered; uniqueness is enforced here, not at
    /// the protocol boundary.
    async fn create_account(&self, email: &str, password_hash: &str)
        -> Result<Account, StoreError>;

    /// Case-sensitive lookup by email.
    async fn find_account(&self, email: &str) -> Result<Option<Account>, StoreError>;
}

/// Persists geometry records scoped to an owning account. Geometry format
/// conversion happens at this boundary: GeoJSON in, GeoJSON out, EWKT
/// tagged SRID=4326 at rest.
#[async_trait]
pub trait FeatureStore: Send + Sync {
    /// Validate and normalize `geometry`, then persist a new record owned
    /// by `owner_id`. Returns the server-assigned identity, the sole handle
    /// for later update/delete.
    async fn insert_feature(
        &self,
        owner_id: Uuid,
        geometry: &Value,
        properties: &Value,
    ) -> Result<Uuid, StoreError>;

    /// All records owned by `owner_id`, in insertion order. Never another
    /// owner's records.
    async fn features_by_owner(&self, owner_id: Uuid) -> Result<Vec<Feature>, StoreError>;

    /// Replace the entire properties mapping (not a merge) of the record,
    /// provided it exists and is owned by `owner_id`; `NotFound` otherwise.
    async fn update_feature_properties(
        &self,
        id: Uuid,
        owner_id: Uuid,
        properties: &Value,
    ) -> Result<(), StoreError>;

    /// Remove the record, with the same ownership-blind `NotFound` policy
    /// as update.
    async fn delete_feature(&self, id: Uuid, owner_id: Uuid) -> Result<(), StoreError>;
}

/// The full persistence surface a running service needs.
#[async_trait]
pub trait Store: CredentialStore + FeatureStore {
    /// Liveness probe for the /health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Shared application state. The store handle is constructed in `main`
/// (or a test harness) and injected here - there is no global connection
/// singleton anywhere in the crate.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}
