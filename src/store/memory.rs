//! In-memory store with the same contract as the Postgres one. Used by the
//! integration tests and handy for running the API locally without a
//! database. Every operation takes the single lock once, so each write is
//! atomic with respect to its row and nothing can tear.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::geo;
use crate::store::{Account, CredentialStore, Feature, FeatureStore, Store, StoreError};

/// Rows keep geometry in the same normalized EWKT form Postgres would,
/// so both store implementations exercise the spatial adapter end to end.
#[derive(Debug, Clone)]
struct FeatureRow {
    id: Uuid,
    owner_id: Uuid,
    ewkt: String,
    properties: Value,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    accounts: Vec<Account>,
    // Vec keeps insertion order, which is the listing order
    features: Vec<FeatureRow>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn create_account(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Account, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.accounts.iter().any(|a| a.email == email) {
            return Err(StoreError::DuplicateEmail);
        }
        let account = Account {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        inner.accounts.push(account.clone());
        Ok(account)
    }

    async fn find_account(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.iter().find(|a| a.email == email).cloned())
    }
}

#[async_trait]
impl FeatureStore for MemoryStore {
    async fn insert_feature(
        &self,
        owner_id: Uuid,
        geometry: &Value,
        properties: &Value,
    ) -> Result<Uuid, StoreError> {
        let ewkt = geo::to_ewkt(geometry)?;
        let id = Uuid::new_v4();
        let mut inner = self.inner.write().await;
        inner.features.push(FeatureRow {
            id,
            owner_id,
            ewkt,
            properties: properties.clone(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn features_by_owner(&self, owner_id: Uuid) -> Result<Vec<Feature>, StoreError> {
        let inner = self.inner.read().await;
        inner
            .features
            .iter()
            .filter(|row| row.owner_id == owner_id)
            .map(|row| {
                Ok(Feature {
                    id: row.id,
                    owner_id: row.owner_id,
                    geometry: geo::from_ewkt(&row.ewkt)?,
                    properties: row.properties.clone(),
                    created_at: row.created_at,
                })
            })
            .collect()
    }

    async fn update_feature_properties(
        &self,
        id: Uuid,
        owner_id: Uuid,
        properties: &Value,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let row = inner
            .features
            .iter_mut()
            .find(|row| row.id == id && row.owner_id == owner_id)
            .ok_or(StoreError::NotFound)?;
        row.properties = properties.clone();
        Ok(())
    }

    async fn delete_feature(&self, id: Uuid, owner_id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.features.len();
        inner
            .features
            .retain(|row| !(row.id == id && row.owner_id == owner_id));
        if inner.features.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
