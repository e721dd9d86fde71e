//! Postgres-backed store. The pool is an explicitly constructed handle:
//! opened once at process start, injected through `AppState`, closed on
//! shutdown. Geometry is kept in a `geom` text column holding SRID-tagged
//! EWKT produced by the adapter in `crate::geo`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::geo;
use crate::store::{Account, CredentialStore, Feature, FeatureStore, Store, StoreError};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct FeatureRow {
    id: Uuid,
    owner_id: Uuid,
    geom: String,
    properties: Value,
    created_at: DateTime<Utc>,
}

impl FeatureRow {
    fn into_feature(self) -> Result<Feature, StoreError> {
        Ok(Feature {
            id: self.id,
            owner_id: self.owner_id,
            geometry: geo::from_ewkt(&self.geom)?,
            properties: self.properties,
            created_at: self.created_at,
        })
    }
}

impl PgStore {
    /// Open the connection pool. Called once from `main`.
    pub async fn connect(database_url: &str, config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(database_url)
            .await?;
        info!("Opened database pool (max {})", config.max_connections);
        Ok(Self { pool })
    }

    /// Create the schema if it does not exist yet.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id UUID PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS features (
                id UUID PRIMARY KEY,
                owner_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                geom TEXT NOT NULL,
                properties JSONB NOT NULL DEFAULT '{}'::jsonb,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Database schema ready");
        Ok(())
    }

    /// Drain and close the pool on shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}

/// Unique-violation code raised by the accounts email constraint.
const UNIQUE_VIOLATION: &str = "23505";

fn classify_insert_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::DuplicateEmail
        }
        _ => StoreError::Sqlx(err),
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn create_account(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Account, StoreError> {
        sqlx::query_as::<_, Account>(
            "INSERT INTO accounts (id, email, password_hash) VALUES ($1, $2, $3) \
             RETURNING id, email, password_hash, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(classify_insert_error)
    }

    async fn find_account(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, email, password_hash, created_at FROM accounts WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }
}

#[async_trait]
impl FeatureStore for PgStore {
    async fn insert_feature(
        &self,
        owner_id: Uuid,
        geometry: &Value,
        properties: &Value,
    ) -> Result<Uuid, StoreError> {
        let ewkt = geo::to_ewkt(geometry)?;
        let id = Uuid::new_v4();

        sqlx::query("INSERT INTO features (id, owner_id, geom, properties) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(owner_id)
            .bind(ewkt)
            .bind(properties.clone())
            .execute(&self.pool)
            .await?;

        Ok(id)
    }

    async fn features_by_owner(&self, owner_id: Uuid) -> Result<Vec<Feature>, StoreError> {
        let rows = sqlx::query_as::<_, FeatureRow>(
            "SELECT id, owner_id, geom, properties, created_at FROM features \
             WHERE owner_id = $1 ORDER BY created_at, id",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(FeatureRow::into_feature).collect()
    }

    async fn update_feature_properties(
        &self,
        id: Uuid,
        owner_id: Uuid,
        properties: &Value,
    ) -> Result<(), StoreError> {
        // Single statement, so the replacement is atomic for this row and
        // the ownership check cannot race the write.
        let result = sqlx::query("UPDATE features SET properties = $1 WHERE id = $2 AND owner_id = $3")
            .bind(properties.clone())
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_feature(&self, id: Uuid, owner_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM features WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
