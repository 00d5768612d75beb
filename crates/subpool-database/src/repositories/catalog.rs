//! Catalog repository: service providers, countries, currencies.
//!
//! All reads; the catalog is reference data maintained outside the slot
//! assignment subsystem. Also implements the engine's [`CatalogReader`]
//! seam for referential integrity checks.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use subpool_core::error::{AppError, ErrorKind};
use subpool_core::result::AppResult;
use subpool_engine::CatalogReader;
use subpool_entity::catalog::{Country, Currency, ServiceProvider};

/// Repository for catalog reference data.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    /// Create a new catalog repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List all active service providers.
    pub async fn list_providers(&self) -> AppResult<Vec<ServiceProvider>> {
        sqlx::query_as::<_, ServiceProvider>(
            "SELECT * FROM service_providers WHERE is_active = TRUE ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list providers", e))
    }

    /// Find a service provider by ID.
    pub async fn find_provider(&self, id: Uuid) -> AppResult<Option<ServiceProvider>> {
        sqlx::query_as::<_, ServiceProvider>("SELECT * FROM service_providers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find provider", e))
    }

    /// List all countries.
    pub async fn list_countries(&self) -> AppResult<Vec<Country>> {
        sqlx::query_as::<_, Country>("SELECT * FROM countries ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list countries", e))
    }

    /// List all currencies.
    pub async fn list_currencies(&self) -> AppResult<Vec<Currency>> {
        sqlx::query_as::<_, Currency>("SELECT * FROM currencies ORDER BY code")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list currencies", e)
            })
    }
}

#[async_trait]
impl CatalogReader for CatalogRepository {
    async fn provider_is_active(&self, service_provider_id: Uuid) -> AppResult<bool> {
        let active: Option<bool> =
            sqlx::query_scalar("SELECT is_active FROM service_providers WHERE id = $1")
                .bind(service_provider_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to check provider", e)
                })?;
        Ok(active.unwrap_or(false))
    }

    async fn country_exists(&self, country_id: Uuid) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM countries WHERE id = $1)")
                .bind(country_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to check country", e)
                })?;
        Ok(exists)
    }
}
