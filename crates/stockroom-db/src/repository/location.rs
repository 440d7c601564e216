//! # Location Repository
//!
//! The small, named set of places stock can sit. `Store` and `Warehouse`
//! are created by the initial migration.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::info;

use crate::error::DbResult;
use stockroom_core::validation::validate_location_name;
use stockroom_core::{new_id, CoreError, Location, ValidationError};

#[derive(Debug, Clone)]
pub struct LocationRepository {
    pool: SqlitePool,
}

impl LocationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LocationRepository { pool }
    }

    /// All locations ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Location>> {
        let locations = sqlx::query_as::<_, Location>("SELECT id, name, created_at FROM locations ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(locations)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Location>> {
        self.fetch_by_id(&self.pool, id).await
    }

    pub async fn fetch_by_id<'e, E>(&self, executor: E, id: &str) -> DbResult<Option<Location>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let location = sqlx::query_as::<_, Location>("SELECT id, name, created_at FROM locations WHERE id = ?1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(location)
    }

    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Location>> {
        let location = sqlx::query_as::<_, Location>("SELECT id, name, created_at FROM locations WHERE name = ?1")
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(location)
    }

    /// Resolves a location by id, failing with `InvalidLocation` when unknown.
    pub async fn require(&self, id: &str) -> DbResult<Location> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::invalid_location(format!("unknown location {}", id)).into())
    }

    /// Resolves a location by name, failing with `InvalidLocation` when
    /// unknown.
    pub async fn require_by_name(&self, name: &str) -> DbResult<Location> {
        self.get_by_name(name)
            .await?
            .ok_or_else(|| CoreError::invalid_location(format!("unknown location '{}'", name)).into())
    }

    pub async fn create(&self, name: &str) -> DbResult<Location> {
        validate_location_name(name)?;
        let name = name.trim();

        if self.get_by_name(name).await?.is_some() {
            return Err(ValidationError::Duplicate {
                field: "location name".to_string(),
                value: name.to_string(),
            }
            .into());
        }

        let location = Location {
            id: new_id(),
            name: name.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO locations (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&location.id)
            .bind(&location.name)
            .bind(location.created_at)
            .execute(&self.pool)
            .await?;

        info!(location_id = %location.id, name = %location.name, "Location created");
        Ok(location)
    }

    /// Id → display name, for labelling report rows.
    pub async fn name_map(&self) -> DbResult<HashMap<String, String>> {
        Ok(self.list().await?.into_iter().map(|l| (l.id, l.name)).collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorCode;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_default_locations_resolve_by_name() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let store = db.locations().require_by_name("Store").await.unwrap();
        let again = db.locations().require(&store.id).await.unwrap();
        assert_eq!(store, again);
    }

    #[tokio::test]
    async fn test_unknown_location_is_invalid() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = db.locations().require_by_name("Basement").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidLocation);
    }

    #[tokio::test]
    async fn test_create_location() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let kiosk = db.locations().create(" Kiosk ").await.unwrap();
        assert_eq!(kiosk.name, "Kiosk");
        assert_eq!(db.locations().list().await.unwrap().len(), 3);

        let err = db.locations().create("Store").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Conflict);

        let names = db.locations().name_map().await.unwrap();
        assert_eq!(names.get(&kiosk.id).map(String::as_str), Some("Kiosk"));
    }
}
