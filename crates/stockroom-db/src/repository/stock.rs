//! # Stock Repository (Inventory Ledger)
//!
//! The only code that writes `stock_entries.quantity`.
//!
//! ## Adjust
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  adjust(product, location, delta)                       │
//! │                                                                         │
//! │  delta > 0                                                             │
//! │    INSERT ... ON CONFLICT DO UPDATE SET quantity = quantity + delta    │
//! │    (entry created at 0 first if absent)                                │
//! │                                                                         │
//! │  delta < 0                                                             │
//! │    UPDATE ... SET quantity = quantity + delta                          │
//! │    WHERE ... AND quantity + delta >= 0                                 │
//! │       │                                                                 │
//! │       ├── 1 row  → new quantity                                        │
//! │       └── 0 rows → re-read current quantity → InsufficientStock        │
//! │                                                                         │
//! │  The check and the write are one statement, evaluated against the      │
//! │  committed value at that instant. Two checkouts racing for the last    │
//! │  unit cannot both succeed.                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `adjust` takes a `&mut SqliteConnection` so callers can run it inside
//! their own transaction (`&mut *tx`) next to the history row it belongs to.

use chrono::Utc;
use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use stockroom_core::ledger::insufficient;
use stockroom_core::validation::validate_delta;
use stockroom_core::{CoreError, InventoryRow, StockEntry};

#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Applies `delta` to the entry for `(product, location)` and returns the
    /// new quantity.
    ///
    /// ## Returns
    /// * `Err(Core(InsufficientStock))` - decrement below zero
    /// * `Err(Core(NotFound))` - unknown product
    /// * `Err(Core(InvalidLocation))` - unknown location
    /// * `Err(Core(Validation))` - `delta == 0`
    pub async fn adjust(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
        location_id: &str,
        delta: i64,
    ) -> DbResult<i64> {
        validate_delta(delta)?;

        debug!(product_id = %product_id, location_id = %location_id, delta, "Adjusting stock");

        if delta > 0 {
            let result = sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO stock_entries (product_id, location_id, quantity, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(product_id, location_id) DO UPDATE SET
                    quantity = quantity + excluded.quantity,
                    updated_at = excluded.updated_at
                RETURNING quantity
                "#,
            )
            .bind(product_id)
            .bind(location_id)
            .bind(delta)
            .bind(Utc::now())
            .fetch_one(&mut *conn)
            .await;

            return match result {
                Ok(quantity) => Ok(quantity),
                Err(e) => match DbError::from(e) {
                    DbError::ForeignKeyViolation { .. } => Err(self.missing_reference(conn, product_id, location_id).await),
                    other => Err(other),
                },
            };
        }

        let updated = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE stock_entries
            SET quantity = quantity + ?3, updated_at = ?4
            WHERE product_id = ?1 AND location_id = ?2 AND quantity + ?3 >= 0
            RETURNING quantity
            "#,
        )
        .bind(product_id)
        .bind(location_id)
        .bind(delta)
        .bind(Utc::now())
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(quantity) = updated {
            return Ok(quantity);
        }

        // Refused. Work out why, inside the same transaction.
        let current = self.fetch_quantity(&mut *conn, product_id, location_id).await?;

        if current.is_none() {
            let product_exists = exists(&mut *conn, "SELECT 1 FROM products WHERE id = ?1", product_id).await?;
            let location_exists = exists(&mut *conn, "SELECT 1 FROM locations WHERE id = ?1", location_id).await?;
            if !product_exists || !location_exists {
                return Err(self.missing_reference(conn, product_id, location_id).await);
            }
        }

        let available = current.unwrap_or(0);
        warn!(
            product_id = %product_id,
            location_id = %location_id,
            available,
            requested = -delta,
            "Insufficient stock"
        );

        Err(insufficient(product_id, location_id, available, -delta).into())
    }

    /// Creates a zero entry if none exists. Never changes an existing one.
    pub async fn ensure_entry<'e, E>(&self, executor: E, product_id: &str, location_id: &str) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO stock_entries (product_id, location_id, quantity, updated_at)
            VALUES (?1, ?2, 0, ?3)
            "#,
        )
        .bind(product_id)
        .bind(location_id)
        .bind(Utc::now())
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Quantity at a location; 0 when no entry exists.
    pub async fn current_quantity(&self, product_id: &str, location_id: &str) -> DbResult<i64> {
        Ok(self.fetch_quantity(&self.pool, product_id, location_id).await?.unwrap_or(0))
    }

    async fn fetch_quantity<'e, E>(&self, executor: E, product_id: &str, location_id: &str) -> DbResult<Option<i64>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let quantity = sqlx::query_scalar::<_, i64>(
            "SELECT quantity FROM stock_entries WHERE product_id = ?1 AND location_id = ?2",
        )
        .bind(product_id)
        .bind(location_id)
        .fetch_optional(executor)
        .await?;

        Ok(quantity)
    }

    /// All entries of one product.
    pub async fn entries_for_product(&self, product_id: &str) -> DbResult<Vec<StockEntry>> {
        let entries = sqlx::query_as::<_, StockEntry>(
            r#"
            SELECT s.product_id, s.location_id, s.quantity, s.updated_at
            FROM stock_entries s
            JOIN locations l ON l.id = s.location_id
            WHERE s.product_id = ?1
            ORDER BY l.name
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Units of a product across every location.
    pub async fn total_units(&self, product_id: &str) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(quantity), 0) FROM stock_entries WHERE product_id = ?1")
            .bind(product_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    /// Product × location × quantity for every active product.
    ///
    /// Pairs without an entry appear with quantity 0. `location` filters by
    /// location name (`None` = all). Ordered by product name, then location
    /// name.
    pub async fn summary(&self, location: Option<&str>) -> DbResult<Vec<InventoryRow>> {
        let rows = sqlx::query_as::<_, InventoryRow>(
            r#"
            SELECT
                p.id AS product_id,
                p.name AS name,
                p.barcode AS barcode,
                l.id AS location_id,
                l.name AS location,
                COALESCE(s.quantity, 0) AS quantity
            FROM products p
            CROSS JOIN locations l
            LEFT JOIN stock_entries s
                ON s.product_id = p.id AND s.location_id = l.id
            WHERE p.is_active = 1
              AND (?1 IS NULL OR l.name = ?1)
            ORDER BY p.name, p.id, l.name
            "#,
        )
        .bind(location)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Names which reference of an adjustment does not exist.
    async fn missing_reference(&self, conn: &mut SqliteConnection, product_id: &str, location_id: &str) -> DbError {
        match exists(&mut *conn, "SELECT 1 FROM products WHERE id = ?1", product_id).await {
            Ok(false) => return CoreError::not_found("Product", product_id).into(),
            Err(e) => return e,
            Ok(true) => {}
        }

        match exists(&mut *conn, "SELECT 1 FROM locations WHERE id = ?1", location_id).await {
            Ok(false) => CoreError::invalid_location(format!("unknown location {}", location_id)).into(),
            Err(e) => e,
            Ok(true) => DbError::Internal(format!(
                "stock entry for {}/{} rejected with both references present",
                product_id, location_id
            )),
        }
    }
}

async fn exists(conn: &mut SqliteConnection, sql: &str, id: &str) -> DbResult<bool> {
    let found = sqlx::query_scalar::<_, i64>(sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(found.is_some())
}

// =============================================================================
// Unit Tests
// =============================================================================
