//! # Sale Repository
//!
//! Database operations for sales and sale items.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. COMMIT (SaleService::checkout, one transaction)                    │
//! │     └── ledger adjust(-qty) per line                                   │
//! │     └── insert_sale()  → Sale                                          │
//! │     └── insert_item()  → SaleItem, SaleItem, ...                       │
//! │                                                                         │
//! │  2. READ                                                               │
//! │     └── get_by_id(), get_items(), list_between()                       │
//! │                                                                         │
//! │  3. (ADMIN) DELETE                                                     │
//! │     └── delete() → sale and its items; stock is NOT restored           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sales are never updated.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use stockroom_core::{Sale, SaleItem};

const SALE_COLUMNS: &str = "id, location_id, total_cents, payment_method, created_by, created_at";

const ITEM_COLUMNS: &str =
    "id, sale_id, line_number, product_id, quantity, unit_price_cents, line_total_cents, created_at";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");

        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Inserts a sale header.
    pub async fn insert_sale<'e, E>(&self, executor: E, sale: &Sale) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(id = %sale.id, total_cents = sale.total_cents, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (id, location_id, total_cents, payment_method, created_by, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.location_id)
        .bind(sale.total_cents)
        .bind(sale.payment_method)
        .bind(&sale.created_by)
        .bind(sale.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Inserts one line item.
    pub async fn insert_item<'e, E>(&self, executor: E, item: &SaleItem) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(sale_id = %item.sale_id, line = item.line_number, product_id = %item.product_id, "Adding sale item");

        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, line_number, product_id,
                quantity, unit_price_cents, line_total_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(item.line_number)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.line_total_cents)
        .bind(item.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Gets all items for a sale, in line order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY line_number");

        let items = sqlx::query_as::<_, SaleItem>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Sales with `from <= created_at < to`, oldest first.
    pub async fn list_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE created_at >= ?1 AND created_at < ?2 ORDER BY created_at, id"
        );

        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Most recent sales first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC, id LIMIT ?1");

        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Deletes a sale and, by cascade, its items.
    ///
    /// Admin correction only; the ledger is not touched.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        info!(sale_id = %id, "Sale deleted");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn count_items(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
