//! # Purchase Repository
//!
//! Cost records for supplier deliveries, written by `ReceivingService`.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::error::DbResult;
use stockroom_core::Purchase;

const PURCHASE_COLUMNS: &str = "id, product_id, location_id, quantity, unit_cost_cents, additional_costs_cents, \
     total_cost_cents, reason, created_by, created_at";

#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    pub async fn insert<'e, E>(&self, executor: E, purchase: &Purchase) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO purchases (
                id, product_id, location_id, quantity,
                unit_cost_cents, additional_costs_cents, total_cost_cents,
                reason, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&purchase.id)
        .bind(&purchase.product_id)
        .bind(&purchase.location_id)
        .bind(purchase.quantity)
        .bind(purchase.unit_cost_cents)
        .bind(purchase.additional_costs_cents)
        .bind(purchase.total_cost_cents)
        .bind(&purchase.reason)
        .bind(&purchase.created_by)
        .bind(purchase.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Purchase>> {
        let sql = format!("SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = ?1");

        let purchase = sqlx::query_as::<_, Purchase>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(purchase)
    }

    /// Oldest first.
    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<Purchase>> {
        let sql = format!("SELECT {PURCHASE_COLUMNS} FROM purchases WHERE product_id = ?1 ORDER BY created_at, id");

        let purchases = sqlx::query_as::<_, Purchase>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(purchases)
    }

    /// Purchases with `from <= created_at < to`, oldest first.
    pub async fn list_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<Vec<Purchase>> {
        let sql = format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE created_at >= ?1 AND created_at < ?2 ORDER BY created_at, id"
        );

        let purchases = sqlx::query_as::<_, Purchase>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        Ok(purchases)
    }
}
