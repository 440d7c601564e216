//! # Stock Adjustment Repository
//!
//! Manual corrections (counted stock, breakage, found stock). Each row is
//! written together with its ledger delta by `StockService::adjust`.

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::error::DbResult;
use stockroom_core::StockAdjustment;

const ADJUSTMENT_COLUMNS: &str = "id, product_id, location_id, quantity_delta, reason, created_by, created_at";

#[derive(Debug, Clone)]
pub struct AdjustmentRepository {
    pool: SqlitePool,
}

impl AdjustmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AdjustmentRepository { pool }
    }

    pub async fn insert<'e, E>(&self, executor: E, adjustment: &StockAdjustment) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO stock_adjustments (
                id, product_id, location_id, quantity_delta, reason, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&adjustment.id)
        .bind(&adjustment.product_id)
        .bind(&adjustment.location_id)
        .bind(adjustment.quantity_delta)
        .bind(&adjustment.reason)
        .bind(&adjustment.created_by)
        .bind(adjustment.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Oldest first.
    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<StockAdjustment>> {
        let sql = format!(
            "SELECT {ADJUSTMENT_COLUMNS} FROM stock_adjustments WHERE product_id = ?1 ORDER BY created_at, id"
        );

        let adjustments = sqlx::query_as::<_, StockAdjustment>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(adjustments)
    }
}
