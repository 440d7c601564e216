//! # Transfer Repository
//!
//! Append-only history of stock moved between locations. The matching
//! ledger adjustments are written by `TransferService` in the same
//! transaction as the row inserted here.

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::error::DbResult;
use stockroom_core::Transfer;

const TRANSFER_COLUMNS: &str =
    "id, product_id, quantity, from_location_id, to_location_id, note, created_by, created_at";

#[derive(Debug, Clone)]
pub struct TransferRepository {
    pool: SqlitePool,
}

impl TransferRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransferRepository { pool }
    }

    pub async fn insert<'e, E>(&self, executor: E, transfer: &Transfer) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO transfers (
                id, product_id, quantity, from_location_id, to_location_id,
                note, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&transfer.id)
        .bind(&transfer.product_id)
        .bind(transfer.quantity)
        .bind(&transfer.from_location_id)
        .bind(&transfer.to_location_id)
        .bind(&transfer.note)
        .bind(&transfer.created_by)
        .bind(transfer.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transfer>> {
        let sql = format!("SELECT {TRANSFER_COLUMNS} FROM transfers WHERE id = ?1");

        let transfer = sqlx::query_as::<_, Transfer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(transfer)
    }

    /// Most recent first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Transfer>> {
        let sql = format!("SELECT {TRANSFER_COLUMNS} FROM transfers ORDER BY created_at DESC, id LIMIT ?1");

        let transfers = sqlx::query_as::<_, Transfer>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(transfers)
    }

    /// Oldest first.
    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<Transfer>> {
        let sql = format!("SELECT {TRANSFER_COLUMNS} FROM transfers WHERE product_id = ?1 ORDER BY created_at, id");

        let transfers = sqlx::query_as::<_, Transfer>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(transfers)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transfers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
