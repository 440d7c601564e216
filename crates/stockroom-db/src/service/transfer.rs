//! # Transfer Service
//!
//! Moves stock between two locations as one unit: both ledger adjustments
//! and the transfer record commit together or not at all.
//!
//! Checked before anything is written, in this order:
//! 1. `quantity > 0` → `Validation`
//! 2. `from != to` → `InvalidLocation`
//! 3. both locations exist → `InvalidLocation`
//! 4. the product exists → `NotFound`
//!
//! Availability at the source is checked by the ledger inside the
//! transaction, against the committed quantity at that moment.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::session::{resolve_actor, Session, StaticSession};
use stockroom_core::ledger::plan_transfer;
use stockroom_core::validation::{normalize_optional, validate_note};
use stockroom_core::{new_id, CoreError, Transfer};

#[derive(Debug, Clone)]
pub struct TransferService {
    db: Database,
    session: Arc<dyn Session>,
}

impl TransferService {
    pub fn new(db: Database) -> Self {
        TransferService {
            db,
            session: Arc::new(StaticSession::anonymous()),
        }
    }

    /// Identity recorded when an operation is given no explicit actor.
    pub fn with_session(mut self, session: Arc<dyn Session>) -> Self {
        self.session = session;
        self
    }

    pub async fn transfer(
        &self,
        product_id: &str,
        from_location_id: &str,
        to_location_id: &str,
        quantity: i64,
        actor: Option<&str>,
        note: Option<&str>,
    ) -> DbResult<Transfer> {
        let movements = plan_transfer(from_location_id, to_location_id, quantity)?;

        let note = normalize_optional(note);
        if let Some(note) = &note {
            validate_note(note)?;
        }

        self.db.locations().require(from_location_id).await?;
        self.db.locations().require(to_location_id).await?;

        if self.db.products().get_by_id(product_id).await?.is_none() {
            return Err(CoreError::not_found("Product", product_id).into());
        }

        let transfer = Transfer {
            id: new_id(),
            product_id: product_id.to_string(),
            quantity,
            from_location_id: from_location_id.to_string(),
            to_location_id: to_location_id.to_string(),
            note,
            created_by: resolve_actor(&*self.session, actor),
            created_at: Utc::now(),
        };

        let mut tx = self.db.pool().begin().await?;

        for movement in &movements {
            if let Err(e) = self
                .db
                .stock()
                .adjust(&mut tx, product_id, &movement.location_id, movement.delta)
                .await
            {
                warn!(product_id = %product_id, from = %from_location_id, quantity, error = %e, "Transfer refused");
                return Err(e);
            }
        }

        self.db.transfers().insert(&mut *tx, &transfer).await?;

        tx.commit().await?;

        info!(
            transfer_id = %transfer.id,
            product_id = %product_id,
            from = %from_location_id,
            to = %to_location_id,
            quantity,
            "Transfer committed"
        );

        Ok(transfer)
    }

    /// [`transfer`](Self::transfer) with locations given by name, e.g.
    /// `"Warehouse"` → `"Store"`.
    pub async fn transfer_by_name(
        &self,
        product_id: &str,
        from_location: &str,
        to_location: &str,
        quantity: i64,
        actor: Option<&str>,
        note: Option<&str>,
    ) -> DbResult<Transfer> {
        plan_transfer(from_location.trim(), to_location.trim(), quantity)?;

        let from = self.db.locations().require_by_name(from_location).await?;
        let to = self.db.locations().require_by_name(to_location).await?;

        self.transfer(product_id, &from.id, &to.id, quantity, actor, note).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Transfer> {
        self.db
            .transfers()
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Transfer", id))
    }

    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Transfer>> {
        self.db.transfers().list_recent(limit).await
    }

    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<Transfer>> {
        self.db.transfers().list_for_product(product_id).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::service::testing::*;

    #[tokio::test]
    async fn test_transfer_moves_units_and_conserves_total() {
        let sr = stockroom().await;
        let product = product_with_stock(&sr, "Chickpeas", 300, 0, 10).await;
        let (store, warehouse) = (store_id(&sr).await, warehouse_id(&sr).await);

        let transfer = sr
            .transfers()
            .transfer(&product.id, &warehouse, &store, 4, Some("stocker"), Some("restock shelf"))
            .await
            .unwrap();

        assert_eq!(quantity(&sr, &product.id, &warehouse).await, 6);
        assert_eq!(quantity(&sr, &product.id, &store).await, 4);
        assert_eq!(sr.db().stock().total_units(&product.id).await.unwrap(), 10);

        assert_eq!(transfer.quantity, 4);
        assert_eq!(transfer.note.as_deref(), Some("restock shelf"));
        assert_eq!(sr.transfers().get(&transfer.id).await.unwrap(), transfer);
    }

    #[tokio::test]
    async fn test_same_location_rejected_before_any_change() {
        let sr = stockroom().await;
        let product = product_with_stock(&sr, "Oats", 350, 5, 0).await;
        let store = store_id(&sr).await;

        let err = sr
            .transfers()
            .transfer(&product.id, &store, &store, 1, None, None)
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::InvalidLocation);
        assert_eq!(quantity(&sr, &product.id, &store).await, 5);
        assert_eq!(sr.db().transfers().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insufficient_source_rolls_back_both_sides() {
        let sr = stockroom().await;
        let product = product_with_stock(&sr, "Pasta", 220, 1, 3).await;
        let (store, warehouse) = (store_id(&sr).await, warehouse_id(&sr).await);

        let err = sr
            .transfers()
            .transfer(&product.id, &warehouse, &store, 5, None, None)
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::InsufficientStock);
        assert_eq!(quantity(&sr, &product.id, &warehouse).await, 3);
        assert_eq!(quantity(&sr, &product.id, &store).await, 1);
        assert_eq!(sr.db().transfers().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_validation_order() {
        let sr = stockroom().await;
        let store = store_id(&sr).await;

        // Quantity is checked before anything else.
        let err = sr.transfers().transfer("missing", &store, &store, 0, None, None).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Validation);

        // Unknown location before unknown product.
        let err = sr.transfers().transfer("missing", &store, "nowhere", 1, None, None).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidLocation);

        let warehouse = warehouse_id(&sr).await;
        let err = sr.transfers().transfer("missing", &warehouse, &store, 1, None, None).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_transfer_by_name_and_history() {
        let sr = stockroom().await;
        let product = product_with_stock(&sr, "Cumin", 150, 0, 8).await;

        sr.transfers()
            .transfer_by_name(&product.id, "Warehouse", "Store", 3, None, None)
            .await
            .unwrap();
        sr.transfers()
            .transfer_by_name(&product.id, "Store", "Warehouse", 1, None, Some("   "))
            .await
            .unwrap();

        let history = sr.transfers().list_for_product(&product.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].note, None);
        assert_eq!(sr.transfers().list_recent(1).await.unwrap().len(), 1);

        let store = store_id(&sr).await;
        assert_eq!(quantity(&sr, &product.id, &store).await, 2);

        let err = sr
            .transfers()
            .transfer_by_name(&product.id, "Store", "Store", 1, None, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidLocation);
    }

    #[tokio::test]
    async fn test_conservation_over_a_sequence() {
        let sr = stockroom().await;
        let product = product_with_stock(&sr, "Pepper", 90, 2, 2).await;
        let (store, warehouse) = (store_id(&sr).await, warehouse_id(&sr).await);

        let moves = [(&warehouse, &store, 2), (&store, &warehouse, 5), (&store, &warehouse, 3), (&warehouse, &store, 1)];
        for (from, to, q) in moves {
            let _ = sr.transfers().transfer(&product.id, from, to, q, None, None).await;
            assert_eq!(sr.db().stock().total_units(&product.id).await.unwrap(), 4);
        }

        assert_eq!(quantity(&sr, &product.id, &store).await, 2);
        assert_eq!(quantity(&sr, &product.id, &warehouse).await, 2);
    }
}
