//! # Stock Service
//!
//! Manual adjustments: one history row plus one ledger delta, atomically.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::error::DbResult;
use crate::pool::Database;
use crate::session::{resolve_actor, Session, StaticSession};
use stockroom_core::validation::{normalize_optional, validate_delta, validate_note};
use stockroom_core::{new_id, StockAdjustment};

#[derive(Debug, Clone)]
pub struct StockService {
    db: Database,
    session: Arc<dyn Session>,
}

impl StockService {
    pub fn new(db: Database) -> Self {
        StockService {
            db,
            session: Arc::new(StaticSession::anonymous()),
        }
    }

    /// Identity recorded when an operation is given no explicit actor.
    pub fn with_session(mut self, session: Arc<dyn Session>) -> Self {
        self.session = session;
        self
    }

    /// Applies a signed correction and records why.
    ///
    /// A negative delta larger than the current quantity fails with
    /// `InsufficientStock` and writes nothing.
    pub async fn adjust(
        &self,
        product_id: &str,
        location_id: &str,
        delta: i64,
        reason: Option<&str>,
        actor: Option<&str>,
    ) -> DbResult<StockAdjustment> {
        validate_delta(delta)?;

        let reason = normalize_optional(reason);
        if let Some(reason) = &reason {
            validate_note(reason)?;
        }

        let adjustment = StockAdjustment {
            id: new_id(),
            product_id: product_id.to_string(),
            location_id: location_id.to_string(),
            quantity_delta: delta,
            reason,
            created_by: resolve_actor(&*self.session, actor),
            created_at: Utc::now(),
        };

        let mut tx = self.db.pool().begin().await?;

        let quantity = self.db.stock().adjust(&mut tx, product_id, location_id, delta).await?;
        self.db.adjustments().insert(&mut *tx, &adjustment).await?;

        tx.commit().await?;

        info!(
            product_id = %product_id,
            location_id = %location_id,
            delta,
            quantity,
            "Stock adjusted"
        );

        Ok(adjustment)
    }

    /// [`adjust`](Self::adjust) with the location given by name.
    pub async fn adjust_at(
        &self,
        product_id: &str,
        location_name: &str,
        delta: i64,
        reason: Option<&str>,
        actor: Option<&str>,
    ) -> DbResult<StockAdjustment> {
        let location = self.db.locations().require_by_name(location_name).await?;
        self.adjust(product_id, &location.id, delta, reason, actor).await
    }

    pub async fn current_quantity(&self, product_id: &str, location_id: &str) -> DbResult<i64> {
        self.db.stock().current_quantity(product_id, location_id).await
    }
}
