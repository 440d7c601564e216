//! # Receiving Service
//!
//! Supplier deliveries into the warehouse.
//!
//! ## Receipt Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   receive(request, actor)                               │
//! │                                                                         │
//! │  validate (qty > 0, unit cost > 0, extra costs >= 0, new: price > 0)    │
//! │       │                                                                 │
//! │  BEGIN                                                                  │
//! │  target?                                                                │
//! │   ├── Existing(id) ── UPDATE cost price (NotFound if 0 rows)            │
//! │   └── New(draft) ──── INSERT product WHERE name not taken               │
//! │                          ├── inserted: store entry = 0                  │
//! │                          └── taken: reuse it, UPDATE cost price         │
//! │  ledger +qty @ warehouse                                                │
//! │  INSERT purchase                                                        │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::session::{resolve_actor, Session, StaticSession};
use crate::repository::product::build_product;
use stockroom_core::receipt::{ReceiptRequest, ReceiptTarget};
use stockroom_core::{new_id, CoreError, Product, Purchase};

/// What a receipt did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptOutcome {
    pub product: Product,
    pub purchase: Purchase,
    /// True when the receipt created the product.
    pub created_product: bool,
    /// Warehouse quantity after the receipt.
    pub quantity: i64,
}

#[derive(Debug, Clone)]
pub struct ReceivingService {
    db: Database,
    session: Arc<dyn Session>,
    receiving_location: String,
    sale_location: String,
}

impl ReceivingService {
    /// Receipts go to `receiving_location`; new products also get an empty
    /// entry at `sale_location`.
    pub fn new(db: Database, receiving_location: impl Into<String>, sale_location: impl Into<String>) -> Self {
        ReceivingService {
            db,
            session: Arc::new(StaticSession::anonymous()),
            receiving_location: receiving_location.into(),
            sale_location: sale_location.into(),
        }
    }

    /// Identity recorded when an operation is given no explicit actor.
    pub fn with_session(mut self, session: Arc<dyn Session>) -> Self {
        self.session = session;
        self
    }

    pub async fn receive(&self, request: ReceiptRequest, actor: Option<&str>) -> DbResult<ReceiptOutcome> {
        let request = request.validated()?;
        let total_cost = request.total_cost()?;

        let warehouse = self.db.locations().require_by_name(&self.receiving_location).await?;
        let store = self.db.locations().get_by_name(&self.sale_location).await?;

        let products = self.db.products();
        let mut tx = self.db.pool().begin().await?;

        // The first statement of each branch is a write, so the name check
        // below runs under the write lock and concurrent receipts of the
        // same new name end up on one product.
        let (product_id, created_product) = match &request.target {
            ReceiptTarget::Existing(id) => {
                if !products.set_cost_price(&mut *tx, id, request.unit_cost_cents).await? {
                    return Err(CoreError::not_found("Product", id).into());
                }
                (id.clone(), false)
            }
            ReceiptTarget::New(draft) => {
                let candidate = build_product(draft.clone());
                if products.insert_if_name_free(&mut *tx, &candidate).await? {
                    (candidate.id, true)
                } else {
                    let existing = products
                        .fetch_by_name(&mut *tx, &draft.name)
                        .await?
                        .ok_or_else(|| DbError::Internal(format!("product named {} vanished", draft.name)))?;
                    products
                        .set_cost_price(&mut *tx, &existing.id, request.unit_cost_cents)
                        .await?;
                    (existing.id, false)
                }
            }
        };

        let quantity = self
            .db
            .stock()
            .adjust(&mut tx, &product_id, &warehouse.id, request.quantity)
            .await?;

        if created_product {
            if let Some(store) = store.as_ref().filter(|s| s.id != warehouse.id) {
                self.db.stock().ensure_entry(&mut *tx, &product_id, &store.id).await?;
            }
        }

        let purchase = Purchase {
            id: new_id(),
            product_id: product_id.clone(),
            location_id: warehouse.id.clone(),
            quantity: request.quantity,
            unit_cost_cents: request.unit_cost_cents,
            additional_costs_cents: request.additional_costs_cents,
            total_cost_cents: total_cost.cents(),
            reason: request.reason.clone(),
            created_by: resolve_actor(&*self.session, actor),
            created_at: Utc::now(),
        };
        self.db.purchases().insert(&mut *tx, &purchase).await?;

        let product = products
            .fetch_by_id(&mut *tx, &product_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", &product_id))?;

        tx.commit().await?;

        info!(
            product_id = %product_id,
            created_product,
            quantity = request.quantity,
            total_cost_cents = purchase.total_cost_cents,
            "Stock received"
        );

        Ok(ReceiptOutcome {
            product,
            purchase,
            created_product,
            quantity,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StockroomConfig;
    use crate::error::ErrorCode;
    use crate::pool::DbConfig;
    use crate::service::testing::*;
    use crate::service::Stockroom;
    use stockroom_core::NewProduct;

    #[tokio::test]
    async fn test_receive_existing_product() {
        let sr = stockroom().await;
        let product = product_with_stock(&sr, "Soap", 150, 0, 5).await;
        let warehouse = warehouse_id(&sr).await;

        let outcome = sr
            .receiving()
            .receive(
                ReceiptRequest::existing(product.id.clone(), 10, 200)
                    .with_additional_costs(100)
                    .with_reason("Supplier delivery"),
                Some("receiver"),
            )
            .await
            .unwrap();

        assert!(!outcome.created_product);
        assert_eq!(outcome.quantity, 15);
        assert_eq!(outcome.purchase.total_cost_cents, 3000);
        assert_eq!(outcome.product.cost_price_cents, 200);
        assert_eq!(quantity(&sr, &product.id, &warehouse).await, 15);

        let purchases = sr.db().purchases().list_for_product(&product.id).await.unwrap();
        assert_eq!(purchases, vec![outcome.purchase]);
    }

    #[tokio::test]
    async fn test_receive_new_product_creates_it_with_empty_store_entry() {
        let sr = stockroom().await;
        let (store, warehouse) = (store_id(&sr).await, warehouse_id(&sr).await);

        let outcome = sr
            .receiving()
            .receive(
                ReceiptRequest::new_product(NewProduct::new("Olive Oil 1L", 1500).with_barcode("OIL-1"), 12, 900),
                None,
            )
            .await
            .unwrap();

        assert!(outcome.created_product);
        let product = outcome.product;
        assert_eq!(product.name, "Olive Oil 1L");
        assert_eq!(product.cost_price_cents, 900);
        assert_eq!(quantity(&sr, &product.id, &warehouse).await, 12);
        assert_eq!(quantity(&sr, &product.id, &store).await, 0);

        let entries = sr.db().stock().entries_for_product(&product.id).await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_new_product_receipt_with_additional_costs() {
        let sr = stockroom().await;
        let (store, warehouse) = (store_id(&sr).await, warehouse_id(&sr).await);

        let outcome = sr
            .receiving()
            .receive(
                ReceiptRequest::new_product(NewProduct::new("Saffron 1g", 900), 10, 200).with_additional_costs(100),
                None,
            )
            .await
            .unwrap();

        assert!(outcome.created_product);
        assert_eq!(outcome.purchase.quantity, 10);
        assert_eq!(outcome.purchase.unit_cost_cents, 200);
        assert_eq!(outcome.purchase.additional_costs_cents, 100);
        assert_eq!(outcome.purchase.total_cost_cents, 3000);
        assert_eq!(outcome.purchase.location_id, warehouse);
        assert_eq!(quantity(&sr, &outcome.product.id, &warehouse).await, 10);
        assert_eq!(quantity(&sr, &outcome.product.id, &store).await, 0);
    }

    #[tokio::test]
    async fn test_new_product_with_existing_name_is_reused() {
        let sr = stockroom().await;
        let first = sr
            .receiving()
            .receive(ReceiptRequest::new_product(NewProduct::new("Ghee", 2000), 3, 1200), None)
            .await
            .unwrap();
        let second = sr
            .receiving()
            .receive(ReceiptRequest::new_product(NewProduct::new("Ghee", 2100), 2, 1250), None)
            .await
            .unwrap();

        assert!(!second.created_product);
        assert_eq!(second.product.id, first.product.id);
        assert_eq!(second.quantity, 5);
        assert_eq!(sr.db().products().count().await.unwrap(), 1);

        // Different case is a different product.
        let third = sr
            .receiving()
            .receive(ReceiptRequest::new_product(NewProduct::new("ghee", 2000), 1, 1200), None)
            .await
            .unwrap();
        assert!(third.created_product);
    }

    #[tokio::test]
    async fn test_invalid_receipts_write_nothing() {
        let sr = stockroom().await;
        let product = product_with_stock(&sr, "Yeast", 80, 0, 0).await;

        let err = sr
            .receiving()
            .receive(ReceiptRequest::existing(product.id.clone(), 0, 100), None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Validation);

        let err = sr
            .receiving()
            .receive(ReceiptRequest::existing(product.id.clone(), 5, 0), None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Validation);

        let err = sr
            .receiving()
            .receive(ReceiptRequest::new_product(NewProduct::new("Free Thing", 0), 5, 100), None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Validation);

        assert!(sr.db().purchases().list_for_product(&product.id).await.unwrap().is_empty());
        assert_eq!(sr.db().products().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_existing_product() {
        let sr = stockroom().await;

        let err = sr
            .receiving()
            .receive(ReceiptRequest::existing("missing", 5, 100), None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_new_product_with_taken_barcode() {
        let sr = stockroom().await;
        sr.db()
            .products()
            .create(NewProduct::new("Cola", 120).with_barcode("5449000000996"))
            .await
            .unwrap();

        let err = sr
            .receiving()
            .receive(
                ReceiptRequest::new_product(NewProduct::new("Cola Zero", 120).with_barcode("5449000000996"), 6, 60),
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_receipts_of_one_new_name_share_a_product() {
        let path = std::env::temp_dir().join(format!("stockroom-receipts-{}.db", new_id()));
        let db = Database::new(DbConfig::new(path.clone()).max_connections(8))
            .await
            .unwrap();
        let sr = Stockroom::new(db, StockroomConfig::default());

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let receiving = sr.receiving();
                tokio::spawn(async move {
                    receiving
                        .receive(ReceiptRequest::new_product(NewProduct::new("Ghee", 2000), 1, 1200), None)
                        .await
                })
            })
            .collect();

        let mut created = 0;
        let mut ids = Vec::new();
        for handle in handles {
            let outcome = handle.await.unwrap().unwrap();
            created += outcome.created_product as u32;
            ids.push(outcome.product.id);
        }

        assert_eq!(created, 1);
        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(sr.db().products().count().await.unwrap(), 1);

        let warehouse = warehouse_id(&sr).await;
        assert_eq!(quantity(&sr, &ids[0], &warehouse).await, 6);
        assert_eq!(sr.db().purchases().list_for_product(&ids[0]).await.unwrap().len(), 6);

        sr.db().close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
