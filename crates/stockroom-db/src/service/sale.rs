//! # Sale Service
//!
//! Turns a cart into a committed sale.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       checkout(cart, payment, actor)                    │
//! │                                                                         │
//! │  validate lines (non-empty, qty > 0, price >= 0)     no I/O yet         │
//! │  resolve sale location by name                                          │
//! │       │                                                                 │
//! │  BEGIN │                                                                │
//! │       ▼                                                                 │
//! │  for each line:                                                         │
//! │     ledger adjust(product, location, -qty) ── refused? ──► ROLLBACK     │
//! │     product exists and is active?          ── no?      ──► ROLLBACK     │
//! │  INSERT sale (total = Σ qty × unit price)                               │
//! │  INSERT sale_items (line 1..n, cart order)                              │
//! │  COMMIT                                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  cart.clear()   (only now; on any error the cart is left untouched)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Availability is decided by the ledger at commit time, never by the
//! quantities the operator saw when building the cart.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::session::{resolve_actor, Session, StaticSession};
use stockroom_core::sale::{sale_total, validate_lines, CheckoutLine};
use stockroom_core::{new_id, Cart, CoreError, PaymentMethod, Sale, SaleItem, ValidationError};

/// A sale together with its items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedSale {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

#[derive(Debug, Clone)]
pub struct SaleService {
    db: Database,
    session: Arc<dyn Session>,
    sale_location: String,
}

impl SaleService {
    /// `sale_location` is the name of the location checkouts decrement.
    pub fn new(db: Database, sale_location: impl Into<String>) -> Self {
        SaleService {
            db,
            session: Arc::new(StaticSession::anonymous()),
            sale_location: sale_location.into(),
        }
    }

    /// Identity recorded when an operation is given no explicit actor.
    pub fn with_session(mut self, session: Arc<dyn Session>) -> Self {
        self.session = session;
        self
    }

    /// Commits the cart as one sale and clears it.
    ///
    /// On any error the cart is unchanged so the operator can correct it and
    /// try again.
    pub async fn checkout(
        &self,
        cart: &mut Cart,
        payment_method: PaymentMethod,
        actor: Option<&str>,
    ) -> DbResult<CompletedSale> {
        let lines = cart.checkout_lines();
        let completed = self.commit_sale(&lines, payment_method, actor).await?;
        cart.clear();
        Ok(completed)
    }

    /// Commits raw `(product, quantity, unit price)` lines as one sale.
    pub async fn commit_sale(
        &self,
        lines: &[CheckoutLine],
        payment_method: PaymentMethod,
        actor: Option<&str>,
    ) -> DbResult<CompletedSale> {
        validate_lines(lines)?;

        let location = self.db.locations().require_by_name(&self.sale_location).await?;
        let now = Utc::now();

        let sale = Sale {
            id: new_id(),
            location_id: location.id.clone(),
            total_cents: sale_total(lines)?.cents(),
            payment_method,
            created_by: resolve_actor(&*self.session, actor),
            created_at: now,
        };

        let items = lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                Ok(SaleItem {
                    id: new_id(),
                    sale_id: sale.id.clone(),
                    line_number: i as i64 + 1,
                    product_id: line.product_id.clone(),
                    quantity: line.quantity,
                    unit_price_cents: line.unit_price_cents,
                    line_total_cents: line.line_total()?.cents(),
                    created_at: now,
                })
            })
            .collect::<Result<Vec<SaleItem>, CoreError>>()?;

        let mut tx = self.db.pool().begin().await?;

        for line in lines {
            if let Err(e) = self
                .db
                .stock()
                .adjust(&mut tx, &line.product_id, &location.id, -line.quantity)
                .await
            {
                warn!(product_id = %line.product_id, error = %e, "Checkout refused");
                return Err(e);
            }

            let product = self
                .db
                .products()
                .fetch_by_id(&mut *tx, &line.product_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Product", &line.product_id))?;

            if !product.is_active {
                warn!(product_id = %product.id, "Checkout refused: inactive product");
                return Err(ValidationError::InactiveProduct { id: product.id }.into());
            }
        }

        let sales = self.db.sales();
        sales.insert_sale(&mut *tx, &sale).await?;
        for item in &items {
            sales.insert_item(&mut *tx, item).await?;
        }

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            lines = items.len(),
            total_cents = sale.total_cents,
            payment_method = %sale.payment_method,
            "Sale committed"
        );

        Ok(CompletedSale { sale, items })
    }

    pub async fn get(&self, id: &str) -> DbResult<CompletedSale> {
        let sale = self
            .db
            .sales()
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;
        let items = self.db.sales().get_items(id).await?;

        Ok(CompletedSale { sale, items })
    }

    pub async fn items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        self.db.sales().get_items(sale_id).await
    }

    pub async fn list_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<Vec<Sale>> {
        self.db.sales().list_between(from, to).await
    }

    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        self.db.sales().list_recent(limit).await
    }

    /// Admin deletion of a sale and its items. Stock is not restored.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        self.db.sales().delete(id).await
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
    use stockroom_core::ProductUpdate;

    #[tokio::test]
    async fn test_checkout_decrements_store_and_records_sale() {
        let sr = stockroom().await;
        let product = product_with_stock(&sr, "Mango Juice", 450, 10, 0).await;
        let store = store_id(&sr).await;

        let mut cart = Cart::new();
        cart.add_product(&product, 3).unwrap();

        let completed = sr
            .sales()
            .checkout(&mut cart, PaymentMethod::Cash, Some("cashier-1"))
            .await
            .unwrap();

        assert_eq!(quantity(&sr, &product.id, &store).await, 7);
        assert_eq!(completed.sale.total_cents, 1350);
        assert_eq!(completed.sale.location_id, store);
        assert_eq!(completed.sale.created_by.as_deref(), Some("cashier-1"));
        assert_eq!(completed.items.len(), 1);
        assert_eq!(completed.items[0].quantity, 3);
        assert_eq!(completed.items[0].unit_price_cents, 450);
        assert!(cart.is_empty());

        let stored = sr.sales().get(&completed.sale.id).await.unwrap();
        assert_eq!(stored, completed);
    }

    #[tokio::test]
    async fn test_checkout_failure_is_atomic_and_keeps_cart() {
        let sr = stockroom().await;
        let plenty = product_with_stock(&sr, "Bread", 150, 20, 0).await;
        let scarce = product_with_stock(&sr, "Butter", 600, 2, 0).await;
        let store = store_id(&sr).await;

        let mut cart = Cart::new();
        cart.add_product(&plenty, 5).unwrap();
        cart.add_product(&scarce, 3).unwrap();
        let before = cart.clone();

        let err = sr
            .sales()
            .checkout(&mut cart, PaymentMethod::Card, None)
            .await
            .unwrap_err();

        match err {
            DbError::Core(CoreError::InsufficientStock {
                product_id,
                available,
                requested,
                ..
            }) => {
                assert_eq!(product_id, scarce.id);
                assert_eq!(available, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("unexpected error: {other}"),
        }

        // The first line's decrement was rolled back with the rest.
        assert_eq!(quantity(&sr, &plenty.id, &store).await, 20);
        assert_eq!(quantity(&sr, &scarce.id, &store).await, 2);
        assert_eq!(sr.db().sales().count().await.unwrap(), 0);
        assert_eq!(sr.db().sales().count_items().await.unwrap(), 0);
        assert_eq!(cart, before);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let sr = stockroom().await;
        let mut cart = Cart::new();

        let err = sr.sales().checkout(&mut cart, PaymentMethod::Cash, None).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Validation);
        assert_eq!(sr.db().sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_selling_last_unit_then_none_left() {
        let sr = stockroom().await;
        let product = product_with_stock(&sr, "Honey", 1200, 1, 0).await;
        let store = store_id(&sr).await;

        let line = [CheckoutLine::new(product.id.clone(), 1, 1200)];
        sr.sales().commit_sale(&line, PaymentMethod::Cash, None).await.unwrap();
        assert_eq!(quantity(&sr, &product.id, &store).await, 0);

        let err = sr.sales().commit_sale(&line, PaymentMethod::Cash, None).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InsufficientStock);
        assert_eq!(quantity(&sr, &product.id, &store).await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_for_last_unit() {
        let sr = stockroom().await;
        let product = product_with_stock(&sr, "Saffron", 2500, 1, 0).await;
        let store = store_id(&sr).await;

        let line = [CheckoutLine::new(product.id.clone(), 1, 2500)];
        let a = sr.sales();
        let b = sr.sales();

        let (ra, rb) = tokio::join!(
            a.commit_sale(&line, PaymentMethod::Cash, Some("till-a")),
            b.commit_sale(&line, PaymentMethod::Card, Some("till-b")),
        );

        assert_eq!(ra.is_ok() as u8 + rb.is_ok() as u8, 1);
        let failed = if ra.is_err() { ra.unwrap_err() } else { rb.unwrap_err() };
        assert_eq!(failed.code(), ErrorCode::InsufficientStock);

        assert_eq!(quantity(&sr, &product.id, &store).await, 0);
        assert_eq!(sr.db().sales().count().await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_checkouts_on_separate_connections() {
        let path = std::env::temp_dir().join(format!("stockroom-race-{}.db", new_id()));
        let db = Database::new(DbConfig::new(path.clone()).max_connections(4))
            .await
            .unwrap();
        let sr = Stockroom::new(db, StockroomConfig::default());
        let product = product_with_stock(&sr, "Cardamom", 900, 1, 0).await;
        let store = store_id(&sr).await;

        let line = vec![CheckoutLine::new(product.id.clone(), 1, 900)];
        let (a, b) = (sr.sales(), sr.sales());
        let (la, lb) = (line.clone(), line.clone());

        let ta = tokio::spawn(async move { a.commit_sale(&la, PaymentMethod::Cash, None).await });
        let tb = tokio::spawn(async move { b.commit_sale(&lb, PaymentMethod::Cash, None).await });
        let (ra, rb) = (ta.await.unwrap(), tb.await.unwrap());

        assert_eq!(ra.is_ok() as u8 + rb.is_ok() as u8, 1);
        assert_eq!(quantity(&sr, &product.id, &store).await, 0);
        assert_eq!(sr.db().sales().count().await.unwrap(), 1);

        sr.db().close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }

    #[tokio::test]
    async fn test_overflowing_price_is_rejected_before_any_write() {
        let sr = stockroom().await;
        let product = product_with_stock(&sr, "Gold Leaf", 1200, 5, 0).await;
        let store = store_id(&sr).await;

        let line = [CheckoutLine::new(product.id.clone(), 3, i64::MAX / 2)];
        let err = sr.sales().commit_sale(&line, PaymentMethod::Cash, None).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::Validation);
        assert_eq!(quantity(&sr, &product.id, &store).await, 5);
        assert_eq!(sr.db().sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let sr = stockroom().await;
        let line = [CheckoutLine::new("no-such-product", 1, 100)];

        let err = sr.sales().commit_sale(&line, PaymentMethod::Cash, None).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_inactive_product_cannot_be_sold() {
        let sr = stockroom().await;
        let product = product_with_stock(&sr, "Old Stock", 100, 5, 0).await;
        let store = store_id(&sr).await;
        sr.db()
            .products()
            .update(
                &product.id,
                &ProductUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let line = [CheckoutLine::new(product.id.clone(), 1, 100)];
        let err = sr.sales().commit_sale(&line, PaymentMethod::Cash, None).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Validation);
        assert_eq!(quantity(&sr, &product.id, &store).await, 5);
    }

    #[tokio::test]
    async fn test_items_keep_cart_order_and_frozen_price() {
        let sr = stockroom().await;
        let tea = product_with_stock(&sr, "Tea", 300, 10, 0).await;
        let milk = product_with_stock(&sr, "Milk", 180, 10, 0).await;

        let mut cart = Cart::new();
        cart.add_product(&milk, 2).unwrap();
        cart.add_product(&tea, 1).unwrap();

        sr.db()
            .products()
            .update(
                &milk.id,
                &ProductUpdate {
                    sell_price_cents: Some(999),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let completed = sr.sales().checkout(&mut cart, PaymentMethod::Wallet, None).await.unwrap();
        let items = sr.sales().items(&completed.sale.id).await.unwrap();

        assert_eq!(items[0].line_number, 1);
        assert_eq!(items[0].product_id, milk.id);
        assert_eq!(items[0].unit_price_cents, 180);
        assert_eq!(items[1].product_id, tea.id);
        assert_eq!(completed.sale.total_cents, 2 * 180 + 300);
    }

    #[tokio::test]
    async fn test_delete_sale_removes_items_but_not_stock() {
        let sr = stockroom().await;
        let product = product_with_stock(&sr, "Rice", 500, 4, 0).await;
        let store = store_id(&sr).await;

        let line = [CheckoutLine::new(product.id.clone(), 2, 500)];
        let completed = sr.sales().commit_sale(&line, PaymentMethod::Cash, None).await.unwrap();

        sr.sales().delete(&completed.sale.id).await.unwrap();
        assert_eq!(sr.db().sales().count_items().await.unwrap(), 0);
        assert_eq!(quantity(&sr, &product.id, &store).await, 2);

        let err = sr.sales().get(&completed.sale.id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_product_with_sales_cannot_be_hard_deleted() {
        let sr = stockroom().await;
        let product = product_with_stock(&sr, "Vinegar", 200, 3, 0).await;

        let line = [CheckoutLine::new(product.id.clone(), 1, 200)];
        sr.sales().commit_sale(&line, PaymentMethod::Cash, None).await.unwrap();

        let err = sr.db().products().delete(&product.id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Conflict);
    }
}
