//! # Services
//!
//! The four mutating operations and the read views, each composed from
//! repositories inside a single transaction.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Stockroom                                      │
//! │                                                                         │
//! │   sales()      ── checkout: ledger -qty per line + Sale + SaleItems     │
//! │   transfers()  ── transfer: ledger -q at source, +q at dest + Transfer  │
//! │   receiving()  ── receive:  [create product] + ledger +q + Purchase     │
//! │   stock()      ── adjust:   ledger ±q + StockAdjustment                 │
//! │   reports()    ── inventory summary, low stock, revenue (read only)     │
//! │                                                                         │
//! │   Every mutation: BEGIN → writes → COMMIT, or drop → ROLLBACK           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod receiving;
pub mod report;
pub mod sale;
pub mod stock;
pub mod transfer;

use std::sync::Arc;

use crate::config::StockroomConfig;
use crate::error::DbResult;
use crate::pool::Database;
use crate::session::{Session, StaticSession};

use receiving::ReceivingService;
use report::ReportService;
use sale::SaleService;
use stock::StockService;
use transfer::TransferService;

/// A database handle, the settings the services need and the session whose
/// actor is stamped on `created_by`.
///
/// ```rust,ignore
/// let stockroom = Stockroom::open(StockroomConfig::from_env())
///     .await?
///     .with_session(StaticSession::new("cashier-1"));
/// let outcome = stockroom.receiving().receive(request, None).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Stockroom {
    db: Database,
    config: StockroomConfig,
    session: Arc<dyn Session>,
}

impl Stockroom {
    /// Connects (and migrates) using the config's database settings.
    pub async fn open(config: StockroomConfig) -> DbResult<Self> {
        let db = Database::new(config.db_config()).await?;
        Ok(Stockroom::new(db, config))
    }

    /// Starts with an anonymous session.
    pub fn new(db: Database, config: StockroomConfig) -> Self {
        Stockroom {
            db,
            config,
            session: Arc::new(StaticSession::anonymous()),
        }
    }

    pub fn with_session(mut self, session: impl Session + 'static) -> Self {
        self.session = Arc::new(session);
        self
    }

    pub fn session(&self) -> &dyn Session {
        self.session.as_ref()
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &StockroomConfig {
        &self.config
    }

    pub fn sales(&self) -> SaleService {
        SaleService::new(self.db.clone(), self.config.sale_location.clone()).with_session(self.session.clone())
    }

    pub fn transfers(&self) -> TransferService {
        TransferService::new(self.db.clone()).with_session(self.session.clone())
    }

    pub fn receiving(&self) -> ReceivingService {
        ReceivingService::new(
            self.db.clone(),
            self.config.receiving_location.clone(),
            self.config.sale_location.clone(),
        )
        .with_session(self.session.clone())
    }

    pub fn stock(&self) -> StockService {
        StockService::new(self.db.clone()).with_session(self.session.clone())
    }

    pub fn reports(&self) -> ReportService {
        ReportService::new(self.db.clone(), self.config.low_stock_threshold)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::pool::DbConfig;
    use stockroom_core::{NewProduct, Product, STORE_LOCATION, WAREHOUSE_LOCATION};

    pub async fn stockroom() -> Stockroom {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Stockroom::new(db, StockroomConfig::default())
    }

    pub async fn location_id(stockroom: &Stockroom, name: &str) -> String {
        stockroom.db().locations().require_by_name(name).await.unwrap().id
    }

    pub async fn store_id(stockroom: &Stockroom) -> String {
        location_id(stockroom, STORE_LOCATION).await
    }

    pub async fn warehouse_id(stockroom: &Stockroom) -> String {
        location_id(stockroom, WAREHOUSE_LOCATION).await
    }

    /// A product with the given stock at each default location.
    pub async fn product_with_stock(
        stockroom: &Stockroom,
        name: &str,
        price_cents: i64,
        store_qty: i64,
        warehouse_qty: i64,
    ) -> Product {
        let product = stockroom
            .db()
            .products()
            .create(NewProduct::new(name, price_cents))
            .await
            .unwrap();

        if store_qty > 0 {
            let store = store_id(stockroom).await;
            stockroom
                .stock()
                .adjust(&product.id, &store, store_qty, Some("opening stock"), None)
                .await
                .unwrap();
        }
        if warehouse_qty > 0 {
            let warehouse = warehouse_id(stockroom).await;
            stockroom
                .stock()
                .adjust(&product.id, &warehouse, warehouse_qty, Some("opening stock"), None)
                .await
                .unwrap();
        }

        product
    }

    pub async fn quantity(stockroom: &Stockroom, product_id: &str, location_id: &str) -> i64 {
        stockroom.db().stock().current_quantity(product_id, location_id).await.unwrap()
    }
}
