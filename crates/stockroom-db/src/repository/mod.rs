//! # Repository Module
//!
//! Typed data access for Stockroom. Each repository owns a pool handle for
//! standalone reads; the methods used inside a transaction take an executor
//! (or `&mut SqliteConnection`) instead, so a service can compose several of
//! them into one atomic write.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Service                                                                │
//! │       │  let mut tx = db.pool().begin().await?;                         │
//! │       │  db.stock().adjust(&mut tx, ...)                                │
//! │       │  db.transfers().insert(&mut *tx, &transfer)                     │
//! │       │  tx.commit().await?;                                            │
//! │       ▼                                                                 │
//! │  Repositories ──► SQLite                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD and search
//! - [`LocationRepository`](location::LocationRepository) - Named stock locations
//! - [`StockRepository`](stock::StockRepository) - The inventory ledger
//! - [`SaleRepository`](sale::SaleRepository) - Sales and sale items
//! - [`TransferRepository`](transfer::TransferRepository) - Transfer history
//! - [`AdjustmentRepository`](adjustment::AdjustmentRepository) - Manual corrections
//! - [`PurchaseRepository`](purchase::PurchaseRepository) - Supplier receipts

pub mod adjustment;
pub mod location;
pub mod product;
pub mod purchase;
pub mod sale;
pub mod stock;
pub mod transfer;
