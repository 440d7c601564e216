//! # stockroom-db: Storage and Stock Operations for Stockroom
//!
//! SQLite persistence through sqlx, plus the operations that must keep the
//! stock ledger and the sale/transfer/purchase history consistent.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Data Flow                              │
//! │                                                                         │
//! │  Front end action (checkout, transfer, receive, adjust, view)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockroom-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌────────────────┐   │   │
//! │  │   │   Services    │──►│ Repositories  │──►│   Database     │   │   │
//! │  │   │ (service/)    │   │ (repository/) │   │   (pool.rs)    │   │   │
//! │  │   │               │   │               │   │                │   │   │
//! │  │   │ SaleService   │   │ StockRepo     │   │ SqlitePool     │   │   │
//! │  │   │ Transfer...   │   │ ProductRepo   │   │ WAL, FKs on    │   │   │
//! │  │   │ Receiving...  │   │ SaleRepo ...  │   │ migrations     │   │   │
//! │  │   └───────────────┘   └───────────────┘   └────────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │                   ./stockroom.db (default)                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Environment-driven settings
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types and error codes
//! - [`repository`] - Table-level access (products, stock, sales, ...)
//! - [`service`] - Atomic operations and read views
//! - [`session`] - Who is performing an operation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockroom_db::{Stockroom, StockroomConfig};
//! use stockroom_core::{Cart, PaymentMethod};
//!
//! let stockroom = Stockroom::open(StockroomConfig::from_env()).await?;
//!
//! let mut cart = Cart::new();
//! cart.add_product(&product, 2)?;
//! let sale = stockroom.sales().checkout(&mut cart, PaymentMethod::Cash, None).await?;
//!
//! let low = stockroom.reports().low_stock().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;
pub mod session;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::StockroomConfig;
pub use error::{DbError, DbResult, ErrorCode};
pub use pool::{Database, DbConfig};
pub use session::{Session, StaticSession};

// Repository re-exports for convenience
pub use repository::location::LocationRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use repository::stock::StockRepository;

// Service re-exports
pub use service::receiving::{ReceiptOutcome, ReceivingService};
pub use service::report::ReportService;
pub use service::sale::{CompletedSale, SaleService};
pub use service::stock::StockService;
pub use service::transfer::TransferService;
pub use service::Stockroom;
