//! # stockroom-core: Pure Business Logic for Stockroom
//!
//! This crate holds the stock-and-sale consistency rules as pure functions
//! with zero I/O dependencies. The database crate applies these rules inside
//! transactions; this crate only decides what is allowed.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Browser front end                            │   │
//! │  │   Dashboard ─ Products ─ Sales ─ Transfers ─ Receive ─ Inventory│   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            ★ stockroom-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌────────┐ ┌────────┐ ┌────────┐ ┌─────────┐ ┌──────────┐   │   │
//! │  │   │ types  │ │ money  │ │  cart  │ │ ledger  │ │  report  │   │   │
//! │  │   │ sale   │ │        │ │        │ │ receipt │ │          │   │   │
//! │  │   └────────┘ └────────┘ └────────┘ └─────────┘ └──────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 stockroom-db (Database Layer)                   │   │
//! │  │        SQLite, migrations, repositories, atomic operations      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Product, Location, Sale, Transfer, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//! - [`cart`] - The operator's in-progress cart
//! - [`sale`] - Checkout line validation and totals
//! - [`ledger`] - Stock adjustment and transfer rules
//! - [`receipt`] - Stock receipt requests and purchase costing
//! - [`report`] - Read-view aggregation (revenue, low stock)
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::ledger::apply_delta;
//!
//! // 3 on the shelf, sell 3: allowed, leaves 0
//! assert_eq!(apply_delta("p1", "store", 3, -3).unwrap(), 0);
//!
//! // 0 on the shelf, sell 1: refused
//! assert!(apply_delta("p1", "store", 0, -1).is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod ledger;
pub mod money;
pub mod receipt;
pub mod report;
pub mod sale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Name of the point-of-sale location seeded by the initial migration.
pub const STORE_LOCATION: &str = "Store";

/// Name of the receiving location seeded by the initial migration.
pub const WAREHOUSE_LOCATION: &str = "Warehouse";

/// Quantity below which a product is flagged for operator attention.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity moved by a single cart line, transfer or receipt.
///
/// Catches fat-finger entries (typing 10000 instead of 10).
pub const MAX_QUANTITY: i64 = 9_999;

/// Maximum unit price, sell or cost, in cents (10,000,000.00).
///
/// Keeps `price × MAX_QUANTITY × MAX_CART_LINES` well inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000;

/// Generates a new entity identifier (UUID v4).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
