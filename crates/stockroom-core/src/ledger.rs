//! # Ledger Rules
//!
//! The arithmetic that every stock write must obey, independent of storage.
//!
//! ## Single Entry Point
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Who may change a stock quantity?                      │
//! │                                                                         │
//! │   checkout ──────┐                                                      │
//! │   transfer ──────┤                                                      │
//! │   receipt  ──────┼──► adjust(product, location, delta) ──► StockEntry   │
//! │   adjustment ────┘          │                                           │
//! │                             └── current + delta < 0 ? InsufficientStock │
//! │                                                                         │
//! │   Nothing else. No "SET quantity = 7" from a form field.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The database layer enforces the same rule with a conditional update; the
//! functions here are what it falls back on to describe a refusal, and what
//! pure callers use to plan a movement.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::validation::{validate_delta, validate_quantity};

/// One signed change to one location's stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub location_id: String,
    pub delta: i64,
}

/// Applies `delta` to `current`, refusing to go below zero.
///
/// ## Returns
/// * `Ok(new_quantity)`
/// * `Err(CoreError::InsufficientStock)` when `current + delta < 0`
/// * `Err(CoreError::Validation)` when `delta == 0`
///
/// ```rust
/// use stockroom_core::ledger::apply_delta;
///
/// assert_eq!(apply_delta("p", "wh", 0, 10).unwrap(), 10);
/// assert_eq!(apply_delta("p", "wh", 10, -4).unwrap(), 6);
/// assert!(apply_delta("p", "wh", 2, -5).is_err());
/// ```
pub fn apply_delta(product_id: &str, location_id: &str, current: i64, delta: i64) -> CoreResult<i64> {
    validate_delta(delta)?;

    match current.checked_add(delta) {
        Some(next) if next >= 0 => Ok(next),
        _ => Err(insufficient(product_id, location_id, current, -delta)),
    }
}

/// Builds the refusal for a decrement of `requested` units against
/// `available`.
pub fn insufficient(product_id: &str, location_id: &str, available: i64, requested: i64) -> CoreError {
    CoreError::InsufficientStock {
        product_id: product_id.to_string(),
        location_id: location_id.to_string(),
        available,
        requested,
    }
}

/// Plans a transfer as two movements: `-quantity` at the source, `+quantity`
/// at the destination.
///
/// Checked before any stock is touched:
/// - `quantity > 0` (else `Validation`)
/// - `from != to` (else `InvalidLocation`)
///
/// Availability at the source is not known here; the ledger checks it at
/// commit time.
pub fn plan_transfer(from_location_id: &str, to_location_id: &str, quantity: i64) -> CoreResult<[Movement; 2]> {
    validate_quantity(quantity)?;

    if from_location_id == to_location_id {
        return Err(CoreError::invalid_location(format!(
            "source and destination are the same location ({})",
            from_location_id
        )));
    }

    Ok([
        Movement {
            location_id: from_location_id.to_string(),
            delta: -quantity,
        },
        Movement {
            location_id: to_location_id.to_string(),
            delta: quantity,
        },
    ])
}

/// Low-stock policy: strictly below the threshold.
#[inline]
pub fn is_low_stock(quantity: i64, threshold: i64) -> bool {
    quantity < threshold
}

// =============================================================================
// Unit Tests
// =============================================================================
