//! # Cart
//!
//! The operator's in-progress sale, held in memory by the caller.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Operator Action            Method                 Cart Change          │
//! │  ───────────────            ──────                 ───────────          │
//! │  Click "Add" ─────────────► add_product() ───────► push or qty + n      │
//! │  Edit quantity ───────────► update_quantity() ───► qty = n (≤0 removes) │
//! │  Remove line ─────────────► remove() ────────────► line dropped         │
//! │  Checkout succeeded ──────► clear() ─────────────► empty                │
//! │  Checkout failed ─────────► (nothing) ───────────► kept for correction  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Quantities shown in the cart are never used to decide whether a sale is
//! allowed; the ledger decides at commit time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::sale::CheckoutLine;
use crate::types::Product;
use crate::validation::{validate_price_cents, ValidationResult};
use crate::{MAX_CART_LINES, MAX_QUANTITY};

/// A line in the cart.
///
/// Name and price are frozen when the line is added, so the cart displays
/// and charges consistently even if the catalog changes meanwhile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price_cents: product.sell_price_cents,
            quantity,
            added_at: Utc::now(),
        }
    }

    /// Display total; saturates, the checkout recomputes it with overflow checks.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents) * self.quantity
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding the same product increases quantity)
/// - Every quantity is > 0
/// - At most [`MAX_CART_LINES`] lines, at most [`MAX_QUANTITY`] per line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    pub lines: Vec<CartLine>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Cart {
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds `quantity` of a product, merging with an existing line.
    pub fn add_product(&mut self, product: &Product, quantity: i64) -> ValidationResult<()> {
        if quantity <= 0 {
            return Err(ValidationError::must_be_positive("quantity"));
        }

        if !product.is_active {
            return Err(ValidationError::InactiveProduct {
                id: product.id.clone(),
            });
        }

        validate_price_cents("unit price", product.sell_price_cents)?;

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            let new_qty = line.quantity + quantity;
            if new_qty > MAX_QUANTITY {
                return Err(quantity_out_of_range());
            }
            line.quantity = new_qty;
            return Ok(());
        }

        if quantity > MAX_QUANTITY {
            return Err(quantity_out_of_range());
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(ValidationError::OutOfRange {
                field: "cart lines".to_string(),
                min: 1,
                max: MAX_CART_LINES as i64,
            });
        }

        self.lines.push(CartLine::from_product(product, quantity));
        Ok(())
    }

    /// Sets a line's quantity. Zero or negative removes the line.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> ValidationResult<()> {
        if quantity <= 0 {
            return self.remove(product_id);
        }

        if quantity > MAX_QUANTITY {
            return Err(quantity_out_of_range());
        }

        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => {
                line.quantity = quantity;
                Ok(())
            }
            None => Err(not_in_cart(product_id)),
        }
    }

    pub fn remove(&mut self, product_id: &str) -> ValidationResult<()> {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);

        if self.lines.len() == before {
            Err(not_in_cart(product_id))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.created_at = Utc::now();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// The lines to commit, in cart order.
    pub fn checkout_lines(&self) -> Vec<CheckoutLine> {
        self.lines
            .iter()
            .map(|l| CheckoutLine::new(l.product_id.clone(), l.quantity, l.unit_price_cents))
            .collect()
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

fn quantity_out_of_range() -> ValidationError {
    ValidationError::OutOfRange {
        field: "quantity".to_string(),
        min: 1,
        max: MAX_QUANTITY,
    }
}

fn not_in_cart(product_id: &str) -> ValidationError {
    ValidationError::InvalidFormat {
        field: "product id".to_string(),
        reason: format!("product {} is not in the cart", product_id),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
