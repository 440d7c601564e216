//! # Stock Receipt
//!
//! Input and cost arithmetic for receiving supplier stock into the
//! warehouse.
//!
//! A receipt either targets a product that already exists, or carries the
//! draft of a new one. In the second case the database layer first looks for
//! a product with exactly the same name and falls back to creating it.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::NewProduct;
use crate::validation::{
    normalize_optional, validate_note, validate_positive_cents, validate_price_cents, validate_quantity,
};

/// Which product a receipt increases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ReceiptTarget {
    /// An existing product id.
    Existing(String),
    /// A product to match by name or create.
    New(NewProduct),
}

/// A supplier delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptRequest {
    pub target: ReceiptTarget,
    pub quantity: i64,
    pub unit_cost_cents: i64,
    pub additional_costs_cents: i64,
    pub reason: Option<String>,
}

impl ReceiptRequest {
    pub fn existing(product_id: impl Into<String>, quantity: i64, unit_cost_cents: i64) -> Self {
        ReceiptRequest {
            target: ReceiptTarget::Existing(product_id.into()),
            quantity,
            unit_cost_cents,
            additional_costs_cents: 0,
            reason: None,
        }
    }

    pub fn new_product(product: NewProduct, quantity: i64, unit_cost_cents: i64) -> Self {
        ReceiptRequest {
            target: ReceiptTarget::New(product),
            quantity,
            unit_cost_cents,
            additional_costs_cents: 0,
            reason: None,
        }
    }

    pub fn with_additional_costs(mut self, cents: i64) -> Self {
        self.additional_costs_cents = cents;
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Validates the request and returns a normalised copy.
    ///
    /// ## Rules
    /// - quantity > 0
    /// - unit cost > 0, additional costs >= 0
    /// - a new product needs a name and a selling price > 0
    pub fn validated(&self) -> CoreResult<ReceiptRequest> {
        validate_quantity(self.quantity)?;
        validate_positive_cents("unit cost", self.unit_cost_cents)?;
        validate_price_cents("additional costs", self.additional_costs_cents)?;

        let reason = normalize_optional(self.reason.as_deref());
        if let Some(reason) = &reason {
            validate_note(reason)?;
        }

        let target = match &self.target {
            ReceiptTarget::Existing(id) => {
                if id.trim().is_empty() {
                    return Err(ValidationError::required("product id").into());
                }
                ReceiptTarget::Existing(id.clone())
            }
            ReceiptTarget::New(draft) => {
                validate_positive_cents("selling price", draft.sell_price_cents)?;
                let mut draft = draft.normalized()?;
                // The delivery's unit cost becomes the product's cost price.
                draft.cost_price_cents = self.unit_cost_cents;
                ReceiptTarget::New(draft)
            }
        };

        Ok(ReceiptRequest {
            target,
            quantity: self.quantity,
            unit_cost_cents: self.unit_cost_cents,
            additional_costs_cents: self.additional_costs_cents,
            reason,
        })
    }

    pub fn total_cost(&self) -> CoreResult<Money> {
        purchase_total(self.quantity, self.unit_cost_cents, self.additional_costs_cents)
    }
}

/// `(unit cost + additional costs) × quantity`.
///
/// ```rust
/// use stockroom_core::receipt::purchase_total;
///
/// assert_eq!(purchase_total(10, 200, 100).unwrap().cents(), 3000);
/// ```
pub fn purchase_total(quantity: i64, unit_cost_cents: i64, additional_costs_cents: i64) -> CoreResult<Money> {
    unit_cost_cents
        .checked_add(additional_costs_cents)
        .and_then(|per_unit| per_unit.checked_mul(quantity))
        .map(Money::from_cents)
        .ok_or_else(|| {
            CoreError::Validation(ValidationError::OutOfRange {
                field: "total cost".to_string(),
                min: 0,
                max: i64::MAX,
            })
        })
}

// =============================================================================
// Unit Tests
// =============================================================================
