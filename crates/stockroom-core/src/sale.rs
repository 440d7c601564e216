//! # Checkout Lines
//!
//! What a checkout commits: an ordered list of `(product, quantity, price)`
//! lines, validated and totalled here before the database opens a
//! transaction.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{validate_price_cents, validate_quantity};
use crate::MAX_CART_LINES;

/// One line of a checkout.
///
/// `unit_price_cents` is the price the operator saw when the line was added;
/// it is stored on the sale item as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl CheckoutLine {
    pub fn new(product_id: impl Into<String>, quantity: i64, unit_price_cents: i64) -> Self {
        CheckoutLine {
            product_id: product_id.into(),
            quantity,
            unit_price_cents,
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// `quantity × unit price`, rejected when it does not fit in cents.
    pub fn line_total(&self) -> CoreResult<Money> {
        self.unit_price()
            .checked_multiply_quantity(self.quantity)
            .ok_or_else(|| total_out_of_range("line total"))
    }
}

/// Validates a checkout before anything is written.
///
/// ## Rules
/// - At least one line
/// - At most [`MAX_CART_LINES`] lines
/// - Every quantity > 0, every unit price within `0..=MAX_PRICE_CENTS`
/// - The sale total fits in cents
pub fn validate_lines(lines: &[CheckoutLine]) -> CoreResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::EmptyCart.into());
    }

    if lines.len() > MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "cart lines".to_string(),
            min: 1,
            max: MAX_CART_LINES as i64,
        }
        .into());
    }

    for line in lines {
        if line.product_id.trim().is_empty() {
            return Err(ValidationError::required("product id").into());
        }
        validate_quantity(line.quantity)?;
        validate_price_cents("unit price", line.unit_price_cents)?;
    }

    sale_total(lines)?;
    Ok(())
}

/// `Σ quantity × unit price`.
///
/// ```rust
/// use stockroom_core::sale::{sale_total, CheckoutLine};
///
/// let lines = vec![CheckoutLine::new("a", 3, 250), CheckoutLine::new("b", 1, 99)];
/// assert_eq!(sale_total(&lines).unwrap().cents(), 849);
/// ```
pub fn sale_total(lines: &[CheckoutLine]) -> CoreResult<Money> {
    lines.iter().try_fold(Money::zero(), |total, line| {
        total
            .checked_add(line.line_total()?)
            .ok_or_else(|| total_out_of_range("sale total"))
    })
}

fn total_out_of_range(field: &str) -> CoreError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_checkout_rejected() {
        assert_eq!(
            validate_lines(&[]),
            Err(CoreError::Validation(ValidationError::EmptyCart))
        );
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let lines = vec![CheckoutLine::new("a", 0, 100)];
        assert!(validate_lines(&lines).is_err());
    }

    #[test]
    fn test_negative_price_rejected() {
        let lines = vec![CheckoutLine::new("a", 1, -100)];
        assert!(validate_lines(&lines).is_err());
    }

    #[test]
    fn test_free_item_allowed() {
        let lines = vec![CheckoutLine::new("a", 1, 0)];
        assert!(validate_lines(&lines).is_ok());
        assert!(sale_total(&lines).unwrap().is_zero());
    }

    #[test]
    fn test_total_of_three_units() {
        let lines = vec![CheckoutLine::new("p", 3, 450)];
        assert_eq!(sale_total(&lines).unwrap(), Money::from_cents(1350));
    }

    #[test]
    fn test_price_above_ceiling_rejected() {
        let lines = vec![CheckoutLine::new("a", 3, i64::MAX / 2)];
        assert!(matches!(
            validate_lines(&lines),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_overflowing_total_is_an_error() {
        let lines = vec![CheckoutLine::new("a", 3, i64::MAX / 2)];
        assert!(lines[0].line_total().is_err());
        assert!(sale_total(&lines).is_err());

        let many = vec![CheckoutLine::new("a", 1, i64::MAX); 2];
        assert!(sale_total(&many).is_err());
    }
}
