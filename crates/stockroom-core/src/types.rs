//! # Domain Types
//!
//! Entities shared by the core rules and the database layer.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────┐     ┌──────────────┐      ┌─────────────┐             │
//! │  │  Product    │◄────│  StockEntry  │─────►│  Location   │             │
//! │  │  prices     │     │  quantity≥0  │      │ Store/Ware- │             │
//! │  └─────────────┘     └──────────────┘      │ house       │             │
//! │         ▲                   ▲              └─────────────┘             │
//! │         │                   │ written only via ledger adjust           │
//! │         │        ┌──────────┼───────────┬───────────────┐             │
//! │  ┌──────┴─────┐  │  ┌───────┴──┐  ┌─────┴──────┐  ┌─────┴─────┐       │
//! │  │ Sale       │──┘  │ Transfer │  │ Adjustment │  │ Purchase  │       │
//! │  │ └ SaleItem │     └──────────┘  └────────────┘  └───────────┘       │
//! │  └────────────┘       append-only history                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every entity uses a UUID v4 string as `id`. Quantities are `i64`,
//! money is integer cents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
///
/// Stock is not stored here; see [`StockEntry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,

    /// Display name in the default language.
    pub name: String,

    /// Display name in the secondary (localized) language.
    pub name_localized: Option<String>,

    /// Barcode, unique when present.
    pub barcode: Option<String>,

    pub category: Option<String>,

    /// Last known cost price in cents.
    pub cost_price_cents: i64,

    /// Current selling price in cents.
    pub sell_price_cents: i64,

    /// Inactive products are hidden from the sales screen and cannot be sold.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn sell_price(&self) -> Money {
        Money::from_cents(self.sell_price_cents)
    }

    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }
}

/// Input for creating a product (add-product and stock-receipt flows).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub name_localized: Option<String>,
    pub barcode: Option<String>,
    pub category: Option<String>,
    pub cost_price_cents: i64,
    pub sell_price_cents: i64,
}

impl NewProduct {
    /// Creates a product draft with the required fields.
    pub fn new(name: impl Into<String>, sell_price_cents: i64) -> Self {
        NewProduct {
            name: name.into(),
            sell_price_cents,
            ..Default::default()
        }
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_cost_price(mut self, cost_price_cents: i64) -> Self {
        self.cost_price_cents = cost_price_cents;
        self
    }

    pub fn with_localized_name(mut self, name: impl Into<String>) -> Self {
        self.name_localized = Some(name.into());
        self
    }

    /// Validates and normalises the draft.
    ///
    /// Trims text fields, turns blank optionals into `None`.
    pub fn normalized(&self) -> Result<NewProduct, ValidationError> {
        crate::validation::validate_product_name(&self.name)?;
        crate::validation::validate_price_cents("cost price", self.cost_price_cents)?;
        crate::validation::validate_price_cents("selling price", self.sell_price_cents)?;

        let barcode = crate::validation::normalize_optional(self.barcode.as_deref());
        if let Some(code) = &barcode {
            crate::validation::validate_barcode(code)?;
        }

        Ok(NewProduct {
            name: self.name.trim().to_string(),
            name_localized: crate::validation::normalize_optional(self.name_localized.as_deref()),
            barcode,
            category: crate::validation::normalize_optional(self.category.as_deref()),
            cost_price_cents: self.cost_price_cents,
            sell_price_cents: self.sell_price_cents,
        })
    }
}

/// Partial update of a product's catalog fields.
///
/// Stock is deliberately absent: quantities change only through the ledger.
/// For the optional text fields, `Some(None)` clears the value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub name_localized: Option<Option<String>>,
    pub barcode: Option<Option<String>>,
    pub category: Option<Option<String>>,
    pub cost_price_cents: Option<i64>,
    pub sell_price_cents: Option<i64>,
    pub is_active: Option<bool>,
}

impl ProductUpdate {
    /// Returns `product` with this update applied, validated.
    pub fn apply_to(&self, product: &Product) -> Result<Product, ValidationError> {
        let mut updated = product.clone();

        if let Some(name) = &self.name {
            crate::validation::validate_product_name(name)?;
            updated.name = name.trim().to_string();
        }
        if let Some(name_localized) = &self.name_localized {
            updated.name_localized = crate::validation::normalize_optional(name_localized.as_deref());
        }
        if let Some(barcode) = &self.barcode {
            let barcode = crate::validation::normalize_optional(barcode.as_deref());
            if let Some(code) = &barcode {
                crate::validation::validate_barcode(code)?;
            }
            updated.barcode = barcode;
        }
        if let Some(category) = &self.category {
            updated.category = crate::validation::normalize_optional(category.as_deref());
        }
        if let Some(cost) = self.cost_price_cents {
            crate::validation::validate_price_cents("cost price", cost)?;
            updated.cost_price_cents = cost;
        }
        if let Some(price) = self.sell_price_cents {
            crate::validation::validate_price_cents("selling price", price)?;
            updated.sell_price_cents = price;
        }
        if let Some(active) = self.is_active {
            updated.is_active = active;
        }

        Ok(updated)
    }
}

// =============================================================================
// Location
// =============================================================================

/// A named stock-holding site ("Store", "Warehouse").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Location {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Stock Entry
// =============================================================================

/// Quantity of one product held at one location.
///
/// Invariant: `quantity >= 0`. Created implicitly on first adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockEntry {
    pub product_id: String,
    pub location_id: String,
    pub quantity: i64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Wallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Wallet => "wallet",
        }
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "wallet" => Ok(PaymentMethod::Wallet),
            other => Err(ValidationError::InvalidFormat {
                field: "payment method".to_string(),
                reason: format!("'{}' is not one of cash, card, wallet", other),
            }),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    /// Location whose stock was decremented.
    pub location_id: String,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item in a sale.
///
/// `unit_price_cents` is a frozen copy of the price at the time of sale,
/// not a live reference to the product's current price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    /// Position of the line within the sale, starting at 1.
    pub line_number: i64,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Transfer
// =============================================================================

/// One atomic move of stock between two locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Transfer {
    pub id: String,
    pub product_id: String,
    pub quantity: i64,
    pub from_location_id: String,
    pub to_location_id: String,
    pub note: Option<String>,
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Stock Adjustment
// =============================================================================

/// A signed manual correction to one location's stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockAdjustment {
    pub id: String,
    pub product_id: String,
    pub location_id: String,
    pub quantity_delta: i64,
    pub reason: Option<String>,
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Purchase
// =============================================================================

/// A supplier delivery received into the warehouse, with its cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Purchase {
    pub id: String,
    pub product_id: String,
    pub location_id: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
    pub additional_costs_cents: i64,
    /// `(unit_cost + additional_costs) × quantity`
    pub total_cost_cents: i64,
    pub reason: Option<String>,
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Purchase {
    #[inline]
    pub fn total_cost(&self) -> Money {
        Money::from_cents(self.total_cost_cents)
    }
}

// =============================================================================
// Inventory Row (read view)
// =============================================================================

/// One row of the inventory summary: product × location × quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryRow {
    pub product_id: String,
    pub name: String,
    pub barcode: Option<String>,
    pub location_id: String,
    pub location: String,
    pub quantity: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        let now = Utc::now();
        Product {
            id: "p-1".to_string(),
            name: "Mineral Water".to_string(),
            name_localized: None,
            barcode: Some("6281000000001".to_string()),
            category: Some("Drinks".to_string()),
            cost_price_cents: 40,
            sell_price_cents: 100,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_payment_method_round_trips_through_text() {
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!(" Card ".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert_eq!(PaymentMethod::Wallet.to_string(), "wallet");
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_payment_method_serializes_lowercase() {
        let json = serde_json::to_string(&PaymentMethod::Wallet).unwrap();
        assert_eq!(json, "\"wallet\"");
    }

    #[test]
    fn test_new_product_normalized_trims_and_blanks() {
        let draft = NewProduct::new("  Dates 500g ", 1250)
            .with_barcode("   ")
            .with_category(" Food ");

        let normalized = draft.normalized().unwrap();
        assert_eq!(normalized.name, "Dates 500g");
        assert_eq!(normalized.barcode, None);
        assert_eq!(normalized.category.as_deref(), Some("Food"));
    }

    #[test]
    fn test_new_product_rejects_empty_name() {
        assert!(NewProduct::new("  ", 100).normalized().is_err());
    }

    #[test]
    fn test_product_update_applies_partial_fields() {
        let update = ProductUpdate {
            sell_price_cents: Some(120),
            barcode: Some(None),
            ..Default::default()
        };

        let updated = update.apply_to(&product()).unwrap();
        assert_eq!(updated.sell_price_cents, 120);
        assert_eq!(updated.barcode, None);
        assert_eq!(updated.name, "Mineral Water");
        assert_eq!(updated.cost_price_cents, 40);
    }

    #[test]
    fn test_product_update_rejects_negative_price() {
        let update = ProductUpdate {
            sell_price_cents: Some(-1),
            ..Default::default()
        };
        assert!(update.apply_to(&product()).is_err());
    }
}
