//! # Read Views
//!
//! Pure aggregations over ledger rows and sale history. Nothing here is
//! persisted; the database layer fetches a snapshot and hands it over, so
//! the same snapshot always yields the same report.
//!
//! Every grouping uses a `BTreeMap` so output order is stable.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ledger::is_low_stock;
use crate::types::{InventoryRow, PaymentMethod, Sale};

// =============================================================================
// Revenue
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LocationRevenue {
    pub location_id: String,
    pub location: String,
    pub sales_count: i64,
    pub total_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailyRevenue {
    /// Calendar day in UTC.
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub sales_count: i64,
    pub total_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentRevenue {
    pub payment_method: PaymentMethod,
    pub sales_count: i64,
    pub total_cents: i64,
}

/// Revenue totals for a set of sales.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RevenueReport {
    pub sales_count: i64,
    pub total_cents: i64,
    pub by_location: Vec<LocationRevenue>,
    pub by_day: Vec<DailyRevenue>,
    pub by_payment_method: Vec<PaymentRevenue>,
}

#[derive(Default)]
struct Bucket {
    count: i64,
    total: i64,
}

impl Bucket {
    fn add(&mut self, cents: i64) {
        self.count += 1;
        self.total += cents;
    }
}

/// Builds a revenue report.
///
/// `location_names` maps location id to display name; unknown ids fall back
/// to the id itself.
pub fn revenue_report(sales: &[Sale], location_names: &HashMap<String, String>) -> RevenueReport {
    let mut by_location: BTreeMap<&str, Bucket> = BTreeMap::new();
    let mut by_day: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();
    let mut by_method: BTreeMap<PaymentMethod, Bucket> = BTreeMap::new();
    let mut overall = Bucket::default();

    for sale in sales {
        overall.add(sale.total_cents);
        by_location.entry(sale.location_id.as_str()).or_default().add(sale.total_cents);
        by_day.entry(sale.created_at.date_naive()).or_default().add(sale.total_cents);
        by_method.entry(sale.payment_method).or_default().add(sale.total_cents);
    }

    RevenueReport {
        sales_count: overall.count,
        total_cents: overall.total,
        by_location: by_location
            .into_iter()
            .map(|(id, b)| LocationRevenue {
                location_id: id.to_string(),
                location: location_names.get(id).cloned().unwrap_or_else(|| id.to_string()),
                sales_count: b.count,
                total_cents: b.total,
            })
            .collect(),
        by_day: by_day
            .into_iter()
            .map(|(date, b)| DailyRevenue {
                date,
                sales_count: b.count,
                total_cents: b.total,
            })
            .collect(),
        by_payment_method: by_method
            .into_iter()
            .map(|(payment_method, b)| PaymentRevenue {
                payment_method,
                sales_count: b.count,
                total_cents: b.total,
            })
            .collect(),
    }
}

// =============================================================================
// Low Stock
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LocationQuantity {
    pub location_id: String,
    pub location: String,
    pub quantity: i64,
}

/// A product flagged because at least one location is below the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LowStockItem {
    pub product_id: String,
    pub name: String,
    pub barcode: Option<String>,
    /// Quantity at every location, including the ones that are fine.
    pub locations: Vec<LocationQuantity>,
}

impl LowStockItem {
    /// Locations currently below `threshold`.
    pub fn short_locations(&self, threshold: i64) -> impl Iterator<Item = &LocationQuantity> {
        self.locations.iter().filter(move |l| is_low_stock(l.quantity, threshold))
    }
}

/// Groups inventory rows by product and keeps products where any location is
/// strictly below `threshold`.
///
/// Rows must cover every (product, location) pair, with absent entries as 0;
/// the output keeps the order in which products first appear.
pub fn low_stock(rows: &[InventoryRow], threshold: i64) -> Vec<LowStockItem> {
    let mut order: Vec<&str> = Vec::new();
    let mut grouped: HashMap<&str, LowStockItem> = HashMap::new();

    for row in rows {
        let item = grouped.entry(row.product_id.as_str()).or_insert_with(|| {
            order.push(row.product_id.as_str());
            LowStockItem {
                product_id: row.product_id.clone(),
                name: row.name.clone(),
                barcode: row.barcode.clone(),
                locations: Vec::new(),
            }
        });
        item.locations.push(LocationQuantity {
            location_id: row.location_id.clone(),
            location: row.location.clone(),
            quantity: row.quantity,
        });
    }

    order
        .into_iter()
        .filter_map(|id| grouped.remove(id))
        .filter(|item| item.locations.iter().any(|l| is_low_stock(l.quantity, threshold)))
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
