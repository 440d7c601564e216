//! # Report Service
//!
//! Read-only views, recomputed from the ledger and sale history on every
//! call. Nothing here writes, so two calls with no mutation in between
//! return the same result.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use tracing::debug;

use crate::error::DbResult;
use crate::pool::Database;
use stockroom_core::report::{low_stock, revenue_report, LowStockItem, RevenueReport};
use stockroom_core::InventoryRow;

#[derive(Debug, Clone)]
pub struct ReportService {
    db: Database,
    threshold: i64,
}

impl ReportService {
    pub fn new(db: Database, threshold: i64) -> Self {
        ReportService { db, threshold }
    }

    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    /// Every active product at every location (or only `location`, by
    /// name), missing entries reported as 0.
    pub async fn inventory_summary(&self, location: Option<&str>) -> DbResult<Vec<InventoryRow>> {
        self.db.stock().summary(location).await
    }

    /// Products strictly below the threshold at one or more locations.
    pub async fn low_stock(&self) -> DbResult<Vec<LowStockItem>> {
        let rows = self.db.stock().summary(None).await?;
        let items = low_stock(&rows, self.threshold);
        debug!(threshold = self.threshold, count = items.len(), "Low stock computed");
        Ok(items)
    }

    /// Revenue for sales with `from <= created_at < to`.
    pub async fn revenue(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<RevenueReport> {
        let sales = self.db.sales().list_between(from, to).await?;
        let names = self.db.locations().name_map().await?;
        Ok(revenue_report(&sales, &names))
    }

    /// Revenue for one UTC calendar day.
    pub async fn revenue_for_day(&self, date: NaiveDate) -> DbResult<RevenueReport> {
        let start = Utc.from_utc_datetime(&date.and_time(NaiveTime::default()));
        self.revenue(start, start + Duration::days(1)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::*;
    use stockroom_core::{Cart, PaymentMethod};

    #[tokio::test]
    async fn test_low_stock_flags_any_short_location() {
        let sr = stockroom().await;
        let plenty = product_with_stock(&sr, "Rice 5kg", 1200, 10, 10).await;
        let short_store = product_with_stock(&sr, "Lentils", 400, 2, 50).await;
        let nothing = product_with_stock(&sr, "Saffron", 900, 0, 0).await;

        let items = sr.reports().low_stock().await.unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.product_id.as_str()).collect();

        assert!(!ids.contains(&plenty.id.as_str()));
        assert!(ids.contains(&short_store.id.as_str()));
        assert!(ids.contains(&nothing.id.as_str()));

        let lentils = items.iter().find(|i| i.product_id == short_store.id).unwrap();
        let short: Vec<&str> = lentils.short_locations(sr.reports().threshold()).map(|l| l.location.as_str()).collect();
        assert_eq!(short, vec!["Store"]);

        // No entries at all still shows both locations at 0.
        let saffron = items.iter().find(|i| i.product_id == nothing.id).unwrap();
        assert_eq!(saffron.locations.len(), 2);
        assert!(saffron.locations.iter().all(|l| l.quantity == 0));
    }

    #[tokio::test]
    async fn test_threshold_is_strict() {
        let sr = stockroom().await;
        product_with_stock(&sr, "Tea", 500, 5, 5).await;

        assert!(sr.reports().low_stock().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inventory_summary_filter_and_idempotence() {
        let sr = stockroom().await;
        product_with_stock(&sr, "Beans", 250, 3, 7).await;
        product_with_stock(&sr, "Apples", 100, 0, 4).await;

        let first = sr.reports().inventory_summary(None).await.unwrap();
        let second = sr.reports().inventory_summary(None).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
        assert_eq!(first[0].name, "Apples");

        let store_only = sr.reports().inventory_summary(Some("Store")).await.unwrap();
        assert_eq!(store_only.len(), 2);
        assert!(store_only.iter().all(|r| r.location == "Store"));

        assert_eq!(sr.reports().low_stock().await.unwrap(), sr.reports().low_stock().await.unwrap());
    }

    #[tokio::test]
    async fn test_revenue_groups_sales() {
        let sr = stockroom().await;
        let bread = product_with_stock(&sr, "Bread", 300, 10, 0).await;
        let milk = product_with_stock(&sr, "Milk", 150, 10, 0).await;

        let mut cart = Cart::new();
        cart.add_product(&bread, 2).unwrap();
        sr.sales().checkout(&mut cart, PaymentMethod::Cash, None).await.unwrap();

        cart.add_product(&milk, 3).unwrap();
        sr.sales().checkout(&mut cart, PaymentMethod::Card, None).await.unwrap();

        let today = Utc::now().date_naive();
        let report = sr.reports().revenue_for_day(today).await.unwrap();

        assert_eq!(report.sales_count, 2);
        assert_eq!(report.total_cents, 1050);
        assert_eq!(report.by_location.len(), 1);
        assert_eq!(report.by_location[0].location, "Store");
        assert_eq!(report.by_day.len(), 1);
        assert_eq!(report.by_day[0].date, today);
        assert_eq!(report.by_payment_method.len(), 2);

        let yesterday = sr.reports().revenue_for_day(today - Duration::days(1)).await.unwrap();
        assert_eq!(yesterday, RevenueReport::default());
    }
}
