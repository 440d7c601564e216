//! # Configuration
//!
//! Settings loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`STOCKROOM_*`)
//! 2. Defaults (this file)
//!
//! Read-only after initialization.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use stockroom_core::{Money, LOW_STOCK_THRESHOLD, STORE_LOCATION, WAREHOUSE_LOCATION};
use tracing::warn;

use crate::pool::DbConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockroomConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Pool size.
    pub max_connections: u32,

    /// Location whose stock a checkout decrements.
    pub sale_location: String,

    /// Location a supplier receipt increments.
    pub receiving_location: String,

    /// Products with any location strictly below this are flagged.
    pub low_stock_threshold: i64,

    /// Currency symbol (for display)
    pub currency_symbol: String,
}

impl Default for StockroomConfig {
    fn default() -> Self {
        StockroomConfig {
            database_path: PathBuf::from("./stockroom.db"),
            max_connections: 5,
            sale_location: STORE_LOCATION.to_string(),
            receiving_location: WAREHOUSE_LOCATION.to_string(),
            low_stock_threshold: LOW_STOCK_THRESHOLD,
            currency_symbol: "$".to_string(),
        }
    }
}

impl StockroomConfig {
    /// Creates a config from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `STOCKROOM_DATABASE_PATH`: database file (default `./stockroom.db`)
    /// - `STOCKROOM_MAX_CONNECTIONS`: pool size (default 5)
    /// - `STOCKROOM_SALE_LOCATION`: default `Store`
    /// - `STOCKROOM_RECEIVING_LOCATION`: default `Warehouse`
    /// - `STOCKROOM_LOW_STOCK_THRESHOLD`: default 5
    /// - `STOCKROOM_CURRENCY_SYMBOL`: default `$`
    ///
    /// Unparseable numbers are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = StockroomConfig::default();

        if let Some(path) = lookup("STOCKROOM_DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(raw) = lookup("STOCKROOM_MAX_CONNECTIONS") {
            match raw.parse::<u32>() {
                Ok(n) if n > 0 => config.max_connections = n,
                _ => warn!(value = %raw, "Ignoring invalid STOCKROOM_MAX_CONNECTIONS"),
            }
        }

        if let Some(name) = lookup("STOCKROOM_SALE_LOCATION").filter(|v| !v.trim().is_empty()) {
            config.sale_location = name.trim().to_string();
        }

        if let Some(name) = lookup("STOCKROOM_RECEIVING_LOCATION").filter(|v| !v.trim().is_empty()) {
            config.receiving_location = name.trim().to_string();
        }

        if let Some(raw) = lookup("STOCKROOM_LOW_STOCK_THRESHOLD") {
            match raw.parse::<i64>() {
                Ok(n) if n >= 0 => config.low_stock_threshold = n,
                _ => warn!(value = %raw, "Ignoring invalid STOCKROOM_LOW_STOCK_THRESHOLD"),
            }
        }

        if let Some(symbol) = lookup("STOCKROOM_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        config
    }

    /// Pool settings for this config's database file.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone()).max_connections(self.max_connections)
    }

    /// Formats an amount with the configured currency symbol.
    pub fn format_money(&self, amount: Money) -> String {
        amount.format_with_symbol(&self.currency_symbol)
    }
}
