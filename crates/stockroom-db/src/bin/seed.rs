//! # Seed Data Generator
//!
//! Fills a development database through the real operations: every product
//! arrives as a supplier receipt at the warehouse, then part of it is moved
//! to the store with a transfer.
//!
//! ## Usage
//! ```bash
//! # Generate 40 products (default)
//! cargo run -p stockroom-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p stockroom-db --bin seed -- --count 100
//!
//! # Specify database path
//! cargo run -p stockroom-db --bin seed -- --db ./data/stockroom.db
//! ```
//!
//! Logging follows `RUST_LOG` (default `info`).

use std::env;

use stockroom_core::receipt::ReceiptRequest;
use stockroom_core::{Money, NewProduct};
use stockroom_db::{Session, StaticSession, Stockroom, StockroomConfig};
use tracing_subscriber::EnvFilter;

/// Product names per category code, for realistic demo data.
const CATEGORIES: &[(&str, &[&str])] = &[
    ("PAN", &["Basmati Rice", "Brown Rice", "Red Lentils", "Chickpeas", "Wheat Flour", "Sugar", "Salt", "Oats"]),
    ("OIL", &["Olive Oil", "Sunflower Oil", "Ghee", "Butter"]),
    ("SPC", &["Cumin", "Turmeric", "Black Pepper", "Chili Powder", "Cardamom", "Cinnamon"]),
    ("BEV", &["Black Tea", "Green Tea", "Ground Coffee", "Mineral Water", "Orange Juice", "Cola"]),
    ("DRY", &["Whole Milk", "Yogurt", "Cheddar", "Eggs Dozen"]),
];

/// Pack size suffixes and the price they add.
const SIZES: &[(&str, i64)] = &[("500g", 0), ("1kg", 150), ("5kg", 600)];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut config = StockroomConfig::from_env();
    let mut count: usize = 40;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(40);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to receive (default: 40)");
                println!("  -d, --db <PATH>    Database file path (default: ./stockroom.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Stockroom Seed Data Generator");
    println!("=============================");
    println!("Database: {}", config.database_path.display());
    println!("Products: {}", count);
    println!();

    let stockroom = Stockroom::open(config).await?.with_session(StaticSession::new("seed"));
    println!("✓ Connected to database, migrations applied");
    println!("  Recording changes as {}", stockroom.session().current_actor().unwrap_or_default());

    let existing = stockroom.db().products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let receiving = stockroom.receiving();
    let transfers = stockroom.transfers();
    let sale_location = stockroom.config().sale_location.clone();
    let receiving_location = stockroom.config().receiving_location.clone();

    let mut received = 0;
    let mut spent = Money::zero();
    let start = std::time::Instant::now();

    'outer: for (category_idx, (code, names)) in CATEGORIES.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            for (size_idx, (size, price_addon)) in SIZES.iter().enumerate() {
                if received >= count {
                    break 'outer;
                }

                let seed = category_idx * 100 + name_idx * 10 + size_idx;
                let request = receipt_for(code, name, size, *price_addon, seed);
                let shelf_qty = (request.quantity / 2).min((seed % 9) as i64);

                let outcome = match receiving.receive(request, None).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        eprintln!("Failed to receive {} {}: {}", name, size, e);
                        continue;
                    }
                };
                spent += outcome.purchase.total_cost();

                if shelf_qty > 0 {
                    transfers
                        .transfer_by_name(
                            &outcome.product.id,
                            &receiving_location,
                            &sale_location,
                            shelf_qty,
                            None,
                            Some("initial shelf fill"),
                        )
                        .await?;
                }

                received += 1;
            }
        }
    }

    println!(
        "✓ Received {} products in {:?} (cost {})",
        received,
        start.elapsed(),
        stockroom.config().format_money(spent)
    );

    println!();
    println!("Inventory");
    println!("---------");
    for row in stockroom.reports().inventory_summary(None).await? {
        println!("  {:<28} {:<10} {:>5}", row.name, row.location, row.quantity);
    }

    let threshold = stockroom.reports().threshold();
    let low = stockroom.reports().low_stock().await?;
    println!();
    println!("Low stock (below {}): {} products", threshold, low.len());
    for item in &low {
        let short: Vec<String> = item
            .short_locations(threshold)
            .map(|l| format!("{}={}", l.location, l.quantity))
            .collect();
        println!("  {:<28} {}", item.name, short.join(", "));
    }

    if env::var("STOCKROOM_SEED_JSON").is_ok() {
        println!();
        println!("{}", serde_json::to_string_pretty(&low)?);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// A new-product receipt with deterministic prices and quantities.
fn receipt_for(code: &str, name: &str, size: &str, price_addon: i64, seed: usize) -> ReceiptRequest {
    // Price: 0.99 - 8.98 plus the size addon
    let sell_price_cents = 99 + ((seed * 17) % 800) as i64 + price_addon;

    // Cost: 55-75% of price
    let unit_cost_cents = (sell_price_cents * (55 + (seed % 21) as i64) / 100).max(1);

    let quantity = 2 + ((seed * 7) % 40) as i64;

    let product = NewProduct::new(format!("{} {}", name, size), sell_price_cents)
        .with_category(code)
        .with_barcode(format!("200{:010}", seed));

    ReceiptRequest::new_product(product, quantity, unit_cost_cents)
        .with_additional_costs((seed % 3) as i64 * 50)
        .with_reason("Opening stock")
}
