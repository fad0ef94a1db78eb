//! # Seed Data Generator
//!
//! Populates a database with a clothing catalogue and received stock lots
//! for development.
//!
//! ## Usage
//! ```bash
//! # Default: every product, 3 lots per size
//! cargo run -p stockbook-db --bin seed
//!
//! # More lots per size, custom database
//! cargo run -p stockbook-db --bin seed -- --lots 5 --db ./data/stockbook.db
//! ```
//!
//! ## Generated Data
//! - One catalogue listing per product and size, MRP ₹399 - ₹2,499
//! - `--lots` Added movements per size, a week apart, 2-12 units each
//! - Every fifth lot carries a supplier note

use chrono::{Duration, Utc};
use std::env;
use stockbook_core::{InventoryMovement, Money, ProductListing, Size};
use stockbook_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;

/// (product, base MRP in rupees, sizes)
const CATALOGUE: &[(&str, i64, &[&str])] = &[
    ("Linen Shirt", 1_499, &["S", "M", "L", "XL"]),
    ("Oxford Shirt", 1_299, &["S", "M", "L", "XL", "XXL"]),
    ("Graphic Tee", 599, &["XS", "S", "M", "L", "XL"]),
    ("Polo Tee", 899, &["S", "M", "L", "XL"]),
    ("Slim Chinos", 1_799, &["28", "30", "32", "34", "36"]),
    ("Denim Jeans", 2_199, &["28", "30", "32", "34", "36", "38"]),
    ("Track Pants", 999, &["S", "M", "L", "XL", "XXL"]),
    ("Hoodie", 1_999, &["M", "L", "XL", "XXL"]),
    ("Kurta", 1_199, &["S", "M", "L", "XL", "XXL", "XXXL"]),
    ("Socks (3 pack)", 399, &["FREE"]),
];

const SUPPLIERS: &[&str] = &["Tiruppur Knits", "Ludhiana Mills", "Surat Textiles"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut lots_per_size: i64 = 3;
    let mut db_path = String::from("./stockbook_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--lots" | "-l" => {
                if i + 1 < args.len() {
                    lots_per_size = args[i + 1].parse().unwrap_or(3);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockbook Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -l, --lots <N>     Stock lots per product size (default: 3)");
                println!("  -d, --db <PATH>    Database file path (default: ./stockbook_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Stockbook Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!("Lots per size: {}", lots_per_size);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} listings", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating catalogue and stock...");

    let start = std::time::Instant::now();
    let mut listings = 0;
    let mut movements = Vec::new();
    let mut seed = 0_usize;

    for (product, base_mrp, sizes) in CATALOGUE {
        for (size_idx, label) in sizes.iter().enumerate() {
            let size = Size::new(label);
            // Larger sizes cost a little more
            let mrp = Money::from_major(base_mrp + 50 * size_idx as i64);

            db.products()
                .upsert(&ProductListing {
                    product: product.to_string(),
                    size: size.clone(),
                    mrp_cents: mrp.cents(),
                })
                .await?;
            listings += 1;

            for lot in 0..lots_per_size {
                movements.push(generate_lot(product, &size, mrp, lot, lots_per_size, seed));
                seed += 1;
            }
        }
    }

    db.movements().insert_many(&movements).await?;

    let elapsed = start.elapsed();
    println!();
    println!(
        "✓ Generated {} listings and {} lots in {:?}",
        listings,
        movements.len(),
        elapsed
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// One received lot, `lot` weeks after the oldest.
fn generate_lot(
    product: &str,
    size: &Size,
    mrp: Money,
    lot: i64,
    lots_per_size: i64,
    seed: usize,
) -> InventoryMovement {
    let received_at = Utc::now() - Duration::weeks(lots_per_size - lot);
    let quantity = 2 + (seed * 7 % 11) as i64;
    // Buying price 45-60% of MRP
    let cost = Money::from_cents(mrp.cents() * (45 + (seed % 16) as i64) / 100);

    let movement = InventoryMovement::added(product, size.clone(), quantity, cost, received_at);

    if seed % 5 == 0 {
        movement.with_note(format!("Invoice from {}", SUPPLIERS[seed % SUPPLIERS.len()]))
    } else {
        movement
    }
}
