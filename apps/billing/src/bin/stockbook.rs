//! # Stockbook CLI
//!
//! Read-only reports against the ledger.
//!
//! ## Usage
//! ```bash
//! # Stock on hand, every product
//! cargo run -p stockbook-billing --bin stockbook -- stock
//!
//! # One product
//! cargo run -p stockbook-billing --bin stockbook -- stock "Linen Shirt"
//!
//! # Unpaid balances: all, by phone, or by order number
//! cargo run -p stockbook-billing --bin stockbook -- outstanding
//! cargo run -p stockbook-billing --bin stockbook -- outstanding 9876543210
//!
//! # Settlement history of one order
//! cargo run -p stockbook-billing --bin stockbook -- history 123451
//! ```

use std::env;
use std::path::PathBuf;

use stockbook_billing::{init_tracing, BillingConfig, SettlementService, StockDesk};
use stockbook_core::{Money, OrderBalance};
use stockbook_db::Database;

fn print_help() {
    println!("Stockbook ledger reports");
    println!();
    println!("Usage: stockbook [OPTIONS] <COMMAND> [ARG]");
    println!();
    println!("Commands:");
    println!("  stock [PRODUCT]                Stock on hand per size");
    println!("  outstanding [PHONE|ORDER_NO]   Unpaid pay-later balances");
    println!("  history <ORDER_NO>             Settlements against one order");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>   Config file (default: platform config dir)");
    println!("  -d, --db <PATH>       Database file (overrides config)");
    println!("  -h, --help            Show this help message");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut db_path: Option<PathBuf> = None;
    let mut positional = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    let mut config = BillingConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = Some(path);
    }

    let db = Database::new(config.db_config()).await?;
    let policy = config.access_policy();

    println!("{}", config.store.name);
    println!("{}", "=".repeat(config.store.name.chars().count()));

    match positional.first().map(String::as_str) {
        Some("stock") => {
            let desk = StockDesk::new(db.clone(), policy);
            let rows = desk.stock_summary(positional.get(1).map(String::as_str)).await?;
            if rows.is_empty() {
                println!("No stock recorded.");
            }
            println!(
                "{:<24} {:>6} {:>9} {:>8} {:>6} {:>10}",
                "Product", "Size", "In lots", "Removed", "Sold", "Available"
            );
            for row in rows {
                println!(
                    "{:<24} {:>6} {:>9} {:>8} {:>6} {:>10}",
                    row.product, row.size, row.lot_remaining, row.removed, row.sold, row.available
                );
            }
        }
        Some("outstanding") => {
            let service = SettlementService::new(db.clone(), policy);
            let balances = match positional.get(1) {
                Some(search) => service.outstanding(search).await?,
                None => service.all_outstanding().await?,
            };
            print_balances(&balances);
        }
        Some("history") => {
            let Some(order_no) = positional.get(1).and_then(|s| s.parse().ok()) else {
                eprintln!("history needs an order number");
                std::process::exit(2);
            };
            let service = SettlementService::new(db.clone(), policy);
            for txn in service.transactions_for_order(order_no).await? {
                println!(
                    "{}  UPI {:>12}  Cash {:>12}",
                    txn.created_at.format("%Y-%m-%d %H:%M"),
                    Money::from_cents(txn.upi_cents).to_string(),
                    Money::from_cents(txn.cash_cents).to_string()
                );
            }
            println!("Still owed: {}", service.net_pay_later(order_no).await?);
        }
        _ => {
            print_help();
            db.close().await;
            std::process::exit(2);
        }
    }

    db.close().await;
    Ok(())
}

fn print_balances(balances: &[OrderBalance]) {
    if balances.is_empty() {
        println!("Nothing outstanding.");
        return;
    }

    println!(
        "{:>8}  {:<10}  {:<24} {:>12} {:>12}",
        "Order", "Phone", "Customer", "Pay later", "Remaining"
    );
    for b in balances {
        println!(
            "{:>8}  {:<10}  {:<24} {:>12} {:>12}",
            b.order_no,
            b.customer_phone,
            b.customer_name,
            Money::from_cents(b.original_pay_later_cents).to_string(),
            b.remaining().to_string()
        );
    }

    let total: Money = balances.iter().map(OrderBalance::remaining).sum();
    println!("Total outstanding: {}", total);
}
