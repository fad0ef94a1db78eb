//! # Stockbook Billing
//!
//! Order placement, pay-later settlement and manual stock entry on top of
//! the stock ledger.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        stockbook-billing                                │
//! │                                                                         │
//! │  ┌────────────────┐  ┌───────────────────┐  ┌────────────────┐          │
//! │  │ OrderPlacement │  │ SettlementService │  │   StockDesk    │          │
//! │  │  PlaceOrder    │  │  SettlePayLater   │  │  ManageStock   │          │
//! │  └───────┬────────┘  └─────────┬─────────┘  └───────┬────────┘          │
//! │          │   AccessPolicy      │                    │                   │
//! │          └─────────────────────┼────────────────────┘                   │
//! │                                ▼                                        │
//! │                  stockbook-core (pure rules)                            │
//! │       StockLedger · FifoPlanner · BillTotals · allocate_payment         │
//! │                                │                                        │
//! │                                ▼                                        │
//! │                    LedgerStore (async trait)                            │
//! │                                │                                        │
//! │                                ▼                                        │
//! │                  stockbook-db::Database (SQLite)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use stockbook_billing::{AllowAll, OrderPlacement};
//! use stockbook_core::{CustomerDetails, Discount, LineItem, Money, PaymentSplit, Size};
//! use stockbook_db::{Database, DbConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DbConfig::new("stockbook.db")).await?;
//! let order_no = OrderPlacement::new(db, AllowAll)
//!     .place_order(
//!         &CustomerDetails::new("9876543210", "Asha Rao"),
//!         &[LineItem::new("Linen Shirt", Size::new("M"), Money::from_major(1499), 1)],
//!         Discount::none(),
//!         PaymentSplit::new(Money::from_major(1499), Money::zero(), Money::zero()),
//!     )
//!     .await?;
//! println!("Order #{}", order_no);
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod config;
pub mod error;
pub mod placement;
pub mod settlement;
pub mod stock;
pub mod store;

pub use access::{AccessPolicy, AllowAll, Permission, PermissionSet};
pub use config::{BillingConfig, ConfigError};
pub use error::{BillingError, BillingResult, CompletedStep, Operation};
pub use placement::OrderPlacement;
pub use settlement::SettlementService;
pub use stock::{StockDesk, StockEntry};
pub use store::{BalanceQuery, LedgerStore, MovementFilter};

use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise our crates log at debug and sqlx
/// only warns.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stockbook=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
