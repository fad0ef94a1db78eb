//! # stockbook-core: Pure Ledger & Billing Logic
//!
//! Everything in Stockbook that has an invariant lives here, as pure
//! functions over plain data. The database crate persists these types and the
//! billing app sequences store calls around them.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Stockbook Data Flow                                │
//! │                                                                         │
//! │  movements ──► inventory ──► bill / pricing ──► placement (billing app) │
//! │                   │                                   │                 │
//! │                   └── FIFO plan ◄─────────────────────┘                 │
//! │                                                                         │
//! │  order history ──► settlement::allocate_payment ──► pay-later txns     │
//! │                                                                         │
//! │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (movements, order lines, customers, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`inventory`] - Stock aggregation over the movement log, FIFO plans
//! - [`pricing`] - Item and order discounts, bill totals
//! - [`bill`] - Draft bill composition before placement
//! - [`settlement`] - Pay-later settlement allocation
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use stockbook_core::money::Money;
//! use stockbook_core::pricing::effective_unit_price;
//! use stockbook_core::types::Discount;
//!
//! let mrp = Money::from_cents(100_000);
//! let price = effective_unit_price(mrp, Discount::percent(10));
//! assert_eq!(price.cents(), 90_000);
//! ```

pub mod bill;
pub mod error;
pub mod inventory;
pub mod money;
pub mod pricing;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Order number handed out when no order has ever been placed.
pub const FIRST_ORDER_NO: i64 = 123_451;

/// Canonical size sequence; anything else sorts after these, alphabetically.
pub const CANONICAL_SIZES: [&str; 7] = ["XS", "S", "M", "L", "XL", "XXL", "XXXL"];

/// Customer phone numbers are exactly this many ASCII digits.
pub const PHONE_DIGITS: usize = 10;

/// Maximum quantity of a single line item.
///
/// Guards against typing 1000 instead of 10 at the counter.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum line items on one bill.
pub const MAX_BILL_LINES: usize = 100;

/// Largest single amount accepted anywhere (₹1 crore).
///
/// MRP × quantity × lines then stays far inside `i64`.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000;

/// 100% in basis points.
pub const FULL_PERCENT_BPS: u32 = 10_000;
