//! # Repository Module
//!
//! One repository per table, each holding a clone of the pool.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  billing app (LedgerStore impl)                                        │
//! │       │                                                                 │
//! │       │  db.movements().for_products(&names)                           │
//! │       ▼                                                                 │
//! │  MovementRepository ── SQL ──► movements                               │
//! │  CustomerRepository ── SQL ──► customers                               │
//! │  OrderRepository    ── SQL ──► order_lines, order_counter              │
//! │  SettlementRepository ─ SQL ─► pay_later_transactions                  │
//! │  ProductRepository  ── SQL ──► products                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`movement::MovementRepository`] - Stock log and guarded lot updates
//! - [`customer::CustomerRepository`] - Customers by phone
//! - [`order::OrderRepository`] - Order numbers and order lines
//! - [`settlement::SettlementRepository`] - Pay-later transactions and balances
//! - [`product::ProductRepository`] - MRP catalogue

pub mod customer;
pub mod movement;
pub mod order;
pub mod product;
pub mod settlement;
