//! # Billing Error Type
//!
//! What callers of placement, settlement and the stock desk see.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  checked BEFORE any write                 raised AFTER a write          │
//! │  ─────────────────────────                ─────────────────────         │
//! │  PermissionDenied                         PartialFailure {              │
//! │  Core(Validation)                           operation,                  │
//! │  Core(InsufficientStock)                    completed: [steps...],      │
//! │  Core(BalanceMismatch)                      source: <first failure>     │
//! │  OrderNotFound / NothingOutstanding       }                             │
//! │  Persistence (a read failed)                                            │
//! │  LotConflict                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is rolled back. A `PartialFailure` lists exactly which steps
//! landed so an operator can reconcile them by hand.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::access::Permission;
use crate::config::ConfigError;
use stockbook_core::{CoreError, OrderNo, PayLaterTransaction, ValidationError};
use stockbook_db::DbError;

/// A multi-step write that failed part way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Operation {
    PlaceOrder { order_no: OrderNo },
    Settle { orders: Vec<OrderNo> },
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::PlaceOrder { order_no } => write!(f, "placing order #{}", order_no),
            Operation::Settle { orders } => {
                let list: Vec<String> = orders.iter().map(|o| format!("#{}", o)).collect();
                write!(f, "settling {}", list.join(", "))
            }
        }
    }
}

/// One write that landed before a multi-step operation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CompletedStep {
    OrderNoReserved {
        order_no: OrderNo,
    },
    CustomerRecorded {
        phone: String,
        inserted: bool,
    },
    OrderLinesWritten {
        order_no: OrderNo,
        count: usize,
    },
    LotDecremented {
        movement_id: String,
        remaining_before: i64,
        remaining_after: i64,
    },
    SoldRecorded {
        count: usize,
    },
    SettlementRecorded(PayLaterTransaction),
}

/// Errors from the billing layer.
#[derive(Debug, Error)]
pub enum BillingError {
    /// Validation, stock and balance rule violations.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The caller's access policy does not grant the permission.
    #[error("Permission denied: {0}")]
    PermissionDenied(Permission),

    /// A lot's remaining quantity changed between planning and the write.
    ///
    /// ## When This Occurs
    /// - Two terminals sold from the same lot at the same moment
    #[error("Stock lot {lot_id} changed while the order was being placed")]
    LotConflict { lot_id: String },

    /// The store failed. Carries the store's message verbatim.
    #[error("{0}")]
    Persistence(String),

    #[error("Order #{0} not found")]
    OrderNotFound(OrderNo),

    /// An order selected for settlement owes nothing.
    #[error("Order #{0} has no pay-later balance outstanding")]
    NothingOutstanding(OrderNo),

    /// A product and size with no catalogue entry.
    #[error("No listing for {product} ({size})")]
    UnknownListing { product: String, size: String },

    /// Some writes landed, then a step failed. Nothing was rolled back.
    #[error("{operation} failed after {} completed step(s): {source}", .completed.len())]
    PartialFailure {
        operation: Operation,
        completed: Vec<CompletedStep>,
        source: Box<BillingError>,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BillingError {
    /// Whether the store may hold writes from the failed operation.
    pub fn is_partial(&self) -> bool {
        matches!(self, BillingError::PartialFailure { .. })
    }
}

impl From<DbError> for BillingError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Conflict { id, .. } => BillingError::LotConflict { lot_id: id },
            other => BillingError::Persistence(other.to_string()),
        }
    }
}

impl From<ValidationError> for BillingError {
    fn from(err: ValidationError) -> Self {
        BillingError::Core(CoreError::Validation(err))
    }
}

pub type BillingResult<T> = Result<T, BillingError>;
