//! # Pay-Later Settlement
//!
//! Splits a customer's UPI and cash payment across the orders they chose to
//! settle.
//!
//! ## Allocation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  selected: #123451 owes 300, #123452 owes 700     paid: UPI 500, cash 500│
//! │                                                                         │
//! │  #123451: UPI 300 (UPI left 200)          cash 0     → remaining 0     │
//! │  #123452: UPI 200 (UPI left 0)            cash 500   → remaining 0     │
//! │                                                                         │
//! │  UPI is used up first, in the caller's order; cash covers the rest.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The payment must equal the selected balances exactly, so every selected
//! order ends at zero and no money is left unassigned.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{OrderBalance, OrderNo, PayLaterTransaction};
use crate::validation::validate_amount;
use crate::MAX_AMOUNT_CENTS;

/// The part of a payment applied to one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SettlementAllocation {
    pub order_no: OrderNo,
    pub upi: Money,
    pub cash: Money,
}

impl SettlementAllocation {
    pub fn total(&self) -> Money {
        self.upi + self.cash
    }
}

/// Allocates `upi` then `cash` across `selected`, in the given order.
///
/// ## Errors
/// - `Validation` for a negative or oversized amount, an empty selection,
///   an order selected twice, or balances too large to sum
/// - `BalanceMismatch` unless `upi + cash` equals the selected remaining
///   balances exactly
///
/// Orders that receive nothing (already at zero) produce no allocation.
pub fn allocate_payment(
    selected: &[OrderBalance],
    upi: Money,
    cash: Money,
) -> CoreResult<Vec<SettlementAllocation>> {
    validate_amount("upi amount", upi)?;
    validate_amount("cash amount", cash)?;

    if selected.is_empty() {
        return Err(ValidationError::required("orders to settle").into());
    }

    let mut seen = HashSet::new();
    for balance in selected {
        if !seen.insert(balance.order_no) {
            return Err(ValidationError::Duplicate {
                field: "order".to_string(),
                value: balance.order_no.to_string(),
            }
            .into());
        }
    }

    let due = selected
        .iter()
        .try_fold(Money::zero(), |acc, b| acc.checked_add(b.remaining().non_negative()))
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "selected balances".to_string(),
            min: 0,
            max: i64::MAX,
        })?;
    // Both halves are bounded by MAX_AMOUNT_CENTS
    let paid = upi + cash;
    if paid != due {
        return Err(CoreError::BalanceMismatch {
            expected: due,
            actual: paid,
        });
    }

    let (mut upi_left, mut cash_left) = (upi, cash);
    let mut allocations = Vec::with_capacity(selected.len());

    for balance in selected {
        let remaining = balance.remaining().non_negative();

        let upi_applied = upi_left.min(remaining);
        upi_left -= upi_applied;

        let cash_applied = cash_left.min(remaining - upi_applied);
        cash_left -= cash_applied;

        if upi_applied.is_positive() || cash_applied.is_positive() {
            allocations.push(SettlementAllocation {
                order_no: balance.order_no,
                upi: upi_applied,
                cash: cash_applied,
            });
        }
    }

    Ok(allocations)
}

/// Outstanding pay-later amount of an order, recomputed from its
/// settlement history: `max(0, original − Σ transactions)`.
pub fn net_pay_later(original: Money, transactions: &[PayLaterTransaction]) -> Money {
    let settled: Money = transactions.iter().map(PayLaterTransaction::amount).sum();
    (original - settled).non_negative()
}

// =============================================================================
// Unit Tests
// =============================================================================
