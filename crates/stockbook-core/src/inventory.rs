//! # Inventory Aggregation
//!
//! Derives stock levels from the movement log. Nothing here is cached: every
//! figure is recomputed from the movements handed in, so there is no stored
//! "current stock" that can drift from the log.
//!
//! ## How Stock Is Derived
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  movements for (Linen Shirt, M)                                        │
//! │                                                                         │
//! │   Added   qty 4  (remaining)  2026-01-03  ◄── lot 1 (oldest)           │
//! │   Added   qty 6  (remaining)  2026-02-10  ◄── lot 2                    │
//! │   Removed qty 1                                                         │
//! │   Sold    qty 5               (audit only, already taken off lots)     │
//! │                                                                         │
//! │   available = Σ Added.remaining − Σ Removed = 4 + 6 − 1 = 9            │
//! │                                                                         │
//! │  Selling 5 plans: lot 1 → take 4 (4 → 0), lot 2 → take 1 (6 → 5)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `Sold` rows are history: order placement has already decremented the lots
//! they were drawn from, so they are reported but never subtracted again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{InventoryMovement, LineItem, MovementKind, Size};

// =============================================================================
// Lots & Draws
// =============================================================================

/// An `Added` movement that still has units left, as seen by the allocator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lot {
    pub movement_id: String,
    pub remaining: i64,
    pub received_at: DateTime<Utc>,
}

impl From<&InventoryMovement> for Lot {
    fn from(movement: &InventoryMovement) -> Self {
        Lot {
            movement_id: movement.id.clone(),
            remaining: movement.quantity,
            received_at: movement.created_at,
        }
    }
}

/// One decrement of one lot, planned before anything is written.
///
/// `remaining_before` is what the store is expected to still hold; the
/// billing app uses it as the compare-and-swap guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LotDraw {
    pub movement_id: String,
    pub taken: i64,
    pub remaining_before: i64,
    pub remaining_after: i64,
}

/// Plans a FIFO draw of `quantity` units from `lots`.
///
/// `lots` must already be oldest-first (see [`StockLedger::fifo_lots`]). A
/// request may span several lots; earlier lots are emptied before later ones
/// are touched.
///
/// ## Errors
/// `InsufficientStock` when the lots' summed remainders are short. Nothing
/// is mutated either way.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use stockbook_core::inventory::{plan_fifo, Lot};
///
/// let now = Utc::now();
/// let lots = vec![
///     Lot { movement_id: "a".into(), remaining: 3, received_at: now },
///     Lot { movement_id: "b".into(), remaining: 5, received_at: now },
/// ];
/// let draws = plan_fifo("Tee", "M", &lots, 4).unwrap();
/// assert_eq!(draws[0].remaining_after, 0);
/// assert_eq!(draws[1].taken, 1);
/// ```
pub fn plan_fifo(
    product: &str,
    size: &str,
    lots: &[Lot],
    quantity: i64,
) -> CoreResult<Vec<LotDraw>> {
    let total: i64 = lots.iter().map(|lot| lot.remaining.max(0)).sum();
    if quantity > total {
        return Err(CoreError::insufficient(product, size, total, quantity));
    }

    let mut outstanding = quantity;
    let mut draws = Vec::new();

    for lot in lots {
        if outstanding == 0 {
            break;
        }
        if lot.remaining <= 0 {
            continue;
        }

        let taken = outstanding.min(lot.remaining);
        outstanding -= taken;
        draws.push(LotDraw {
            movement_id: lot.movement_id.clone(),
            taken,
            remaining_before: lot.remaining,
            remaining_after: lot.remaining - taken,
        });
    }

    Ok(draws)
}

// =============================================================================
// Stock Ledger
// =============================================================================

/// Per-(product, size) stock report row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockSummary {
    pub product: String,
    pub size: Size,
    /// Σ remaining units over `Added` lots.
    pub lot_remaining: i64,
    pub removed: i64,
    pub sold: i64,
    pub available: i64,
}

/// Read-only view over a slice of the movement log.
///
/// The slice may be the whole log or just the movements for one product;
/// queries for anything outside it simply see no stock.
#[derive(Debug, Clone, Copy)]
pub struct StockLedger<'a> {
    movements: &'a [InventoryMovement],
}

impl<'a> StockLedger<'a> {
    pub fn new(movements: &'a [InventoryMovement]) -> Self {
        StockLedger { movements }
    }

    fn entries<'s>(
        &'s self,
        product: &'s str,
        size: &'s Size,
    ) -> impl Iterator<Item = &'a InventoryMovement> + 's {
        self.movements.iter().filter(move |m| m.is_for(product, size))
    }

    fn sum_of(&self, product: &str, size: &Size, kind: MovementKind) -> i64 {
        self.entries(product, size)
            .filter(|m| m.kind == kind)
            .map(|m| m.quantity.max(0))
            .sum()
    }

    /// Units available to sell: Σ Added.remaining − Σ Removed, never negative.
    pub fn available_quantity(&self, product: &str, size: &Size) -> i64 {
        let (mut lots, mut removed) = (0_i64, 0_i64);
        for movement in self.entries(product, size) {
            match movement.kind {
                MovementKind::Added => lots += movement.quantity.max(0),
                MovementKind::Removed => removed += movement.quantity.max(0),
                MovementKind::Sold => {}
            }
        }
        (lots - removed).max(0)
    }

    /// Available quantity as seen by one line of a draft bill.
    ///
    /// Quantities on *other* lines of the same bill for the same product and
    /// size are already spoken for, so a bill cannot oversell a size across
    /// its own lines. `current_line` is the index of the line asking; `None`
    /// when the line is not on the bill yet.
    pub fn available_for_draft(
        &self,
        product: &str,
        size: &Size,
        draft_lines: &[LineItem],
        current_line: Option<usize>,
    ) -> i64 {
        let claimed: i64 = draft_lines
            .iter()
            .enumerate()
            .filter(|(idx, _)| Some(*idx) != current_line)
            .filter(|(_, line)| line.product == product && &line.size == size)
            .map(|(_, line)| line.quantity.max(0))
            .sum();

        (self.available_quantity(product, size) - claimed).max(0)
    }

    /// Sizes of `product` with stock, in canonical size order.
    pub fn available_sizes(&self, product: &str) -> Vec<Size> {
        self.sizes_of(product)
            .into_iter()
            .filter(|size| self.available_quantity(product, size) > 0)
            .collect()
    }

    fn sizes_of(&self, product: &str) -> BTreeSet<Size> {
        self.movements
            .iter()
            .filter(|m| m.product == product)
            .map(|m| m.size.clone())
            .collect()
    }

    /// `Added` lots with units left, oldest first.
    pub fn fifo_lots(&self, product: &str, size: &Size) -> Vec<Lot> {
        let mut lots: Vec<&InventoryMovement> = self
            .entries(product, size)
            .filter(|m| m.kind == MovementKind::Added && m.quantity > 0)
            .collect();

        lots.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        lots.into_iter().map(Lot::from).collect()
    }

    /// Stock report for every size of `product` ever seen in the log.
    pub fn summary(&self, product: &str) -> Vec<StockSummary> {
        self.sizes_of(product)
            .into_iter()
            .map(|size| StockSummary {
                product: product.to_string(),
                lot_remaining: self.sum_of(product, &size, MovementKind::Added),
                removed: self.sum_of(product, &size, MovementKind::Removed),
                sold: self.sum_of(product, &size, MovementKind::Sold),
                available: self.available_quantity(product, &size),
                size,
            })
            .collect()
    }
}

// =============================================================================
// FIFO Planner
// =============================================================================

/// Plans draws for several lines of one bill against the same ledger.
///
/// Lines naming the same product and size draw cumulatively: the second line
/// sees the lots as the first line left them.
#[derive(Debug)]
pub struct FifoPlanner<'a> {
    ledger: StockLedger<'a>,
    lots: HashMap<(String, Size), Vec<Lot>>,
    allocated: HashMap<(String, Size), i64>,
}

impl<'a> FifoPlanner<'a> {
    pub fn new(ledger: StockLedger<'a>) -> Self {
        FifoPlanner {
            ledger,
            lots: HashMap::new(),
            allocated: HashMap::new(),
        }
    }

    /// Plans `quantity` units of `product`/`size`.
    ///
    /// The request must fit both the available quantity (which accounts for
    /// manual removals) and the lots' remainders.
    pub fn allocate(&mut self, product: &str, size: &Size, quantity: i64) -> CoreResult<Vec<LotDraw>> {
        if quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        let key = (product.to_string(), size.clone());
        let already = self.allocated.get(&key).copied().unwrap_or(0);
        let available = (self.ledger.available_quantity(product, size) - already).max(0);
        if quantity > available {
            return Err(CoreError::insufficient(product, size.as_str(), available, quantity));
        }

        let ledger = self.ledger;
        let lots = self
            .lots
            .entry(key.clone())
            .or_insert_with(|| ledger.fifo_lots(product, size));

        let draws = plan_fifo(product, size.as_str(), lots, quantity)?;

        for draw in &draws {
            if let Some(lot) = lots.iter_mut().find(|l| l.movement_id == draw.movement_id) {
                lot.remaining = draw.remaining_after;
            }
        }
        lots.retain(|lot| lot.remaining > 0);
        *self.allocated.entry(key).or_insert(0) += quantity;

        Ok(draws)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use chrono::TimeZone;

    fn t(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, 10, 0, 0).unwrap()
    }

    fn lot(product: &str, size: &str, qty: i64, day: u32) -> InventoryMovement {
        InventoryMovement::added(product, Size::new(size), qty, Money::from_cents(50_000), t(day))
    }

    fn removal(product: &str, size: &str, qty: i64, day: u32) -> InventoryMovement {
        InventoryMovement::removed(product, Size::new(size), qty, t(day))
    }

    fn sale(product: &str, size: &str, qty: i64, day: u32) -> InventoryMovement {
        InventoryMovement::sold(product, Size::new(size), qty, Money::from_cents(90_000), t(day))
    }

    #[test]
    fn test_available_quantity_ignores_sold_history() {
        let log = vec![
            lot("Tee", "M", 4, 3),
            lot("Tee", "M", 6, 10),
            removal("Tee", "M", 1, 11),
            sale("Tee", "M", 5, 12),
            lot("Tee", "L", 2, 3),
        ];
        let ledger = StockLedger::new(&log);

        assert_eq!(ledger.available_quantity("Tee", &Size::new("M")), 9);
        assert_eq!(ledger.available_quantity("Tee", &Size::new("L")), 2);
        assert_eq!(ledger.available_quantity("Tee", &Size::new("XL")), 0);
        assert_eq!(ledger.available_quantity("Shirt", &Size::new("M")), 0);
    }

    #[test]
    fn test_available_quantity_never_negative() {
        let log = vec![lot("Tee", "M", 2, 1), removal("Tee", "M", 5, 2)];
        let ledger = StockLedger::new(&log);
        assert_eq!(ledger.available_quantity("Tee", &Size::new("M")), 0);
    }

    #[test]
    fn test_available_for_draft_excludes_other_lines() {
        let log = vec![lot("Tee", "M", 5, 1)];
        let ledger = StockLedger::new(&log);
        let m = Size::new("M");
        let draft = vec![
            LineItem::new("Tee", m.clone(), Money::from_cents(100), 2),
            LineItem::new("Tee", Size::new("L"), Money::from_cents(100), 1),
            LineItem::new("Tee", m.clone(), Money::from_cents(100), 1),
        ];

        // Line 0 sees the 1 unit on line 2 as claimed.
        assert_eq!(ledger.available_for_draft("Tee", &m, &draft, Some(0)), 4);
        // Line 2 sees the 2 units on line 0 as claimed.
        assert_eq!(ledger.available_for_draft("Tee", &m, &draft, Some(2)), 3);
        // A line not yet on the bill sees both.
        assert_eq!(ledger.available_for_draft("Tee", &m, &draft, None), 2);
    }

    #[test]
    fn test_available_sizes_in_canonical_order() {
        let log = vec![
            lot("Tee", "XL", 1, 1),
            lot("Tee", "32", 1, 1),
            lot("Tee", "S", 3, 1),
            lot("Tee", "M", 1, 1),
            removal("Tee", "M", 1, 2),
            lot("Tee", "28", 2, 1),
            lot("Other", "L", 9, 1),
        ];
        let ledger = StockLedger::new(&log);

        let sizes: Vec<String> = ledger
            .available_sizes("Tee")
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(sizes, vec!["S", "XL", "28", "32"]);
    }

    #[test]
    fn test_fifo_lots_oldest_first_and_skip_empty() {
        let newer = lot("Tee", "M", 6, 10);
        let older = lot("Tee", "M", 4, 3);
        let empty = lot("Tee", "M", 0, 1);
        let log = vec![newer.clone(), empty, older.clone()];

        let lots = StockLedger::new(&log).fifo_lots("Tee", &Size::new("M"));
        let ids: Vec<&str> = lots.iter().map(|l| l.movement_id.as_str()).collect();
        assert_eq!(ids, vec![older.id.as_str(), newer.id.as_str()]);
    }

    #[test]
    fn test_plan_fifo_drains_oldest_lot_first() {
        let log = vec![lot("Tee", "M", 6, 10), lot("Tee", "M", 4, 3)];
        let lots = StockLedger::new(&log).fifo_lots("Tee", &Size::new("M"));

        // q ≤ r1: only lot 1 touched
        let draws = plan_fifo("Tee", "M", &lots, 3).unwrap();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].movement_id, lots[0].movement_id);
        assert_eq!((draws[0].remaining_before, draws[0].remaining_after), (4, 1));

        // q > r1: lot 1 zeroed, remainder from lot 2
        let draws = plan_fifo("Tee", "M", &lots, 7).unwrap();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].remaining_after, 0);
        assert_eq!(draws[1].taken, 3);
        assert_eq!(draws[1].remaining_after, 3);
    }

    #[test]
    fn test_plan_fifo_insufficient() {
        let log = vec![lot("Tee", "M", 2, 1), lot("Tee", "M", 1, 2)];
        let lots = StockLedger::new(&log).fifo_lots("Tee", &Size::new("M"));

        let err = plan_fifo("Tee", "M", &lots, 5).unwrap_err();
        assert_eq!(err, CoreError::insufficient("Tee", "M", 3, 5));
        // Lots untouched
        assert_eq!(lots.iter().map(|l| l.remaining).sum::<i64>(), 3);
    }

    #[test]
    fn test_planner_draws_cumulatively_across_lines() {
        let log = vec![lot("Tee", "M", 3, 1), lot("Tee", "M", 3, 2)];
        let ledger = StockLedger::new(&log);
        let mut planner = FifoPlanner::new(ledger);
        let m = Size::new("M");

        let first = planner.allocate("Tee", &m, 2).unwrap();
        let second = planner.allocate("Tee", &m, 2).unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
        // Second line starts where the first left lot 1
        assert_eq!(second[0].remaining_before, 1);
        assert_eq!(second[0].remaining_after, 0);
        assert_eq!(second[1].remaining_before, 3);
        assert_eq!(second[1].remaining_after, 2);

        let err = planner.allocate("Tee", &m, 3).unwrap_err();
        assert_eq!(err, CoreError::insufficient("Tee", "M", 2, 3));
    }

    #[test]
    fn test_planner_respects_manual_removals() {
        // Lots still hold 5 but 2 were written off by hand.
        let log = vec![lot("Tee", "M", 5, 1), removal("Tee", "M", 2, 2)];
        let mut planner = FifoPlanner::new(StockLedger::new(&log));

        let err = planner.allocate("Tee", &Size::new("M"), 4).unwrap_err();
        assert_eq!(err, CoreError::insufficient("Tee", "M", 3, 4));
        assert!(planner.allocate("Tee", &Size::new("M"), 3).is_ok());
    }

    #[test]
    fn test_summary_reports_every_size_seen() {
        let log = vec![
            lot("Tee", "M", 3, 1),
            sale("Tee", "M", 2, 2),
            lot("Tee", "S", 1, 1),
            removal("Tee", "S", 1, 3),
        ];
        let summary = StockLedger::new(&log).summary("Tee");

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].size, Size::new("S"));
        assert_eq!(summary[0].available, 0);
        assert_eq!(summary[1].size, Size::new("M"));
        assert_eq!(summary[1].sold, 2);
        assert_eq!(summary[1].available, 3);
    }

    #[test]
    fn test_available_stays_non_negative_through_sales() {
        // Replays placements the way the billing app performs them: plan,
        // decrement lots, append a Sold row.
        let mut log = vec![lot("Tee", "M", 4, 1), lot("Tee", "M", 2, 2)];
        let m = Size::new("M");

        for qty in [3, 2, 2, 1] {
            let draws = {
                let mut planner = FifoPlanner::new(StockLedger::new(&log));
                planner.allocate("Tee", &m, qty)
            };
            if let Ok(draws) = draws {
                for draw in draws {
                    if let Some(lot) = log.iter_mut().find(|m| m.id == draw.movement_id) {
                        lot.quantity = draw.remaining_after;
                    }
                }
                log.push(sale("Tee", "M", qty, 5));
            }
            assert!(StockLedger::new(&log).available_quantity("Tee", &m) >= 0);
        }

        assert_eq!(StockLedger::new(&log).available_quantity("Tee", &m), 0);
    }
}
