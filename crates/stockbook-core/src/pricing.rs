//! # Pricing Engine
//!
//! Item discounts, the order discount and the four bill aggregates.
//!
//! ## Calculation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  per line:                                                              │
//! │    unit price  = mrp − item discount   (rounded to paise, then)        │
//! │    line total  = unit price × quantity                                 │
//! │                                                                         │
//! │  per bill:                                                              │
//! │    mrp total            = Σ mrp × quantity                             │
//! │    item discount total  = mrp total − Σ line total                     │
//! │    order discount       = fixed value                                  │
//! │                         | (mrp total − item discount total) × pct      │
//! │    grand total          = max(0, Σ line total − order discount)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is cached: [`BillTotals::compute`] is called again whenever a line
//! or discount changes, and placement recomputes it from the request.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Discount, LineItem};
use crate::FULL_PERCENT_BPS;

/// Unit price after an item discount.
///
/// Percentages are clamped to 0..=100%; a fixed discount is clamped to
/// `[0, mrp]`, so the result is never negative.
///
/// ## Example
/// ```rust
/// use stockbook_core::money::Money;
/// use stockbook_core::pricing::effective_unit_price;
/// use stockbook_core::types::Discount;
///
/// let mrp = Money::from_cents(100_000);
/// assert_eq!(effective_unit_price(mrp, Discount::percent(150)), Money::zero());
/// assert_eq!(
///     effective_unit_price(mrp, Discount::fixed(Money::from_cents(25_000))).cents(),
///     75_000
/// );
/// ```
pub fn effective_unit_price(mrp: Money, discount: Discount) -> Money {
    let mrp = mrp.non_negative();
    match discount {
        Discount::Percentage(bps) => mrp.apply_percentage_discount(bps.min(FULL_PERCENT_BPS)),
        Discount::Fixed(value) => mrp - value.non_negative().min(mrp),
    }
}

/// `effective_unit_price × quantity` for one line.
pub fn line_total(item: &LineItem) -> Money {
    effective_unit_price(item.mrp(), item.discount).multiply_quantity(item.quantity)
}

/// Order-level discount amount.
///
/// Fixed discounts apply as configured (negatives count as zero);
/// percentages apply to `mrp_total − item_discount_total`.
pub fn order_discount_amount(
    mrp_total: Money,
    item_discount_total: Money,
    discount: Discount,
) -> Money {
    match discount {
        Discount::Fixed(value) => value.non_negative(),
        Discount::Percentage(bps) => (mrp_total - item_discount_total)
            .non_negative()
            .percentage(bps.min(FULL_PERCENT_BPS)),
    }
}

// =============================================================================
// Line & Bill Pricing
// =============================================================================

/// The priced form of one line, as persisted on the order line row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LinePricing {
    pub selling_price: Money,
    pub line_total: Money,
}

impl LinePricing {
    pub fn of(item: &LineItem) -> Self {
        let selling_price = effective_unit_price(item.mrp(), item.discount);
        LinePricing {
            selling_price,
            line_total: selling_price.multiply_quantity(item.quantity),
        }
    }
}

/// The four bill aggregates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillTotals {
    pub mrp_total: Money,
    pub item_discount_total: Money,
    pub order_discount_amount: Money,
    pub grand_total: Money,
}

impl BillTotals {
    /// Computes every aggregate from the lines and the order discount.
    ///
    /// ## Example
    /// ```rust
    /// use stockbook_core::money::Money;
    /// use stockbook_core::pricing::BillTotals;
    /// use stockbook_core::types::{Discount, LineItem, Size};
    ///
    /// let lines = vec![
    ///     LineItem::new("Tee", Size::new("M"), Money::from_cents(100_000), 2)
    ///         .with_discount(Discount::percent(10)),
    /// ];
    /// let totals = BillTotals::compute(&lines, Discount::none());
    /// assert_eq!(totals.grand_total.cents(), 180_000);
    /// ```
    pub fn compute(lines: &[LineItem], order_discount: Discount) -> Self {
        let mrp_total: Money = lines
            .iter()
            .map(|line| line.mrp().non_negative().multiply_quantity(line.quantity))
            .sum();
        let lines_total: Money = lines.iter().map(line_total).sum();
        let item_discount_total = mrp_total - lines_total;

        let order_discount_amount =
            order_discount_amount(mrp_total, item_discount_total, order_discount);

        BillTotals {
            mrp_total,
            item_discount_total,
            order_discount_amount,
            grand_total: (lines_total - order_discount_amount).non_negative(),
        }
    }

    /// Σ line totals, before the order discount.
    pub fn subtotal(&self) -> Money {
        self.mrp_total - self.item_discount_total
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Size;

    fn rupees(r: i64) -> Money {
        Money::from_major(r)
    }

    fn line(mrp: i64, qty: i64) -> LineItem {
        LineItem::new("Linen Shirt", Size::new("M"), rupees(mrp), qty)
    }

    #[test]
    fn test_percentage_item_discount() {
        assert_eq!(effective_unit_price(rupees(1000), Discount::percent(10)), rupees(900));
        assert_eq!(effective_unit_price(rupees(1000), Discount::none()), rupees(1000));
        // 12.5% of ₹9.99 = 124.875 paise → 125
        assert_eq!(
            effective_unit_price(Money::from_cents(999), Discount::percentage_bps(1250)).cents(),
            874
        );
    }

    #[test]
    fn test_percentage_clamped_to_hundred() {
        assert_eq!(effective_unit_price(rupees(1000), Discount::percent(150)), Money::zero());
        assert_eq!(effective_unit_price(rupees(1000), Discount::percent(100)), Money::zero());
    }

    #[test]
    fn test_fixed_discount_clamped() {
        assert_eq!(
            effective_unit_price(rupees(1000), Discount::fixed(rupees(1500))),
            Money::zero()
        );
        assert_eq!(
            effective_unit_price(rupees(1000), Discount::fixed(rupees(-50))),
            rupees(1000)
        );
        assert_eq!(
            effective_unit_price(rupees(1000), Discount::fixed(rupees(250))),
            rupees(750)
        );
    }

    #[test]
    fn test_line_total() {
        let item = line(1000, 2).with_discount(Discount::percent(10));
        assert_eq!(line_total(&item), rupees(1800));

        let pricing = LinePricing::of(&item);
        assert_eq!(pricing.selling_price, rupees(900));
        assert_eq!(pricing.line_total, rupees(1800));
    }

    #[test]
    fn test_item_discount_scenario() {
        // MRP 1000 × 2, 10% item discount, no order discount.
        let totals = BillTotals::compute(
            &[line(1000, 2).with_discount(Discount::percent(10))],
            Discount::none(),
        );

        assert_eq!(totals.mrp_total, rupees(2000));
        assert_eq!(totals.item_discount_total, rupees(200));
        assert_eq!(totals.order_discount_amount, Money::zero());
        assert_eq!(totals.grand_total, rupees(1800));
    }

    #[test]
    fn test_percentage_order_discount_uses_discounted_basis() {
        // MRP total 1800 with 200 of item discounts, then 10% off the order.
        let lines = vec![
            line(1000, 1).with_discount(Discount::fixed(rupees(200))),
            line(800, 1),
        ];
        let totals = BillTotals::compute(&lines, Discount::percent(10));

        assert_eq!(totals.mrp_total, rupees(1800));
        assert_eq!(totals.item_discount_total, rupees(200));
        assert_eq!(totals.order_discount_amount, rupees(160));
        // Σ line totals (1600) − 160
        assert_eq!(totals.grand_total, rupees(1440));
        assert_eq!(totals.subtotal(), rupees(1600));
    }

    #[test]
    fn test_fixed_order_discount_floors_grand_total() {
        let totals = BillTotals::compute(&[line(100, 1)], Discount::fixed(rupees(500)));
        assert_eq!(totals.order_discount_amount, rupees(500));
        assert_eq!(totals.grand_total, Money::zero());

        let totals = BillTotals::compute(&[line(100, 1)], Discount::fixed(rupees(-5)));
        assert_eq!(totals.order_discount_amount, Money::zero());
        assert_eq!(totals.grand_total, rupees(100));
    }

    #[test]
    fn test_order_percentage_clamped() {
        let totals = BillTotals::compute(&[line(100, 3)], Discount::percent(250));
        assert_eq!(totals.order_discount_amount, rupees(300));
        assert_eq!(totals.grand_total, Money::zero());
    }

    #[test]
    fn test_compute_is_idempotent() {
        let lines = vec![
            line(999, 3).with_discount(Discount::percentage_bps(333)),
            line(450, 1).with_discount(Discount::fixed(Money::from_cents(1_999))),
        ];
        let discount = Discount::percentage_bps(725);

        let first = BillTotals::compute(&lines, discount);
        let second = BillTotals::compute(&lines, discount);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_bill() {
        assert_eq!(BillTotals::compute(&[], Discount::percent(10)), BillTotals::default());
    }
}
