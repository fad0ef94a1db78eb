//! # Draft Bills
//!
//! The counter-side bill being composed before it is placed. Each line's
//! quantity is capped to what the ledger can still supply once the other
//! lines of the same bill are accounted for, so a bill that reaches
//! placement never asks for more than was on the shelf when it was built.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::inventory::StockLedger;
use crate::pricing::{BillTotals, LinePricing};
use crate::types::{CustomerDetails, Discount, LineItem, PaymentSplit, ProductListing};
use crate::validation::{validate_customer, validate_line_items, ValidationResult};
use crate::MAX_ITEM_QUANTITY;

/// Everything order placement needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderRequest {
    pub customer: CustomerDetails,
    pub lines: Vec<LineItem>,
    pub order_discount: Discount,
    pub payment: PaymentSplit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DraftBill {
    pub customer: CustomerDetails,
    pub lines: Vec<LineItem>,
    pub order_discount: Discount,
}

impl DraftBill {
    pub fn new(customer: CustomerDetails) -> Self {
        DraftBill {
            customer,
            lines: Vec::new(),
            order_discount: Discount::none(),
        }
    }

    /// Adds a line for `listing`, seeding its MRP from the listing.
    ///
    /// Returns the index of the new line. The quantity actually set may be
    /// lower than requested; read it back from `lines[idx]`.
    pub fn add_line(
        &mut self,
        ledger: &StockLedger<'_>,
        listing: &ProductListing,
        quantity: i64,
    ) -> CoreResult<usize> {
        let capped = self.cap_quantity(ledger, listing, None, quantity)?;
        self.lines.push(LineItem::new(
            listing.product.clone(),
            listing.size.clone(),
            listing.mrp(),
            capped,
        ));
        Ok(self.lines.len() - 1)
    }

    /// Changes a line's quantity, capped the same way as [`Self::add_line`].
    /// Returns the quantity set.
    pub fn set_quantity(
        &mut self,
        ledger: &StockLedger<'_>,
        index: usize,
        quantity: i64,
    ) -> CoreResult<i64> {
        let line = self.line(index)?;
        let listing = ProductListing {
            product: line.product.clone(),
            size: line.size.clone(),
            mrp_cents: line.mrp_cents,
        };

        let capped = self.cap_quantity(ledger, &listing, Some(index), quantity)?;
        self.lines[index].quantity = capped;
        Ok(capped)
    }

    pub fn set_item_discount(&mut self, index: usize, discount: Discount) -> CoreResult<()> {
        self.line(index)?;
        self.lines[index].discount = discount;
        Ok(())
    }

    pub fn set_order_discount(&mut self, discount: Discount) {
        self.order_discount = discount;
    }

    pub fn remove_line(&mut self, index: usize) -> Option<LineItem> {
        (index < self.lines.len()).then(|| self.lines.remove(index))
    }

    /// Bill aggregates for the lines as they stand now.
    pub fn totals(&self) -> BillTotals {
        BillTotals::compute(&self.lines, self.order_discount)
    }

    /// Per-line selling price and line total, in line order.
    pub fn line_pricing(&self) -> Vec<LinePricing> {
        self.lines.iter().map(LinePricing::of).collect()
    }

    pub fn validate(&self) -> ValidationResult<()> {
        validate_customer(&self.customer)?;
        validate_line_items(&self.lines)
    }

    /// Finishes the bill with a payment split.
    pub fn checkout(self, payment: PaymentSplit) -> OrderRequest {
        OrderRequest {
            customer: self.customer,
            lines: self.lines,
            order_discount: self.order_discount,
            payment,
        }
    }

    fn line(&self, index: usize) -> CoreResult<&LineItem> {
        self.lines.get(index).ok_or_else(|| {
            ValidationError::OutOfRange {
                field: "line".to_string(),
                min: 0,
                max: self.lines.len() as i64 - 1,
            }
            .into()
        })
    }

    fn cap_quantity(
        &self,
        ledger: &StockLedger<'_>,
        listing: &ProductListing,
        current_line: Option<usize>,
        requested: i64,
    ) -> CoreResult<i64> {
        if requested <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        let available =
            ledger.available_for_draft(&listing.product, &listing.size, &self.lines, current_line);
        if available == 0 {
            return Err(CoreError::insufficient(
                listing.product.as_str(),
                listing.size.as_str(),
                0,
                requested,
            ));
        }

        Ok(requested.min(available).min(MAX_ITEM_QUANTITY))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{InventoryMovement, Size};
    use chrono::Utc;

    fn listing(size: &str) -> ProductListing {
        ProductListing {
            product: "Linen Shirt".to_string(),
            size: Size::new(size),
            mrp_cents: 100_000,
        }
    }

    fn stock(size: &str, qty: i64) -> InventoryMovement {
        InventoryMovement::added("Linen Shirt", Size::new(size), qty, Money::from_cents(40_000), Utc::now())
    }

    fn draft() -> DraftBill {
        DraftBill::new(CustomerDetails::new("9876543210", "Asha"))
    }

    #[test]
    fn test_add_line_caps_to_available() {
        let log = vec![stock("M", 3)];
        let ledger = StockLedger::new(&log);
        let mut bill = draft();

        let idx = bill.add_line(&ledger, &listing("M"), 5).unwrap();
        assert_eq!(bill.lines[idx].quantity, 3);
        assert_eq!(bill.lines[idx].mrp_cents, 100_000);
    }

    #[test]
    fn test_second_line_sees_first_lines_claim() {
        let log = vec![stock("M", 3)];
        let ledger = StockLedger::new(&log);
        let mut bill = draft();

        bill.add_line(&ledger, &listing("M"), 2).unwrap();
        let idx = bill.add_line(&ledger, &listing("M"), 2).unwrap();
        assert_eq!(bill.lines[idx].quantity, 1);

        // Nothing left for a third line
        let err = bill.add_line(&ledger, &listing("M"), 1).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { available: 0, .. }));
    }

    #[test]
    fn test_set_quantity_excludes_own_line() {
        let log = vec![stock("M", 4)];
        let ledger = StockLedger::new(&log);
        let mut bill = draft();
        bill.add_line(&ledger, &listing("M"), 1).unwrap();
        bill.add_line(&ledger, &listing("M"), 1).unwrap();

        // Line 0 may grow to 4 − 1 (line 1's claim)
        assert_eq!(bill.set_quantity(&ledger, 0, 10).unwrap(), 3);
        assert!(bill.set_quantity(&ledger, 0, 0).is_err());
        assert!(bill.set_quantity(&ledger, 9, 1).is_err());
    }

    #[test]
    fn test_totals_follow_edits() {
        let log = vec![stock("M", 5), stock("L", 5)];
        let ledger = StockLedger::new(&log);
        let mut bill = draft();
        bill.add_line(&ledger, &listing("M"), 2).unwrap();
        assert_eq!(bill.totals().grand_total.cents(), 200_000);

        bill.set_item_discount(0, Discount::percent(10)).unwrap();
        assert_eq!(bill.totals().grand_total.cents(), 180_000);

        bill.add_line(&ledger, &listing("L"), 1).unwrap();
        bill.set_order_discount(Discount::fixed(Money::from_cents(10_000)));
        assert_eq!(bill.totals().grand_total.cents(), 270_000);

        assert!(bill.remove_line(1).is_some());
        assert!(bill.remove_line(5).is_none());
        assert_eq!(bill.totals().grand_total.cents(), 170_000);
        assert_eq!(bill.line_pricing()[0].selling_price.cents(), 90_000);
    }

    #[test]
    fn test_checkout_carries_everything() {
        let log = vec![stock("M", 1)];
        let ledger = StockLedger::new(&log);
        let mut bill = draft();
        bill.add_line(&ledger, &listing("M"), 1).unwrap();
        assert!(bill.validate().is_ok());

        let payment = PaymentSplit::new(Money::from_cents(100_000), Money::zero(), Money::zero());
        let request = bill.checkout(payment);
        assert_eq!(request.lines.len(), 1);
        assert_eq!(request.payment.total().cents(), 100_000);
        assert_eq!(request.customer.phone, "9876543210");
    }

    #[test]
    fn test_validate_rejects_empty_bill() {
        assert!(draft().validate().is_err());
    }
}
