//! # Validation Module
//!
//! Input validation for bills and settlements.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Billing UI                                                   │
//! │  ├── Basic format checks, quantity capped to available stock           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Billing app (Rust)                                           │
//! │  └── THIS MODULE: checked before ANY store call                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── PRIMARY KEY on customers.phone                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockbook_core::validation::{validate_phone, validate_quantity};
//!
//! validate_phone("9876543210").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{CustomerDetails, Discount, LineItem, PaymentSplit};
use crate::{MAX_AMOUNT_CENTS, MAX_BILL_LINES, MAX_ITEM_QUANTITY, PHONE_DIGITS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Customer Validators
// =============================================================================

/// Validates a customer phone number.
///
/// ## Rules
/// - Exactly 10 ASCII digits, nothing else (no `+91`, no spaces)
///
/// ## Example
/// ```rust
/// use stockbook_core::validation::validate_phone;
///
/// assert!(validate_phone("9876543210").is_ok());
/// assert!(validate_phone("98765 43210").is_err());
/// assert!(validate_phone("").is_err());
/// ```
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    if phone.trim().is_empty() {
        return Err(ValidationError::required("phone"));
    }

    if phone.len() != PHONE_DIGITS || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: format!("must be exactly {} digits", PHONE_DIGITS),
        });
    }

    Ok(())
}

/// Validates a customer name.
///
/// ## Rules
/// - Must not be blank
/// - At most 100 characters
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("customer name"));
    }

    if name.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "customer name".to_string(),
            max: 100,
        });
    }

    Ok(())
}

pub fn validate_customer(customer: &CustomerDetails) -> ValidationResult<()> {
    validate_phone(&customer.phone)?;
    validate_customer_name(&customer.name)
}

// =============================================================================
// Line Item Validators
// =============================================================================

/// Product name as the ledger stores it. Every entry point that takes a
/// product name goes through this before reading or writing.
///
/// ```rust
/// use stockbook_core::validation::normalize_product;
///
/// assert_eq!(normalize_product("  Linen Shirt "), "Linen Shirt");
/// ```
pub fn normalize_product(name: &str) -> &str {
    name.trim()
}

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a monetary amount that may be zero but never negative.
///
/// ## Rules
/// - Must not be negative
/// - Must not exceed MAX_AMOUNT_CENTS
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::negative(field));
    }

    if amount.cents() > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }

    Ok(())
}

/// Validates one line of a bill.
///
/// ## Rules
/// - Product and size must be non-empty
/// - Quantity per [`validate_quantity`]
/// - MRP per [`validate_amount`]
/// - A fixed discount per [`validate_amount`]
pub fn validate_line_item(item: &LineItem) -> ValidationResult<()> {
    if item.product.trim().is_empty() {
        return Err(ValidationError::required("product"));
    }

    if item.size.is_empty() {
        return Err(ValidationError::required("size"));
    }

    validate_quantity(item.quantity)?;
    validate_amount("mrp", item.mrp())?;

    if let Discount::Fixed(amount) = item.discount {
        validate_amount("item discount", amount)?;
    }

    Ok(())
}

/// Validates the line items of a bill as a whole.
pub fn validate_line_items(items: &[LineItem]) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::required("line items"));
    }

    if items.len() > MAX_BILL_LINES {
        return Err(ValidationError::OutOfRange {
            field: "line items".to_string(),
            min: 1,
            max: MAX_BILL_LINES as i64,
        });
    }

    items.iter().try_for_each(validate_line_item)
}

/// Validates that no component of a payment split is negative.
pub fn validate_payment_split(payment: &PaymentSplit) -> ValidationResult<()> {
    validate_amount("upi amount", Money::from_cents(payment.upi_cents))?;
    validate_amount("cash amount", Money::from_cents(payment.cash_cents))?;
    validate_amount("pay later amount", payment.pay_later())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Size;

    fn shirt(qty: i64) -> LineItem {
        LineItem::new("Linen Shirt", Size::new("M"), Money::from_cents(100_000), qty)
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("9876543210").is_ok());

        assert!(validate_phone("").is_err());
        assert!(validate_phone("987654321").is_err());
        assert!(validate_phone("98765432100").is_err());
        assert!(validate_phone("98765o3210").is_err());
        assert!(validate_phone("+919876543").is_err());
    }

    #[test]
    fn test_validate_customer_name() {
        assert!(validate_customer_name("Asha").is_ok());
        assert!(validate_customer_name("   ").is_err());
        assert!(validate_customer_name(&"A".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_line_item() {
        assert!(validate_line_item(&shirt(2)).is_ok());
        assert!(validate_line_item(&shirt(0)).is_err());

        let mut blank = shirt(1);
        blank.product = " ".to_string();
        assert_eq!(
            validate_line_item(&blank),
            Err(ValidationError::required("product"))
        );

        let no_size = LineItem::new("Linen Shirt", Size::new(""), Money::from_cents(100), 1);
        assert_eq!(
            validate_line_item(&no_size),
            Err(ValidationError::required("size"))
        );

        let negative_discount = shirt(1).with_discount(Discount::fixed(Money::from_cents(-1)));
        assert!(validate_line_item(&negative_discount).is_err());
    }

    #[test]
    fn test_validate_amount_bounds() {
        assert!(validate_amount("mrp", Money::zero()).is_ok());
        assert!(validate_amount("mrp", Money::from_cents(MAX_AMOUNT_CENTS)).is_ok());
        assert_eq!(
            validate_amount("mrp", Money::from_cents(MAX_AMOUNT_CENTS + 1)),
            Err(ValidationError::OutOfRange {
                field: "mrp".to_string(),
                min: 0,
                max: MAX_AMOUNT_CENTS,
            })
        );
    }

    #[test]
    fn test_huge_mrp_rejected_before_totals() {
        let huge = LineItem::new("Linen Shirt", Size::new("M"), Money::from_cents(i64::MAX / 2), 3);
        assert!(matches!(
            validate_line_item(&huge),
            Err(ValidationError::OutOfRange { .. })
        ));

        // The largest line that passes still totals without overflow
        let largest = LineItem::new(
            "Linen Shirt",
            Size::new("M"),
            Money::from_cents(MAX_AMOUNT_CENTS),
            MAX_ITEM_QUANTITY,
        );
        let lines = vec![largest; MAX_BILL_LINES];
        assert!(validate_line_items(&lines).is_ok());
        let totals = crate::pricing::BillTotals::compute(&lines, Discount::none());
        assert_eq!(
            totals.grand_total.cents(),
            MAX_AMOUNT_CENTS * MAX_ITEM_QUANTITY * MAX_BILL_LINES as i64
        );
    }

    #[test]
    fn test_validate_line_items_requires_one() {
        assert!(validate_line_items(&[]).is_err());
        assert!(validate_line_items(&[shirt(1), shirt(3)]).is_ok());
    }

    #[test]
    fn test_validate_payment_split() {
        let ok = PaymentSplit::new(Money::from_cents(10), Money::zero(), Money::zero());
        assert!(validate_payment_split(&ok).is_ok());

        let bad = PaymentSplit::new(Money::from_cents(10), Money::from_cents(-1), Money::zero());
        assert_eq!(
            validate_payment_split(&bad),
            Err(ValidationError::negative("cash amount"))
        );

        let huge = PaymentSplit::new(Money::zero(), Money::zero(), Money::from_cents(i64::MAX));
        assert!(matches!(
            validate_payment_split(&huge),
            Err(ValidationError::OutOfRange { .. })
        ));
    }
}
