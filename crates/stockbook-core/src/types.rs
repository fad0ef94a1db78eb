//! # Domain Types
//!
//! Core domain types used throughout Stockbook.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌───────────────────┐  ┌───────────────────┐  ┌───────────────────┐   │
//! │  │ InventoryMovement │  │    OrderLine      │  │ PayLaterTransaction│  │
//! │  │  ───────────────  │  │  ───────────────  │  │  ───────────────  │   │
//! │  │  product, size    │  │  order_no         │  │  order_no         │   │
//! │  │  quantity         │  │  mrp, quantity    │  │  upi_cents        │   │
//! │  │  kind ────────────┼─►│  discounts        │  │  cash_cents       │   │
//! │  │  Added/Removed/   │  │  payment split    │  └───────────────────┘   │
//! │  │  Sold             │  └───────────────────┘                          │
//! │  └───────────────────┘                                                  │
//! │                                                                         │
//! │  Customer (phone → name)   ProductListing (product, size → mrp)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lots
//! An `Added` movement doubles as a lot: its `quantity` is the number of
//! units not yet sold out of it, decremented in place by order placement.
//! `Removed` and `Sold` movements are immutable history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;
use crate::CANONICAL_SIZES;

/// Sequential, human-facing order number shared by all lines of one bill.
pub type OrderNo = i64;

// =============================================================================
// Size
// =============================================================================

/// A garment size label (`"M"`, `"XL"`, `"32"`, ...).
///
/// Ordered by the canonical sequence `XS < S < M < L < XL < XXL < XXXL`;
/// labels outside that sequence sort after it, alphabetically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Size(String);

impl Size {
    /// Creates a size label, trimmed and upper-cased.
    pub fn new(label: impl AsRef<str>) -> Self {
        Size(label.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Position in the canonical size sequence, if the label is part of it.
    pub fn canonical_rank(&self) -> Option<usize> {
        CANONICAL_SIZES.iter().position(|s| *s == self.0)
    }
}

impl Ord for Size {
    fn cmp(&self, other: &Self) -> Ordering {
        let rank = |s: &Size| s.canonical_rank().unwrap_or(CANONICAL_SIZES.len());
        rank(self)
            .cmp(&rank(other))
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Size {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Size {
    fn from(label: &str) -> Self {
        Size::new(label)
    }
}

// =============================================================================
// Inventory Movement
// =============================================================================

/// What an inventory movement did to stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Stock received; `quantity` is the lot's remaining units.
    Added,
    /// Stock written off by hand (damage, shrinkage, ...).
    Removed,
    /// Audit record of units sold on an order.
    Sold,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Added => "added",
            MovementKind::Removed => "removed",
            MovementKind::Sold => "sold",
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the stock ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryMovement {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub product: String,

    pub size: Size,

    /// For `Added`: remaining unconsumed units. Otherwise: units moved.
    pub quantity: i64,

    pub kind: MovementKind,

    /// Purchase price per unit for `Added`, selling price for `Sold`.
    pub unit_price_cents: i64,

    pub note: Option<String>,

    /// Reference to a photo of the received stock.
    pub image_ref: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl InventoryMovement {
    fn new(
        kind: MovementKind,
        product: impl Into<String>,
        size: Size,
        quantity: i64,
        unit_price: Money,
        created_at: DateTime<Utc>,
    ) -> Self {
        InventoryMovement {
            id: Uuid::new_v4().to_string(),
            product: product.into(),
            size,
            quantity,
            kind,
            unit_price_cents: unit_price.cents(),
            note: None,
            image_ref: None,
            created_at,
        }
    }

    /// A freshly received lot.
    pub fn added(
        product: impl Into<String>,
        size: Size,
        quantity: i64,
        unit_price: Money,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self::new(MovementKind::Added, product, size, quantity, unit_price, created_at)
    }

    /// A manual write-off.
    pub fn removed(
        product: impl Into<String>,
        size: Size,
        quantity: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self::new(MovementKind::Removed, product, size, quantity, Money::zero(), created_at)
    }

    /// The audit record of a sale.
    pub fn sold(
        product: impl Into<String>,
        size: Size,
        quantity: i64,
        unit_price: Money,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self::new(MovementKind::Sold, product, size, quantity, unit_price, created_at)
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_image_ref(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }

    /// Whether this movement is for the given product and size.
    pub fn is_for(&self, product: &str, size: &Size) -> bool {
        self.product == product && &self.size == size
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }
}

// =============================================================================
// Discounts
// =============================================================================

/// Storage tag for a [`Discount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Percentage,
    Fixed,
}

/// A discount on a line item or on a whole order.
///
/// Percentages are carried in basis points (1000 = 10%). Out-of-range values
/// are accepted here and clamped by the pricing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Discount {
    Percentage(u32),
    Fixed(Money),
}

impl Discount {
    /// No discount.
    pub const fn none() -> Self {
        Discount::Percentage(0)
    }

    /// A percentage discount in whole percent.
    pub const fn percent(whole: u32) -> Self {
        Discount::Percentage(whole.saturating_mul(100))
    }

    pub const fn percentage_bps(bps: u32) -> Self {
        Discount::Percentage(bps)
    }

    pub const fn fixed(amount: Money) -> Self {
        Discount::Fixed(amount)
    }

    pub fn kind(&self) -> DiscountKind {
        match self {
            Discount::Percentage(_) => DiscountKind::Percentage,
            Discount::Fixed(_) => DiscountKind::Fixed,
        }
    }

    /// The value column stored next to [`DiscountKind`].
    pub fn stored_value(&self) -> i64 {
        match self {
            Discount::Percentage(bps) => i64::from(*bps),
            Discount::Fixed(amount) => amount.cents(),
        }
    }

    /// Rebuilds a discount from its `(kind, value)` columns.
    pub fn from_stored(kind: DiscountKind, value: i64) -> Self {
        match kind {
            DiscountKind::Percentage => {
                Discount::Percentage(u32::try_from(value.max(0)).unwrap_or(u32::MAX))
            }
            DiscountKind::Fixed => Discount::Fixed(Money::from_cents(value)),
        }
    }
}

impl Default for Discount {
    fn default() -> Self {
        Discount::none()
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer, keyed by phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    /// Exactly ten digits.
    pub phone: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Customer details as typed at the counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerDetails {
    pub phone: String,
    pub name: String,
}

impl CustomerDetails {
    pub fn new(phone: impl Into<String>, name: impl Into<String>) -> Self {
        CustomerDetails {
            phone: phone.into(),
            name: name.into(),
        }
    }
}

// =============================================================================
// Line Items & Payment Split
// =============================================================================

/// One line of a bill before it is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub product: String,
    pub size: Size,
    pub mrp_cents: i64,
    pub quantity: i64,
    pub discount: Discount,
}

impl LineItem {
    pub fn new(product: impl Into<String>, size: Size, mrp: Money, quantity: i64) -> Self {
        LineItem {
            product: product.into(),
            size,
            mrp_cents: mrp.cents(),
            quantity,
            discount: Discount::none(),
        }
    }

    pub fn with_discount(mut self, discount: Discount) -> Self {
        self.discount = discount;
        self
    }

    #[inline]
    pub fn mrp(&self) -> Money {
        Money::from_cents(self.mrp_cents)
    }
}

/// How an order's grand total is paid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentSplit {
    pub upi_cents: i64,
    pub cash_cents: i64,
    /// Left unpaid at the counter; settled later.
    pub pay_later_cents: i64,
}

impl PaymentSplit {
    pub fn new(upi: Money, cash: Money, pay_later: Money) -> Self {
        PaymentSplit {
            upi_cents: upi.cents(),
            cash_cents: cash.cents(),
            pay_later_cents: pay_later.cents(),
        }
    }

    pub fn total(&self) -> Money {
        Money::from_cents(self.upi_cents + self.cash_cents + self.pay_later_cents)
    }

    #[inline]
    pub fn pay_later(&self) -> Money {
        Money::from_cents(self.pay_later_cents)
    }
}

// =============================================================================
// Order Line
// =============================================================================

/// A persisted order line. One row per item; all rows of a bill share
/// `order_no` and carry identical order-level discount, total and payment
/// split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderLine {
    pub id: String,
    pub order_no: OrderNo,
    pub customer_phone: String,
    pub customer_name: String,
    pub product: String,
    pub size: Size,
    pub mrp_cents: i64,
    pub quantity: i64,
    pub item_discount_kind: DiscountKind,
    pub item_discount_value: i64,
    /// Effective unit price after the item discount.
    pub selling_price_cents: i64,
    pub line_total_cents: i64,
    pub order_discount_kind: DiscountKind,
    pub order_discount_value: i64,
    /// Grand total of the whole order.
    pub order_amount_cents: i64,
    pub upi_cents: i64,
    pub cash_cents: i64,
    pub pay_later_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderLine {
    pub fn item_discount(&self) -> Discount {
        Discount::from_stored(self.item_discount_kind, self.item_discount_value)
    }

    pub fn order_discount(&self) -> Discount {
        Discount::from_stored(self.order_discount_kind, self.order_discount_value)
    }

    pub fn payment(&self) -> PaymentSplit {
        PaymentSplit {
            upi_cents: self.upi_cents,
            cash_cents: self.cash_cents,
            pay_later_cents: self.pay_later_cents,
        }
    }

    #[inline]
    pub fn order_amount(&self) -> Money {
        Money::from_cents(self.order_amount_cents)
    }
}

// =============================================================================
// Pay Later
// =============================================================================

/// One settlement payment applied to one order's pay-later balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PayLaterTransaction {
    pub id: String,
    pub order_no: OrderNo,
    pub upi_cents: i64,
    pub cash_cents: i64,
    pub phone: String,
    pub customer_name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl PayLaterTransaction {
    /// Amount this transaction took off the balance.
    pub fn amount(&self) -> Money {
        Money::from_cents(self.upi_cents + self.cash_cents)
    }
}

/// An order's outstanding pay-later balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderBalance {
    pub order_no: OrderNo,
    pub customer_phone: String,
    pub customer_name: String,
    /// `pay_later` recorded when the order was placed.
    pub original_pay_later_cents: i64,
    /// Σ of all settlement transactions against the order.
    pub settled_cents: i64,
    /// `max(0, original - settled)`.
    pub remaining_cents: i64,
}

impl OrderBalance {
    #[inline]
    pub fn remaining(&self) -> Money {
        Money::from_cents(self.remaining_cents)
    }
}

// =============================================================================
// Reference Data
// =============================================================================

/// Catalogue entry used to seed a line item's MRP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductListing {
    pub product: String,
    pub size: Size,
    pub mrp_cents: i64,
}

impl ProductListing {
    #[inline]
    pub fn mrp(&self) -> Money {
        Money::from_cents(self.mrp_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_canonical_order() {
        let mut sizes: Vec<Size> = ["XL", "32", "S", "XXXL", "28", "M", "xs"]
            .iter()
            .map(|s| Size::new(s))
            .collect();
        sizes.sort();
        let labels: Vec<&str> = sizes.iter().map(Size::as_str).collect();
        assert_eq!(labels, vec!["XS", "S", "M", "XL", "XXXL", "28", "32"]);
    }

    #[test]
    fn test_size_normalizes_label() {
        assert_eq!(Size::new(" xl "), Size::new("XL"));
        assert_eq!(Size::new("XL").canonical_rank(), Some(4));
        assert_eq!(Size::new("FREE").canonical_rank(), None);
    }

    #[test]
    fn test_discount_storage_roundtrip_by_kind() {
        let pct = Discount::percent(10);
        assert_eq!(pct.kind(), DiscountKind::Percentage);
        assert_eq!(pct.stored_value(), 1000);

        let fixed = Discount::fixed(Money::from_cents(5000));
        assert_eq!(
            Discount::from_stored(fixed.kind(), fixed.stored_value()),
            fixed
        );

        // A corrupt negative percentage reads back as no discount.
        assert_eq!(
            Discount::from_stored(DiscountKind::Percentage, -50),
            Discount::none()
        );
    }

    #[test]
    fn test_discount_serde_shape() {
        let json = serde_json::to_value(Discount::percent(10)).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "percentage", "value": 1000 }));

        let json = serde_json::to_value(Discount::fixed(Money::from_cents(2500))).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "fixed", "value": 2500 }));
    }

    #[test]
    fn test_payment_split_total() {
        let split = PaymentSplit::new(
            Money::from_cents(500),
            Money::from_cents(300),
            Money::from_cents(200),
        );
        assert_eq!(split.total().cents(), 1000);
        assert_eq!(split.pay_later().cents(), 200);
    }

    #[test]
    fn test_movement_constructors() {
        let now = Utc::now();
        let lot = InventoryMovement::added("Linen Shirt", Size::new("M"), 10, Money::from_cents(40_000), now)
            .with_note("first delivery");
        assert_eq!(lot.kind, MovementKind::Added);
        assert!(lot.is_for("Linen Shirt", &Size::new("m")));
        assert_eq!(lot.note.as_deref(), Some("first delivery"));

        let removal = InventoryMovement::removed("Linen Shirt", Size::new("M"), 2, now);
        assert_eq!(removal.kind, MovementKind::Removed);
        assert_eq!(removal.unit_price(), Money::zero());
        assert_ne!(lot.id, removal.id);
    }
}
