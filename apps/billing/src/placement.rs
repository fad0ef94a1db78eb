//! # Order Placement
//!
//! Turns a checked-out bill into persisted order lines, consumed stock lots
//! and audit movements.
//!
//! ## Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  permission → validate → totals → payment == grand total               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  read movements ──▶ FIFO plan for every line     (nothing written yet)  │
//! │       │                                                                 │
//! │  ═════╪═══════════════════ first write ═══════════════════════════════  │
//! │       ▼                                                                 │
//! │  1. reserve order number                                                │
//! │  2. customer (if absent, existing name wins)                            │
//! │  3. order lines (one per item, order-level fields replicated)           │
//! │  4. lot decrements, oldest first, compare-and-swap                      │
//! │  5. Sold movements (audit)                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failure below the line stops the sequence and comes back as
//! `PartialFailure` listing the steps that landed. Nothing is undone.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::access::{require, AccessPolicy, Permission, PermissionSet};
use crate::config::BillingConfig;
use crate::error::{BillingError, BillingResult, CompletedStep, Operation};
use crate::store::{LedgerStore, MovementFilter};
use stockbook_core::bill::{DraftBill, OrderRequest};
use stockbook_core::inventory::{FifoPlanner, LotDraw, StockLedger};
use stockbook_core::pricing::{BillTotals, LinePricing};
use stockbook_core::validation::{
    normalize_product, validate_customer, validate_line_items, validate_payment_split,
};
use stockbook_core::{
    CoreError, CoreResult, CustomerDetails, Discount, InventoryMovement, LineItem, OrderLine,
    OrderNo, PaymentSplit, Size, FIRST_ORDER_NO,
};

pub struct OrderPlacement<S, P> {
    store: S,
    policy: P,
    first_order_no: OrderNo,
}

impl<S: LedgerStore> OrderPlacement<S, PermissionSet> {
    /// Placement as configured: `[access]` grants and `[billing]` first
    /// order number.
    pub fn from_config(store: S, config: &BillingConfig) -> Self {
        OrderPlacement::new(store, config.access_policy())
            .with_first_order_no(config.billing.first_order_no)
    }
}

impl<S: LedgerStore, P: AccessPolicy> OrderPlacement<S, P> {
    pub fn new(store: S, policy: P) -> Self {
        OrderPlacement {
            store,
            policy,
            first_order_no: FIRST_ORDER_NO,
        }
    }

    /// Number handed to the first order of an empty ledger.
    pub fn with_first_order_no(mut self, first: OrderNo) -> Self {
        self.first_order_no = first;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Adds `quantity` of a catalogue listing to a draft bill.
    ///
    /// The quantity is capped to what the shelf can still supply after the
    /// bill's other lines. Returns the new line's index.
    pub async fn add_to_bill(
        &self,
        bill: &mut DraftBill,
        product: &str,
        size: &Size,
        quantity: i64,
    ) -> BillingResult<usize> {
        let product = normalize_product(product);
        let listing = self
            .store
            .product_listing(product, size)
            .await?
            .ok_or_else(|| BillingError::UnknownListing {
                product: product.to_string(),
                size: size.to_string(),
            })?;

        let movements = self
            .store
            .query_movements(&MovementFilter::Product(product.to_string()))
            .await?;

        let index = bill.add_line(&StockLedger::new(&movements), &listing, quantity)?;
        debug!(
            product = %product,
            size = %size,
            requested = quantity,
            added = bill.lines[index].quantity,
            "Line added to bill"
        );
        Ok(index)
    }

    /// Places a checked-out draft bill.
    pub async fn place(&self, request: &OrderRequest) -> BillingResult<OrderNo> {
        self.place_order(
            &request.customer,
            &request.lines,
            request.order_discount,
            request.payment,
        )
        .await
    }

    /// Places an order and returns its number.
    ///
    /// ## Errors
    /// Before any write:
    /// - `PermissionDenied` without `PlaceOrder`
    /// - `Core(Validation)` for a malformed customer, line or payment
    /// - `Core(BalanceMismatch)` unless `upi + cash + pay_later` is the grand total
    /// - `Core(InsufficientStock)` when any line cannot be drawn in full
    /// - `Persistence` when reading movements or reserving the number fails
    ///
    /// After the order number is reserved: `PartialFailure`.
    pub async fn place_order(
        &self,
        customer: &CustomerDetails,
        lines: &[LineItem],
        order_discount: Discount,
        payment: PaymentSplit,
    ) -> BillingResult<OrderNo> {
        require(&self.policy, Permission::PlaceOrder)?;

        let lines: Vec<LineItem> = lines
            .iter()
            .map(|line| LineItem {
                product: normalize_product(&line.product).to_string(),
                ..line.clone()
            })
            .collect();
        let lines = lines.as_slice();

        validate_customer(customer)
            .and_then(|_| validate_line_items(lines))
            .and_then(|_| validate_payment_split(&payment))
            .map_err(|e| {
                debug!(error = %e, "Order rejected by validation");
                BillingError::from(e)
            })?;

        let totals = BillTotals::compute(lines, order_discount);
        if payment.total() != totals.grand_total {
            warn!(
                expected = %totals.grand_total,
                actual = %payment.total(),
                "Order rejected: payment does not match grand total"
            );
            return Err(CoreError::BalanceMismatch {
                expected: totals.grand_total,
                actual: payment.total(),
            }
            .into());
        }

        let plan = self.plan_draws(lines).await?;

        let order_no = self.store.reserve_order_no(self.first_order_no).await?;
        let mut completed = vec![CompletedStep::OrderNoReserved { order_no }];

        let now = Utc::now();
        let order_lines =
            build_order_lines(order_no, customer, lines, order_discount, payment, &totals, now);
        let sold: Vec<InventoryMovement> = lines
            .iter()
            .map(|line| {
                let pricing = LinePricing::of(line);
                InventoryMovement::sold(
                    line.product.clone(),
                    line.size.clone(),
                    line.quantity,
                    pricing.selling_price,
                    now,
                )
                .with_note(format!("Order #{}", order_no))
            })
            .collect();

        if let Err(source) = self
            .write_order(customer, &order_lines, &plan, &sold, &mut completed)
            .await
        {
            error!(
                order_no,
                completed = completed.len(),
                error = %source,
                "Order placement stopped part way; reconcile manually"
            );
            return Err(BillingError::PartialFailure {
                operation: Operation::PlaceOrder { order_no },
                completed,
                source: Box::new(source),
            });
        }

        info!(
            order_no,
            phone = %customer.phone,
            lines = lines.len(),
            grand_total = %totals.grand_total,
            pay_later = %payment.pay_later(),
            "Order placed"
        );
        Ok(order_no)
    }

    /// FIFO draws for every line, planned against one read of the log.
    async fn plan_draws(&self, lines: &[LineItem]) -> BillingResult<Vec<Vec<LotDraw>>> {
        let products: BTreeSet<&str> = lines.iter().map(|l| l.product.as_str()).collect();
        let movements = self
            .store
            .query_movements(&MovementFilter::Products(
                products.into_iter().map(String::from).collect(),
            ))
            .await?;

        let mut planner = FifoPlanner::new(StockLedger::new(&movements));
        lines
            .iter()
            .map(|line| planner.allocate(&line.product, &line.size, line.quantity))
            .collect::<CoreResult<Vec<_>>>()
            .map_err(|e| {
                warn!(error = %e, "Order rejected: insufficient stock");
                BillingError::from(e)
            })
    }

    /// Steps 2-5. Each landed step is pushed to `completed`.
    async fn write_order(
        &self,
        customer: &CustomerDetails,
        order_lines: &[OrderLine],
        plan: &[Vec<LotDraw>],
        sold: &[InventoryMovement],
        completed: &mut Vec<CompletedStep>,
    ) -> BillingResult<()> {
        let inserted = self
            .store
            .upsert_customer_if_absent(&customer.phone, customer.name.trim())
            .await?;
        completed.push(CompletedStep::CustomerRecorded {
            phone: customer.phone.clone(),
            inserted,
        });

        self.store.insert_order_lines(order_lines).await?;
        if let Some(first) = order_lines.first() {
            completed.push(CompletedStep::OrderLinesWritten {
                order_no: first.order_no,
                count: order_lines.len(),
            });
        }

        for draw in plan.iter().flatten() {
            self.store
                .update_movement_remaining(
                    &draw.movement_id,
                    draw.remaining_before,
                    draw.remaining_after,
                )
                .await?;
            completed.push(CompletedStep::LotDecremented {
                movement_id: draw.movement_id.clone(),
                remaining_before: draw.remaining_before,
                remaining_after: draw.remaining_after,
            });
        }

        self.store.insert_movements(sold).await?;
        completed.push(CompletedStep::SoldRecorded { count: sold.len() });

        Ok(())
    }
}

/// One row per item; order-level discount, total and split on every row.
fn build_order_lines(
    order_no: OrderNo,
    customer: &CustomerDetails,
    lines: &[LineItem],
    order_discount: Discount,
    payment: PaymentSplit,
    totals: &BillTotals,
    created_at: DateTime<Utc>,
) -> Vec<OrderLine> {
    lines
        .iter()
        .map(|line| {
            let pricing = LinePricing::of(line);
            OrderLine {
                id: Uuid::new_v4().to_string(),
                order_no,
                customer_phone: customer.phone.clone(),
                customer_name: customer.name.trim().to_string(),
                product: line.product.clone(),
                size: line.size.clone(),
                mrp_cents: line.mrp_cents,
                quantity: line.quantity,
                item_discount_kind: line.discount.kind(),
                item_discount_value: line.discount.stored_value(),
                selling_price_cents: pricing.selling_price.cents(),
                line_total_cents: pricing.line_total.cents(),
                order_discount_kind: order_discount.kind(),
                order_discount_value: order_discount.stored_value(),
                order_amount_cents: totals.grand_total.cents(),
                upi_cents: payment.upi_cents,
                cash_cents: payment.cash_cents,
                pay_later_cents: payment.pay_later_cents,
                created_at,
            }
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
