//! # Pay-Later Settlement
//!
//! Applies one UPI/cash payment across a customer's selected unpaid orders.
//! The split itself is pure (`stockbook_core::settlement`); this service
//! reads the live balances, records one transaction per order paid and
//! answers balance lookups.
//!
//! Balances are never stored. Every read recomputes
//! `max(0, original pay-later − Σ settlements)` from the transaction log.

use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use crate::access::{require, AccessPolicy, Permission};
use crate::error::{BillingError, BillingResult, CompletedStep, Operation};
use crate::store::{BalanceQuery, LedgerStore};
use stockbook_core::settlement::{allocate_payment, net_pay_later};
use stockbook_core::{Money, OrderBalance, OrderNo, PayLaterTransaction, ValidationError};

pub struct SettlementService<S, P> {
    store: S,
    policy: P,
}

impl<S: LedgerStore, P: AccessPolicy> SettlementService<S, P> {
    pub fn new(store: S, policy: P) -> Self {
        SettlementService { store, policy }
    }

    /// Settles `selection` with `upi + cash`, in the caller's order.
    ///
    /// UPI is used up first, order by order, then cash. Returns the
    /// transactions recorded, one per order that received money.
    ///
    /// ## Errors
    /// - `PermissionDenied` without `SettlePayLater`
    /// - `OrderNotFound` / `NothingOutstanding` for a selected order
    /// - `Core(BalanceMismatch)` unless the payment equals the selected balances
    /// - `PartialFailure` if a transaction write fails after another landed
    pub async fn settle(
        &self,
        selection: &[OrderNo],
        upi: Money,
        cash: Money,
    ) -> BillingResult<Vec<PayLaterTransaction>> {
        require(&self.policy, Permission::SettlePayLater)?;

        if selection.is_empty() {
            return Err(ValidationError::required("orders to settle").into());
        }

        let mut balances = Vec::with_capacity(selection.len());
        for &order_no in selection {
            balances.push(self.current_balance(order_no).await?);
        }

        let allocations = allocate_payment(&balances, upi, cash)?;

        let now = Utc::now();
        let mut recorded: Vec<PayLaterTransaction> = Vec::with_capacity(allocations.len());

        for allocation in &allocations {
            let Some(balance) = balances.iter().find(|b| b.order_no == allocation.order_no) else {
                continue;
            };

            let txn = PayLaterTransaction {
                id: Uuid::new_v4().to_string(),
                order_no: allocation.order_no,
                upi_cents: allocation.upi.cents(),
                cash_cents: allocation.cash.cents(),
                phone: balance.customer_phone.clone(),
                customer_name: balance.customer_name.clone(),
                created_at: now,
            };

            if let Err(e) = self.store.insert_settlement_transaction(&txn).await {
                let source = BillingError::from(e);
                if recorded.is_empty() {
                    return Err(source);
                }

                error!(
                    recorded = recorded.len(),
                    failed_order = allocation.order_no,
                    error = %source,
                    "Settlement stopped part way; reconcile manually"
                );
                return Err(BillingError::PartialFailure {
                    operation: Operation::Settle {
                        orders: selection.to_vec(),
                    },
                    completed: recorded.into_iter().map(CompletedStep::SettlementRecorded).collect(),
                    source: Box::new(source),
                });
            }

            recorded.push(txn);
        }

        info!(
            orders = recorded.len(),
            upi = %upi,
            cash = %cash,
            "Pay-later settled"
        );
        Ok(recorded)
    }

    /// Unpaid balances for a 10-digit phone or an order number.
    pub async fn outstanding(&self, phone_or_order_no: &str) -> BillingResult<Vec<OrderBalance>> {
        let query = BalanceQuery::parse(phone_or_order_no)?;
        let balances = self.store.query_order_balances(&query).await?;
        Ok(balances.into_iter().filter(|b| b.remaining_cents > 0).collect())
    }

    /// Every unpaid balance in the ledger, oldest order first.
    pub async fn all_outstanding(&self) -> BillingResult<Vec<OrderBalance>> {
        Ok(self.store.query_order_balances(&BalanceQuery::Outstanding).await?)
    }

    /// Settlement history of one order, oldest first.
    pub async fn transactions_for_order(
        &self,
        order_no: OrderNo,
    ) -> BillingResult<Vec<PayLaterTransaction>> {
        Ok(self.store.settlement_transactions(order_no).await?)
    }

    /// What an order still owes, recomputed from its order lines and its
    /// settlement history.
    pub async fn net_pay_later(&self, order_no: OrderNo) -> BillingResult<Money> {
        let lines = self.store.order_lines(order_no).await?;
        let original = lines
            .first()
            .map(|line| line.payment().pay_later())
            .ok_or(BillingError::OrderNotFound(order_no))?;

        let txns = self.store.settlement_transactions(order_no).await?;
        Ok(net_pay_later(original, &txns))
    }

    async fn current_balance(&self, order_no: OrderNo) -> BillingResult<OrderBalance> {
        let balance = self
            .store
            .query_order_balances(&BalanceQuery::Order(order_no))
            .await?
            .into_iter()
            .next()
            .ok_or(BillingError::OrderNotFound(order_no))?;

        if balance.remaining_cents <= 0 {
            return Err(BillingError::NothingOutstanding(order_no));
        }
        Ok(balance)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
