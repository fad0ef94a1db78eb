//! # Ledger Store Seam
//!
//! Every read and write the billing services make goes through
//! [`LedgerStore`]. `stockbook_db::Database` is the production
//! implementation; tests wrap it to inject failures between steps.
//!
//! ```text
//! ┌──────────────────┐      LedgerStore       ┌──────────────────────────┐
//! │ OrderPlacement   │ ─────────────────────▶ │ Database (SQLite)        │
//! │ SettlementService│   one .await per call  │  movements / order_lines │
//! │ StockDesk        │   no spanning txn      │  pay_later_transactions  │
//! └──────────────────┘                        └──────────────────────────┘
//! ```

use async_trait::async_trait;

use crate::error::{BillingError, BillingResult};
use stockbook_core::{
    validation::validate_phone, InventoryMovement, OrderBalance, OrderLine, OrderNo,
    PayLaterTransaction, ProductListing, Size, ValidationError,
};
use stockbook_db::{Database, DbResult};

/// Which movements to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovementFilter {
    All,
    Product(String),
    Products(Vec<String>),
}

/// Which pay-later balances to read.
///
/// `Order` returns the balance even when fully settled, so callers can tell
/// "settled" from "unknown". `Phone` and `Outstanding` return only balances
/// with something left to pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceQuery {
    Phone(String),
    Order(OrderNo),
    Outstanding,
}

impl BalanceQuery {
    /// Reads a counter search box: ten digits is a phone, any other number
    /// is an order number.
    pub fn parse(input: &str) -> BillingResult<Self> {
        let input = input.trim();

        if validate_phone(input).is_ok() {
            return Ok(BalanceQuery::Phone(input.to_string()));
        }

        input
            .parse::<OrderNo>()
            .ok()
            .filter(|n| *n > 0)
            .map(BalanceQuery::Order)
            .ok_or_else(|| {
                BillingError::from(ValidationError::InvalidFormat {
                    field: "search".to_string(),
                    reason: "enter a 10-digit phone or an order number".to_string(),
                })
            })
    }
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn query_movements(&self, filter: &MovementFilter) -> DbResult<Vec<InventoryMovement>>;

    async fn insert_movements(&self, movements: &[InventoryMovement]) -> DbResult<()>;

    /// Sets a lot's remaining quantity if it still equals `expected`.
    /// Fails with `DbError::Conflict` otherwise.
    async fn update_movement_remaining(
        &self,
        id: &str,
        expected: i64,
        remaining: i64,
    ) -> DbResult<()>;

    async fn query_max_order_no(&self) -> DbResult<Option<OrderNo>>;

    /// Atomically claims the next order number.
    async fn reserve_order_no(&self, first: OrderNo) -> DbResult<OrderNo>;

    async fn insert_order_lines(&self, lines: &[OrderLine]) -> DbResult<()>;

    /// Returns whether a new customer row was written.
    async fn upsert_customer_if_absent(&self, phone: &str, name: &str) -> DbResult<bool>;

    async fn insert_settlement_transaction(&self, txn: &PayLaterTransaction) -> DbResult<()>;

    async fn query_order_balances(&self, query: &BalanceQuery) -> DbResult<Vec<OrderBalance>>;

    async fn order_lines(&self, order_no: OrderNo) -> DbResult<Vec<OrderLine>>;

    async fn settlement_transactions(&self, order_no: OrderNo)
        -> DbResult<Vec<PayLaterTransaction>>;

    async fn product_listing(&self, product: &str, size: &Size)
        -> DbResult<Option<ProductListing>>;

    async fn upsert_product_listing(&self, listing: &ProductListing) -> DbResult<()>;
}

#[async_trait]
impl LedgerStore for Database {
    async fn query_movements(&self, filter: &MovementFilter) -> DbResult<Vec<InventoryMovement>> {
        match filter {
            MovementFilter::All => self.movements().all().await,
            MovementFilter::Product(product) => self.movements().for_product(product).await,
            MovementFilter::Products(products) => self.movements().for_products(products).await,
        }
    }

    async fn insert_movements(&self, movements: &[InventoryMovement]) -> DbResult<()> {
        self.movements().insert_many(movements).await
    }

    async fn update_movement_remaining(
        &self,
        id: &str,
        expected: i64,
        remaining: i64,
    ) -> DbResult<()> {
        self.movements().update_remaining(id, expected, remaining).await
    }

    async fn query_max_order_no(&self) -> DbResult<Option<OrderNo>> {
        self.orders().max_order_no().await
    }

    async fn reserve_order_no(&self, first: OrderNo) -> DbResult<OrderNo> {
        self.orders().reserve_order_no(first).await
    }

    async fn insert_order_lines(&self, lines: &[OrderLine]) -> DbResult<()> {
        self.orders().insert_lines(lines).await
    }

    async fn upsert_customer_if_absent(&self, phone: &str, name: &str) -> DbResult<bool> {
        self.customers().insert_if_absent(phone, name).await
    }

    async fn insert_settlement_transaction(&self, txn: &PayLaterTransaction) -> DbResult<()> {
        self.settlements().insert(txn).await
    }

    async fn query_order_balances(&self, query: &BalanceQuery) -> DbResult<Vec<OrderBalance>> {
        match query {
            BalanceQuery::Phone(phone) => self.settlements().outstanding_for_phone(phone).await,
            BalanceQuery::Order(order_no) => Ok(self
                .settlements()
                .balance_for_order(*order_no)
                .await?
                .into_iter()
                .collect()),
            BalanceQuery::Outstanding => self.settlements().outstanding().await,
        }
    }

    async fn order_lines(&self, order_no: OrderNo) -> DbResult<Vec<OrderLine>> {
        self.orders().lines_for_order(order_no).await
    }

    async fn settlement_transactions(
        &self,
        order_no: OrderNo,
    ) -> DbResult<Vec<PayLaterTransaction>> {
        self.settlements().for_order(order_no).await
    }

    async fn product_listing(
        &self,
        product: &str,
        size: &Size,
    ) -> DbResult<Option<ProductListing>> {
        self.products().get(product, size).await
    }

    async fn upsert_product_listing(&self, listing: &ProductListing) -> DbResult<()> {
        self.products().upsert(listing).await
    }
}
