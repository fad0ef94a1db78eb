//! # Settlement Repository
//!
//! Pay-later transactions and the balances derived from them.
//!
//! A balance is never stored. Each read sums an order's transactions and
//! subtracts them from the pay-later amount recorded on its order lines.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use stockbook_core::{OrderBalance, OrderNo, PayLaterTransaction};

/// One row per order: the pay-later amount it was placed with and the sum of
/// its settlements.
const BALANCES: &str = r#"
    SELECT
        o.order_no,
        o.customer_phone,
        o.customer_name,
        o.pay_later_cents AS original_pay_later_cents,
        COALESCE(t.settled, 0) AS settled_cents,
        MAX(o.pay_later_cents - COALESCE(t.settled, 0), 0) AS remaining_cents
    FROM (
        SELECT
            order_no,
            MIN(customer_phone) AS customer_phone,
            MIN(customer_name) AS customer_name,
            MAX(pay_later_cents) AS pay_later_cents
        FROM order_lines
        GROUP BY order_no
    ) o
    LEFT JOIN (
        SELECT order_no, SUM(upi_cents + cash_cents) AS settled
        FROM pay_later_transactions
        GROUP BY order_no
    ) t ON t.order_no = o.order_no
"#;

#[derive(Debug, Clone)]
pub struct SettlementRepository {
    pool: SqlitePool,
}

impl SettlementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettlementRepository { pool }
    }

    pub async fn insert(&self, txn: &PayLaterTransaction) -> DbResult<()> {
        debug!(
            order_no = txn.order_no,
            upi = txn.upi_cents,
            cash = txn.cash_cents,
            "Recording settlement"
        );

        sqlx::query(
            r#"
            INSERT INTO pay_later_transactions (
                id, order_no, upi_cents, cash_cents, phone, customer_name, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&txn.id)
        .bind(txn.order_no)
        .bind(txn.upi_cents)
        .bind(txn.cash_cents)
        .bind(&txn.phone)
        .bind(&txn.customer_name)
        .bind(txn.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Settlement history of one order, oldest first.
    pub async fn for_order(&self, order_no: OrderNo) -> DbResult<Vec<PayLaterTransaction>> {
        let txns = sqlx::query_as::<_, PayLaterTransaction>(
            r#"
            SELECT id, order_no, upi_cents, cash_cents, phone, customer_name, created_at
            FROM pay_later_transactions
            WHERE order_no = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(order_no)
        .fetch_all(&self.pool)
        .await?;
        Ok(txns)
    }

    /// Balance of one order, settled or not. `None` if it was never placed.
    pub async fn balance_for_order(&self, order_no: OrderNo) -> DbResult<Option<OrderBalance>> {
        let sql = format!("{BALANCES} WHERE o.order_no = ?1");
        let balance = sqlx::query_as::<_, OrderBalance>(&sql)
            .bind(order_no)
            .fetch_optional(&self.pool)
            .await?;
        Ok(balance)
    }

    /// Orders billed to `phone` that still owe something, oldest first.
    pub async fn outstanding_for_phone(&self, phone: &str) -> DbResult<Vec<OrderBalance>> {
        let sql = format!(
            "{BALANCES} WHERE o.customer_phone = ?1 \
             AND o.pay_later_cents > COALESCE(t.settled, 0) \
             ORDER BY o.order_no"
        );
        let balances = sqlx::query_as::<_, OrderBalance>(&sql)
            .bind(phone)
            .fetch_all(&self.pool)
            .await?;

        debug!(phone = %phone, count = balances.len(), "Loaded outstanding balances");
        Ok(balances)
    }

    /// Every order that still owes something, oldest first.
    pub async fn outstanding(&self) -> DbResult<Vec<OrderBalance>> {
        let sql = format!(
            "{BALANCES} WHERE o.pay_later_cents > COALESCE(t.settled, 0) ORDER BY o.order_no"
        );
        let balances = sqlx::query_as::<_, OrderBalance>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(balances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::Utc;
    use stockbook_core::{Discount, OrderLine, Size};
    use uuid::Uuid;

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.customers().insert_if_absent("9876543210", "Asha").await.unwrap();
        db
    }

    async fn place(db: &Database, order_no: OrderNo, pay_later: i64, lines: usize) {
        let rows: Vec<OrderLine> = (0..lines)
            .map(|_| OrderLine {
                id: Uuid::new_v4().to_string(),
                order_no,
                customer_phone: "9876543210".to_string(),
                customer_name: "Asha".to_string(),
                product: "Tee".to_string(),
                size: Size::new("M"),
                mrp_cents: 100_000,
                quantity: 1,
                item_discount_kind: Discount::none().kind(),
                item_discount_value: 0,
                selling_price_cents: 100_000,
                line_total_cents: 100_000,
                order_discount_kind: Discount::none().kind(),
                order_discount_value: 0,
                order_amount_cents: 100_000 * lines as i64,
                upi_cents: 100_000 * lines as i64 - pay_later,
                cash_cents: 0,
                pay_later_cents: pay_later,
                created_at: Utc::now(),
            })
            .collect();
        db.orders().insert_lines(&rows).await.unwrap();
    }

    fn txn(order_no: OrderNo, upi: i64, cash: i64) -> PayLaterTransaction {
        PayLaterTransaction {
            id: Uuid::new_v4().to_string(),
            order_no,
            upi_cents: upi,
            cash_cents: cash,
            phone: "9876543210".to_string(),
            customer_name: "Asha".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_balance_counts_order_once_across_lines() {
        let db = setup().await;
        place(&db, 123_451, 30_000, 3).await;

        let balance = db.settlements().balance_for_order(123_451).await.unwrap().unwrap();
        assert_eq!(balance.original_pay_later_cents, 30_000);
        assert_eq!(balance.settled_cents, 0);
        assert_eq!(balance.remaining_cents, 30_000);

        assert!(db.settlements().balance_for_order(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_settlements_reduce_outstanding() {
        let db = setup().await;
        place(&db, 123_451, 30_000, 1).await;
        place(&db, 123_452, 70_000, 2).await;
        place(&db, 123_453, 0, 1).await;

        let outstanding = db.settlements().outstanding_for_phone("9876543210").await.unwrap();
        let order_nos: Vec<OrderNo> = outstanding.iter().map(|b| b.order_no).collect();
        assert_eq!(order_nos, vec![123_451, 123_452]);

        db.settlements().insert(&txn(123_451, 30_000, 0)).await.unwrap();
        db.settlements().insert(&txn(123_452, 20_000, 0)).await.unwrap();
        db.settlements().insert(&txn(123_452, 0, 10_000)).await.unwrap();

        let outstanding = db.settlements().outstanding_for_phone("9876543210").await.unwrap();
        assert_eq!(outstanding.len(), 1);
        assert_eq!(outstanding[0].order_no, 123_452);
        assert_eq!(outstanding[0].settled_cents, 30_000);
        assert_eq!(outstanding[0].remaining_cents, 40_000);

        assert_eq!(db.settlements().for_order(123_452).await.unwrap().len(), 2);
        assert_eq!(db.settlements().outstanding().await.unwrap().len(), 1);
    }
}
