//! # Order Repository
//!
//! Order numbers and order lines.
//!
//! ## Order Number Reservation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  order_counter (single row)                                             │
//! │                                                                         │
//! │  first reservation:  no row → MAX(order_lines.order_no) + 1            │
//! │                              or the configured first number            │
//! │  later reservations: last_order_no + 1 (never below max placed + 1)    │
//! │                                                                         │
//! │  One INSERT … ON CONFLICT DO UPDATE … RETURNING statement, so two      │
//! │  terminals can never be handed the same number.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A number reserved by a placement that then fails is not reused, so the
//! sequence can have gaps.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;
use stockbook_core::{OrderLine, OrderNo};

const ORDER_LINE_COLUMNS: &str = r#"
    id, order_no, customer_phone, customer_name, product, size, mrp_cents, quantity,
    item_discount_kind, item_discount_value, selling_price_cents, line_total_cents,
    order_discount_kind, order_discount_value, order_amount_cents,
    upi_cents, cash_cents, pay_later_cents, created_at
"#;

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Highest order number on any order line.
    pub async fn max_order_no(&self) -> DbResult<Option<OrderNo>> {
        let max: Option<i64> = sqlx::query_scalar("SELECT MAX(order_no) FROM order_lines")
            .fetch_one(&self.pool)
            .await?;
        Ok(max)
    }

    /// Reserves the next order number.
    ///
    /// `first` is handed out when no order has ever been placed.
    pub async fn reserve_order_no(&self, first: OrderNo) -> DbResult<OrderNo> {
        let order_no: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO order_counter (id, last_order_no)
            VALUES (1, COALESCE((SELECT MAX(order_no) FROM order_lines) + 1, ?1))
            ON CONFLICT (id) DO UPDATE SET last_order_no = MAX(
                last_order_no,
                COALESCE((SELECT MAX(order_no) FROM order_lines), 0)
            ) + 1
            RETURNING last_order_no
            "#,
        )
        .bind(first)
        .fetch_one(&self.pool)
        .await?;

        info!(order_no, "Reserved order number");
        Ok(order_no)
    }

    /// Inserts all lines of one order; all rows land or none do.
    pub async fn insert_lines(&self, lines: &[OrderLine]) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        for line in lines {
            sqlx::query(
                r#"
                INSERT INTO order_lines (
                    id, order_no, customer_phone, customer_name, product, size,
                    mrp_cents, quantity, item_discount_kind, item_discount_value,
                    selling_price_cents, line_total_cents,
                    order_discount_kind, order_discount_value, order_amount_cents,
                    upi_cents, cash_cents, pay_later_cents, created_at
                ) VALUES (
                    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                    ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19
                )
                "#,
            )
            .bind(&line.id)
            .bind(line.order_no)
            .bind(&line.customer_phone)
            .bind(&line.customer_name)
            .bind(&line.product)
            .bind(&line.size)
            .bind(line.mrp_cents)
            .bind(line.quantity)
            .bind(line.item_discount_kind)
            .bind(line.item_discount_value)
            .bind(line.selling_price_cents)
            .bind(line.line_total_cents)
            .bind(line.order_discount_kind)
            .bind(line.order_discount_value)
            .bind(line.order_amount_cents)
            .bind(line.upi_cents)
            .bind(line.cash_cents)
            .bind(line.pay_later_cents)
            .bind(line.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(count = lines.len(), "Inserted order lines");
        Ok(())
    }

    /// Lines of one order, in insertion order.
    pub async fn lines_for_order(&self, order_no: OrderNo) -> DbResult<Vec<OrderLine>> {
        let sql = format!(
            "SELECT {ORDER_LINE_COLUMNS} FROM order_lines WHERE order_no = ?1 ORDER BY rowid"
        );
        let lines = sqlx::query_as::<_, OrderLine>(&sql)
            .bind(order_no)
            .fetch_all(&self.pool)
            .await?;
        Ok(lines)
    }

    /// Every line billed to `phone`, newest order first.
    pub async fn lines_for_phone(&self, phone: &str) -> DbResult<Vec<OrderLine>> {
        let sql = format!(
            "SELECT {ORDER_LINE_COLUMNS} FROM order_lines WHERE customer_phone = ?1 \
             ORDER BY order_no DESC, rowid"
        );
        let lines = sqlx::query_as::<_, OrderLine>(&sql)
            .bind(phone)
            .fetch_all(&self.pool)
            .await?;
        Ok(lines)
    }
}
