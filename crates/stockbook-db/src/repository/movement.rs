//! # Movement Repository
//!
//! The append-only stock log.
//!
//! ## Row Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Added    inserted by stock entry, then ONLY its quantity changes,     │
//! │           counting down as the lot is sold (compare-and-swap)          │
//! │  Removed  inserted by a manual write-off, never changed                │
//! │  Sold     inserted by order placement, never changed                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::sqlite::SqliteArguments;
use sqlx::query::Query;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockbook_core::{InventoryMovement, MovementKind};

const MOVEMENT_COLUMNS: &str =
    "id, product, size, quantity, kind, unit_price_cents, note, image_ref, created_at";

/// Repository for inventory movements.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Every movement for one product, oldest first.
    pub async fn for_product(&self, product: &str) -> DbResult<Vec<InventoryMovement>> {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE product = ?1 ORDER BY created_at, id"
        );

        let movements = sqlx::query_as::<_, InventoryMovement>(&sql)
            .bind(product)
            .fetch_all(&self.pool)
            .await?;

        debug!(product = %product, count = movements.len(), "Loaded movements");
        Ok(movements)
    }

    /// Every movement for any of `products`, oldest first.
    ///
    /// An empty slice returns nothing rather than the whole log.
    pub async fn for_products(&self, products: &[String]) -> DbResult<Vec<InventoryMovement>> {
        if products.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE product IN ("
        ));
        let mut separated = builder.separated(", ");
        for product in products {
            separated.push_bind(product.as_str());
        }
        separated.push_unseparated(") ORDER BY created_at, id");

        let movements = builder
            .build_query_as::<InventoryMovement>()
            .fetch_all(&self.pool)
            .await?;

        debug!(products = products.len(), count = movements.len(), "Loaded movements");
        Ok(movements)
    }

    /// The whole log, oldest first. Used by reporting.
    pub async fn all(&self) -> DbResult<Vec<InventoryMovement>> {
        let sql = format!("SELECT {MOVEMENT_COLUMNS} FROM movements ORDER BY created_at, id");
        let movements = sqlx::query_as::<_, InventoryMovement>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(movements)
    }

    /// Gets a movement by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<InventoryMovement>> {
        let sql = format!("SELECT {MOVEMENT_COLUMNS} FROM movements WHERE id = ?1");
        let movement = sqlx::query_as::<_, InventoryMovement>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(movement)
    }

    pub async fn insert(&self, movement: &InventoryMovement) -> DbResult<()> {
        debug!(
            id = %movement.id,
            product = %movement.product,
            size = %movement.size,
            kind = %movement.kind,
            quantity = movement.quantity,
            "Inserting movement"
        );

        insert_query(movement).execute(&self.pool).await?;
        Ok(())
    }

    /// Inserts several movements; all rows land or none do.
    pub async fn insert_many(&self, movements: &[InventoryMovement]) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        for movement in movements {
            insert_query(movement).execute(&mut *tx).await?;
        }
        tx.commit().await?;

        debug!(count = movements.len(), "Inserted movements");
        Ok(())
    }

    /// Sets a lot's remaining quantity, but only if it still holds
    /// `expected`.
    ///
    /// ## Errors
    /// - `NotFound` if `id` is not an `Added` movement
    /// - `Conflict` if the lot's quantity is no longer `expected`
    pub async fn update_remaining(&self, id: &str, expected: i64, remaining: i64) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE movements SET quantity = ?3
            WHERE id = ?1 AND kind = ?4 AND quantity = ?2
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(remaining)
        .bind(MovementKind::Added)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current: Option<i64> =
                sqlx::query_scalar("SELECT quantity FROM movements WHERE id = ?1 AND kind = ?2")
                    .bind(id)
                    .bind(MovementKind::Added)
                    .fetch_optional(&self.pool)
                    .await?;

            return Err(match current {
                None => DbError::not_found("Lot", id),
                Some(_) => DbError::conflict("Lot", id, expected),
            });
        }

        debug!(id = %id, expected, remaining, "Lot remaining updated");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movements")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn insert_query(movement: &InventoryMovement) -> Query<'_, Sqlite, SqliteArguments<'_>> {
    sqlx::query(
        r#"
        INSERT INTO movements (
            id, product, size, quantity, kind,
            unit_price_cents, note, image_ref, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.product)
    .bind(&movement.size)
    .bind(movement.quantity)
    .bind(movement.kind)
    .bind(movement.unit_price_cents)
    .bind(&movement.note)
    .bind(&movement.image_ref)
    .bind(movement.created_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{Duration, Utc};
    use stockbook_core::{Money, Size};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_load_for_product() {
        let db = setup().await;
        let now = Utc::now();
        let older = InventoryMovement::added("Tee", Size::new("M"), 4, Money::from_cents(30_000), now - Duration::days(2))
            .with_note("first delivery");
        let newer = InventoryMovement::added("Tee", Size::new("M"), 6, Money::from_cents(32_000), now);
        let other = InventoryMovement::added("Shirt", Size::new("L"), 1, Money::zero(), now);

        db.movements().insert(&newer).await.unwrap();
        db.movements().insert_many(&[older.clone(), other]).await.unwrap();

        let tees = db.movements().for_product("Tee").await.unwrap();
        assert_eq!(tees.len(), 2);
        assert_eq!(tees[0].id, older.id);
        assert_eq!(tees[0].note.as_deref(), Some("first delivery"));
        assert_eq!(tees[0].kind, MovementKind::Added);
        assert_eq!(tees[1].size, Size::new("M"));

        let both = db
            .movements()
            .for_products(&["Tee".to_string(), "Shirt".to_string()])
            .await
            .unwrap();
        assert_eq!(both.len(), 3);
        assert!(db.movements().for_products(&[]).await.unwrap().is_empty());
        assert_eq!(db.movements().count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_update_remaining_is_guarded() {
        let db = setup().await;
        let lot = InventoryMovement::added("Tee", Size::new("M"), 5, Money::zero(), Utc::now());
        db.movements().insert(&lot).await.unwrap();

        db.movements().update_remaining(&lot.id, 5, 2).await.unwrap();
        let stored = db.movements().get_by_id(&lot.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 2);

        // Stale expectation
        let err = db.movements().update_remaining(&lot.id, 5, 1).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { expected: 5, .. }));

        let err = db.movements().update_remaining("missing", 1, 0).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_only_added_rows_are_decremented() {
        let db = setup().await;
        let sold = InventoryMovement::sold("Tee", Size::new("M"), 3, Money::zero(), Utc::now());
        db.movements().insert(&sold).await.unwrap();

        let err = db.movements().update_remaining(&sold.id, 3, 0).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
