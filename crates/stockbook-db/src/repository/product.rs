//! # Product Repository
//!
//! The catalogue: one MRP per product and size. Draft bills read a listing
//! to seed a new line's MRP; stock itself lives in the movement log.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use stockbook_core::{ProductListing, Size};

#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a listing or replaces its MRP.
    pub async fn upsert(&self, listing: &ProductListing) -> DbResult<()> {
        debug!(
            product = %listing.product,
            size = %listing.size,
            mrp = listing.mrp_cents,
            "Upserting product listing"
        );

        sqlx::query(
            r#"
            INSERT INTO products (product, size, mrp_cents)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (product, size) DO UPDATE SET mrp_cents = excluded.mrp_cents
            "#,
        )
        .bind(&listing.product)
        .bind(&listing.size)
        .bind(listing.mrp_cents)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, product: &str, size: &Size) -> DbResult<Option<ProductListing>> {
        let listing = sqlx::query_as::<_, ProductListing>(
            "SELECT product, size, mrp_cents FROM products WHERE product = ?1 AND size = ?2",
        )
        .bind(product)
        .bind(size)
        .fetch_optional(&self.pool)
        .await?;
        Ok(listing)
    }

    /// Every listing, sorted by product name then size.
    pub async fn list(&self) -> DbResult<Vec<ProductListing>> {
        let mut listings = sqlx::query_as::<_, ProductListing>(
            "SELECT product, size, mrp_cents FROM products ORDER BY product",
        )
        .fetch_all(&self.pool)
        .await?;

        // Canonical size order is not expressible in SQL.
        listings.sort_by(|a, b| a.product.cmp(&b.product).then_with(|| a.size.cmp(&b.size)));
        Ok(listings)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn listing(size: &str, mrp: i64) -> ProductListing {
        ProductListing {
            product: "Linen Shirt".to_string(),
            size: Size::new(size),
            mrp_cents: mrp,
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        db.products().upsert(&listing("M", 99_900)).await.unwrap();
        db.products().upsert(&listing("M", 109_900)).await.unwrap();

        let stored = db.products().get("Linen Shirt", &Size::new("M")).await.unwrap().unwrap();
        assert_eq!(stored.mrp_cents, 109_900);
        assert!(db.products().get("Linen Shirt", &Size::new("L")).await.unwrap().is_none());
        assert_eq!(db.products().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_in_size_order() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for size in ["XL", "S", "32", "M"] {
            db.products().upsert(&listing(size, 100)).await.unwrap();
        }

        let sizes: Vec<String> = db
            .products()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.size.to_string())
            .collect();
        assert_eq!(sizes, vec!["S", "M", "XL", "32"]);
    }
}
