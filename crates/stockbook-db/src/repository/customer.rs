//! # Customer Repository
//!
//! Customers are keyed by phone. The first name recorded for a phone is kept;
//! later bills under a different name do not overwrite it.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use stockbook_core::Customer;

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn get(&self, phone: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT phone, name, created_at FROM customers WHERE phone = ?1",
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;
        Ok(customer)
    }

    /// Inserts a customer unless the phone is already known.
    ///
    /// Returns `true` when a row was written. The conflict clause makes the
    /// check and the insert one statement.
    pub async fn insert_if_absent(&self, phone: &str, name: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO customers (phone, name, created_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (phone) DO NOTHING
            "#,
        )
        .bind(phone)
        .bind(name)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() == 1;
        debug!(phone = %phone, inserted, "Customer upsert");
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_existing_name_wins() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.customers().insert_if_absent("9876543210", "Asha").await.unwrap());
        assert!(!db.customers().insert_if_absent("9876543210", "Someone Else").await.unwrap());

        let customer = db.customers().get("9876543210").await.unwrap().unwrap();
        assert_eq!(customer.name, "Asha");
        assert!(db.customers().get("9999999999").await.unwrap().is_none());
    }
}
