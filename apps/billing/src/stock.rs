//! # Stock Desk
//!
//! Manual ledger entries: receiving a lot, writing units off, pricing the
//! catalogue. Also the read side the counter needs for reports.
//!
//! Every write here is a single store call, so there is no partial state to
//! report.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::access::{require, AccessPolicy, Permission};
use crate::error::BillingResult;
use crate::store::{LedgerStore, MovementFilter};
use stockbook_core::inventory::{StockLedger, StockSummary};
use stockbook_core::validation::{normalize_product, validate_amount};
use stockbook_core::{
    CoreError, InventoryMovement, Money, ProductListing, Size, ValidationError,
};

/// A lot as it arrives from a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
    pub product: String,
    pub size: Size,
    pub quantity: i64,
    /// Purchase price per unit.
    pub unit_price: Money,
    pub note: Option<String>,
    pub image_ref: Option<String>,
}

impl StockEntry {
    pub fn new(product: impl Into<String>, size: Size, quantity: i64, unit_price: Money) -> Self {
        StockEntry {
            product: product.into(),
            size,
            quantity,
            unit_price,
            note: None,
            image_ref: None,
        }
    }
}

pub struct StockDesk<S, P> {
    store: S,
    policy: P,
}

impl<S: LedgerStore, P: AccessPolicy> StockDesk<S, P> {
    pub fn new(store: S, policy: P) -> Self {
        StockDesk { store, policy }
    }

    /// Records a received lot.
    pub async fn add_stock(&self, entry: StockEntry) -> BillingResult<InventoryMovement> {
        require(&self.policy, Permission::ManageStock)?;
        check_product(&entry.product, &entry.size, entry.quantity)?;
        validate_amount("unit price", entry.unit_price)?;

        let mut lot = InventoryMovement::added(
            normalize_product(&entry.product),
            entry.size,
            entry.quantity,
            entry.unit_price,
            Utc::now(),
        );
        lot.note = entry.note;
        lot.image_ref = entry.image_ref;

        self.store.insert_movements(std::slice::from_ref(&lot)).await?;

        info!(
            product = %lot.product,
            size = %lot.size,
            quantity = lot.quantity,
            "Stock received"
        );
        Ok(lot)
    }

    /// Writes off `quantity` units. Lots are left untouched; the removal
    /// counts against the available quantity.
    ///
    /// ## Errors
    /// `Core(InsufficientStock)` when `quantity` exceeds what is available.
    pub async fn remove_stock(
        &self,
        product: &str,
        size: &Size,
        quantity: i64,
        note: Option<String>,
    ) -> BillingResult<InventoryMovement> {
        require(&self.policy, Permission::ManageStock)?;
        let product = normalize_product(product);
        check_product(product, size, quantity)?;

        let movements = self
            .store
            .query_movements(&MovementFilter::Product(product.to_string()))
            .await?;
        let available = StockLedger::new(&movements).available_quantity(product, size);

        if quantity > available {
            warn!(
                product = %product,
                size = %size,
                available,
                requested = quantity,
                "Removal rejected: insufficient stock"
            );
            return Err(CoreError::insufficient(product, size.as_str(), available, quantity).into());
        }

        let mut removal = InventoryMovement::removed(product, size.clone(), quantity, Utc::now());
        removal.note = note;

        self.store.insert_movements(std::slice::from_ref(&removal)).await?;

        info!(product = %product, size = %size, quantity, "Stock removed");
        Ok(removal)
    }

    /// Sets the MRP of a product and size.
    pub async fn set_mrp(&self, product: &str, size: &Size, mrp: Money) -> BillingResult<()> {
        require(&self.policy, Permission::ManageStock)?;
        let product = normalize_product(product);
        check_product(product, size, 1)?;
        validate_amount("mrp", mrp)?;

        self.store
            .upsert_product_listing(&ProductListing {
                product: product.to_string(),
                size: size.clone(),
                mrp_cents: mrp.cents(),
            })
            .await?;
        Ok(())
    }

    /// Per-size report for one product, or for every product when `None`.
    pub async fn stock_summary(&self, product: Option<&str>) -> BillingResult<Vec<StockSummary>> {
        let filter = match product {
            Some(p) => MovementFilter::Product(normalize_product(p).to_string()),
            None => MovementFilter::All,
        };
        let movements = self.store.query_movements(&filter).await?;
        let ledger = StockLedger::new(&movements);

        let mut products: Vec<&str> = movements.iter().map(|m| m.product.as_str()).collect();
        products.sort_unstable();
        products.dedup();

        Ok(products.into_iter().flat_map(|p| ledger.summary(p)).collect())
    }

    /// Sizes of `product` with at least one unit available.
    pub async fn available_sizes(&self, product: &str) -> BillingResult<Vec<Size>> {
        let product = normalize_product(product);
        let movements = self
            .store
            .query_movements(&MovementFilter::Product(product.to_string()))
            .await?;
        Ok(StockLedger::new(&movements).available_sizes(product))
    }
}

fn check_product(product: &str, size: &Size, quantity: i64) -> Result<(), ValidationError> {
    if normalize_product(product).is_empty() {
        return Err(ValidationError::required("product"));
    }
    if size.is_empty() {
        return Err(ValidationError::required("size"));
    }
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AllowAll;
    use crate::error::BillingError;
    use stockbook_core::MovementKind;
    use stockbook_db::{Database, DbConfig};

    async fn desk() -> (Database, StockDesk<Database, AllowAll>) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        (db.clone(), StockDesk::new(db, AllowAll))
    }

    fn hoodies(qty: i64) -> StockEntry {
        StockEntry::new("Hoodie", Size::new("L"), qty, Money::from_major(900))
    }

    #[tokio::test]
    async fn test_add_stock_records_lot() {
        let (db, desk) = desk().await;

        let mut entry = hoodies(6);
        entry.note = Some("Invoice 42".to_string());
        entry.image_ref = Some("lots/42.jpg".to_string());
        let lot = desk.add_stock(entry).await.unwrap();

        let stored = db.movements().get_by_id(&lot.id).await.unwrap().unwrap();
        assert_eq!(stored.kind, MovementKind::Added);
        assert_eq!(stored.quantity, 6);
        assert_eq!(stored.unit_price(), Money::from_major(900));
        assert_eq!(stored.note.as_deref(), Some("Invoice 42"));
        assert_eq!(stored.image_ref.as_deref(), Some("lots/42.jpg"));
    }

    #[tokio::test]
    async fn test_add_stock_rejects_bad_input() {
        let (_db, desk) = desk().await;

        assert!(desk.add_stock(hoodies(0)).await.is_err());
        let mut entry = hoodies(2);
        entry.unit_price = Money::from_cents(-1);
        assert!(desk.add_stock(entry).await.is_err());
        assert!(desk
            .add_stock(StockEntry::new(" ", Size::new("L"), 1, Money::zero()))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_remove_stock_limited_to_available() {
        let (_db, desk) = desk().await;
        desk.add_stock(hoodies(3)).await.unwrap();

        desk.remove_stock("Hoodie", &Size::new("L"), 2, Some("Damaged".into()))
            .await
            .unwrap();

        let err = desk
            .remove_stock("Hoodie", &Size::new("L"), 2, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BillingError::Core(CoreError::InsufficientStock {
                available: 1,
                requested: 2,
                ..
            })
        ));

        let summary = desk.stock_summary(Some("Hoodie")).await.unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].lot_remaining, 3);
        assert_eq!(summary[0].removed, 2);
        assert_eq!(summary[0].available, 1);
    }

    #[tokio::test]
    async fn test_padded_product_name_sees_same_stock() {
        let (_db, desk) = desk().await;
        desk.add_stock(StockEntry::new(" Hoodie  ", Size::new("L"), 3, Money::from_major(900)))
            .await
            .unwrap();

        let removal = desk
            .remove_stock("Hoodie ", &Size::new("L"), 1, None)
            .await
            .unwrap();
        assert_eq!(removal.product, "Hoodie");

        assert_eq!(desk.available_sizes("  Hoodie").await.unwrap(), vec![Size::new("L")]);
        let summary = desk.stock_summary(Some(" Hoodie")).await.unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].available, 2);
    }

    #[tokio::test]
    async fn test_available_sizes_and_full_report() {
        let (_db, desk) = desk().await;
        desk.add_stock(hoodies(1)).await.unwrap();
        desk.add_stock(StockEntry::new("Hoodie", Size::new("M"), 2, Money::from_major(900)))
            .await
            .unwrap();
        desk.add_stock(StockEntry::new("Kurta", Size::new("XL"), 1, Money::from_major(500)))
            .await
            .unwrap();
        desk.remove_stock("Hoodie", &Size::new("L"), 1, None).await.unwrap();

        let sizes = desk.available_sizes("Hoodie").await.unwrap();
        assert_eq!(sizes, vec![Size::new("M")]);

        let report = desk.stock_summary(None).await.unwrap();
        let products: Vec<&str> = report.iter().map(|s| s.product.as_str()).collect();
        assert_eq!(products, vec!["Hoodie", "Hoodie", "Kurta"]);
    }

    #[tokio::test]
    async fn test_set_mrp() {
        let (db, desk) = desk().await;
        desk.set_mrp("Hoodie", &Size::new("L"), Money::from_major(1999)).await.unwrap();

        let listing = db.products().get("Hoodie", &Size::new("L")).await.unwrap().unwrap();
        assert_eq!(listing.mrp(), Money::from_major(1999));
    }

    #[tokio::test]
    async fn test_stock_desk_requires_permission() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let cashier = |p: Permission| p == Permission::PlaceOrder;
        let desk = StockDesk::new(db, cashier);

        assert!(matches!(
            desk.add_stock(hoodies(1)).await,
            Err(BillingError::PermissionDenied(Permission::ManageStock))
        ));
        assert!(matches!(
            desk.remove_stock("Hoodie", &Size::new("L"), 1, None).await,
            Err(BillingError::PermissionDenied(Permission::ManageStock))
        ));
        // Reading needs no permission
        assert!(desk.stock_summary(None).await.unwrap().is_empty());
    }
}
