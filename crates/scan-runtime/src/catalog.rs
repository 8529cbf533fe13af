//! # Catalog Collaborators
//!
//! The pipeline never owns product data. It talks to two collaborators:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Collaborator Boundaries                            │
//! │                                                                         │
//! │  ScanPipeline                                                           │
//! │      │                                                                  │
//! │      ├── Catalog::lookup_product_by_code(code) ──► Some(Product) / None │
//! │      │     (product search, POS cart-add)                               │
//! │      │                                                                  │
//! │      ├── Catalog::add_product_quantity(id, qty) ──► updated Product     │
//! │      │     (stock-in commit, qty ≥ 0)                                   │
//! │      │                                                                  │
//! │      └── CartSink::add_to_cart(product)                                 │
//! │            (POS screen)                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`InMemoryCatalog`] and [`MemoryCart`] back the console harness and the
//! tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use titan_scan_core::{NormalizedCode, Product, ScanError};

use crate::error::{RuntimeError, RuntimeResult};

// =============================================================================
// Traits
// =============================================================================

/// Product store used by lookups and stock-in commits.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Finds the active product carrying `code` as its barcode.
    async fn lookup_product_by_code(&self, code: &NormalizedCode) -> RuntimeResult<Option<Product>>;

    /// Adds `quantity` (≥ 0) to a product's stock and returns the updated
    /// record.
    async fn add_product_quantity(&self, product_id: &str, quantity: i64) -> RuntimeResult<Product>;
}

/// Destination for POS cart-adds.
#[async_trait]
pub trait CartSink: Send + Sync {
    async fn add_to_cart(&self, product: &Product) -> RuntimeResult<()>;
}

// =============================================================================
// In-Memory Catalog
// =============================================================================

/// HashMap-backed catalog keyed by product id.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<String, Product>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from existing products.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products.into_iter().map(|p| (p.id.clone(), p)).collect();
        InMemoryCatalog {
            products: RwLock::new(products),
        }
    }

    /// Inserts (or replaces) a product.
    pub async fn insert(&self, product: Product) {
        self.products.write().await.insert(product.id.clone(), product);
    }

    /// Creates an active product with a fresh UUID and zero stock.
    pub async fn seed(&self, sku: &str, name: &str, barcode: Option<&str>, price_cents: i64) -> Product {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            sku: sku.to_string(),
            barcode: barcode.map(str::to_string),
            name: name.to_string(),
            price_cents,
            current_stock: 0,
            is_active: true,
            updated_at: Utc::now(),
        };
        self.insert(product.clone()).await;
        product
    }

    pub async fn get(&self, product_id: &str) -> Option<Product> {
        self.products.read().await.get(product_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.products.read().await.is_empty()
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn lookup_product_by_code(&self, code: &NormalizedCode) -> RuntimeResult<Option<Product>> {
        let products = self.products.read().await;
        let found = products
            .values()
            .find(|p| p.is_active && p.has_barcode(code))
            .cloned();

        debug!(code = %code, found = found.is_some(), "Catalog lookup by code");
        Ok(found)
    }

    async fn add_product_quantity(&self, product_id: &str, quantity: i64) -> RuntimeResult<Product> {
        if quantity < 0 {
            return Err(RuntimeError::CatalogRejected(format!(
                "quantity must be non-negative, got {}",
                quantity
            )));
        }

        let mut products = self.products.write().await;
        let product = products
            .get_mut(product_id)
            .ok_or_else(|| ScanError::ProductNotFound(product_id.to_string()))?;

        product.current_stock += quantity;
        product.updated_at = Utc::now();

        info!(
            product_id = %product.id,
            added = quantity,
            stock = product.current_stock,
            "Stock quantity added"
        );
        Ok(product.clone())
    }
}

// =============================================================================
// In-Memory Cart
// =============================================================================

/// A line in the POS cart. Product fields are frozen at add time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    fn from_product(product: &Product) -> Self {
        CartLine {
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            quantity: 1,
            added_at: Utc::now(),
        }
    }

    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }
}

/// Cart that collects scanned products. Scanning the same product again
/// bumps its quantity.
#[derive(Debug, Default)]
pub struct MemoryCart {
    lines: Mutex<Vec<CartLine>>,
}

impl MemoryCart {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lines(&self) -> Vec<CartLine> {
        self.lines.lock().await.clone()
    }

    pub async fn total_cents(&self) -> i64 {
        self.lines.lock().await.iter().map(CartLine::line_total_cents).sum()
    }
}

#[async_trait]
impl CartSink for MemoryCart {
    async fn add_to_cart(&self, product: &Product) -> RuntimeResult<()> {
        if !product.is_active {
            return Err(RuntimeError::CartRejected(format!(
                "product {} is inactive",
                product.sku
            )));
        }

        let mut lines = self.lines.lock().await;
        match lines.iter_mut().find(|l| l.product_id == product.id) {
            Some(line) => line.quantity += 1,
            None => lines.push(CartLine::from_product(product)),
        }

        debug!(product_id = %product.id, lines = lines.len(), "Product added to cart");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_by_normalized_code() {
        let catalog = InMemoryCatalog::new();
        let cola = catalog.seed("COLA-330", "Cola 330ml", Some("ABC-def-1234"), 199).await;

        let found = catalog
            .lookup_product_by_code(&NormalizedCode::from_raw("ABCdef1234"))
            .await
            .unwrap();
        assert_eq!(found.map(|p| p.id), Some(cola.id));

        let missing = catalog
            .lookup_product_by_code(&NormalizedCode::from_raw("ZZZ"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_lookup_skips_inactive() {
        let catalog = InMemoryCatalog::new();
        let mut product = catalog.seed("OLD-1", "Retired", Some("OLD-old-0001"), 100).await;
        product.is_active = false;
        catalog.insert(product).await;

        let found = catalog
            .lookup_product_by_code(&NormalizedCode::from_raw("OLD-old-0001"))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_add_product_quantity() {
        let catalog = InMemoryCatalog::new();
        let product = catalog.seed("SKU-1", "Widget", None, 500).await;

        let updated = catalog.add_product_quantity(&product.id, 3).await.unwrap();
        assert_eq!(updated.current_stock, 3);

        let updated = catalog.add_product_quantity(&product.id, 0).await.unwrap();
        assert_eq!(updated.current_stock, 3);
        assert_eq!(catalog.get(&product.id).await.unwrap().current_stock, 3);
    }

    #[tokio::test]
    async fn test_add_product_quantity_errors() {
        let catalog = InMemoryCatalog::new();
        let product = catalog.seed("SKU-1", "Widget", None, 500).await;

        let err = catalog.add_product_quantity(&product.id, -1).await.unwrap_err();
        assert!(matches!(err, RuntimeError::CatalogRejected(_)));

        let err = catalog.add_product_quantity("nope", 1).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Scan(ScanError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn test_cart_merges_same_product() {
        let catalog = InMemoryCatalog::new();
        let cola = catalog.seed("COLA-330", "Cola", Some("ABC-def-1234"), 199).await;
        let chips = catalog.seed("CHIPS-1", "Chips", Some("CHP-000-0001"), 250).await;

        let cart = MemoryCart::new();
        cart.add_to_cart(&cola).await.unwrap();
        cart.add_to_cart(&chips).await.unwrap();
        cart.add_to_cart(&cola).await.unwrap();

        let lines = cart.lines().await;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(cart.total_cents().await, 199 * 2 + 250);
    }

    #[tokio::test]
    async fn test_cart_rejects_inactive() {
        let catalog = InMemoryCatalog::new();
        let mut product = catalog.seed("X", "X", None, 1).await;
        product.is_active = false;

        let cart = MemoryCart::new();
        assert!(matches!(
            cart.add_to_cart(&product).await,
            Err(RuntimeError::CartRejected(_))
        ));
        assert!(cart.lines().await.is_empty());
    }
}
