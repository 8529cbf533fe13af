//! # Stock Accumulator
//!
//! Turns routed stock-in scans into a pending quantity for the selected
//! product.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Stock-in Session                                    │
//! │                                                                         │
//! │          matched scan                    matched scan                   │
//! │   ┌──────┐ ───────────► ┌──────────────┐ ◄──────┐                      │
//! │   │ Idle │              │ Accumulating │ ───────┘                      │
//! │   └──────┘ ◄─────────── └──────────────┘                               │
//! │               commit / reset                                          │
//! │                                                                         │
//! │   Mismatched scans never change state; they only set the               │
//! │   "invalid barcode" indicator until the next scan.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Commit Resolution
//! ```text
//! pending > 0  → quantity = pending        (scans win over the manual field)
//! pending == 0 → quantity = manual field   (validated: integer, no '.')
//! ```
//!
//! Commit is two-phase because the catalog call is async and lives in the
//! runtime crate: [`StockAccumulator::prepare_commit`] validates and returns
//! a [`CommitPlan`]; after the catalog accepts it,
//! [`StockAccumulator::complete_commit`] resets the counter and the manual
//! field. A failed catalog call leaves everything as it was.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::code::NormalizedCode;
use crate::error::{ScanError, ScanResult, ValidationError};
use crate::types::Product;
use crate::validation::{
    has_decimal_point, parse_manual_quantity, validate_reason_code, validate_stock_in_quantity,
};

// =============================================================================
// State Types
// =============================================================================

/// Stock-in session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockInState {
    #[default]
    Idle,
    Accumulating,
}

/// Where the committed quantity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantitySource {
    Scanned,
    Manual,
}

/// Snapshot of the stock-in panel for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockAccumulation {
    pub state: StockInState,
    pub pending_count: i64,
    /// User-visible "invalid barcode" indicator.
    pub last_mismatch: Option<String>,
    pub selected_product_id: Option<String>,
}

/// A validated commit, ready for `addProductQuantity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitPlan {
    pub product_id: String,
    pub quantity: i64,
    pub source: QuantitySource,
    pub reason: Option<String>,
}

// =============================================================================
// StockAccumulator
// =============================================================================

/// Pending-quantity counter for the product selected for stock-in.
///
/// ## Example
/// ```rust
/// use titan_scan_core::stock::StockAccumulator;
/// use titan_scan_core::{NormalizedCode, Product};
/// # use chrono::Utc;
/// # let product = Product {
/// #     id: "p-1".into(), sku: "SKU-1".into(), barcode: Some("ABC-def-1234".into()),
/// #     name: "Cola".into(), price_cents: 199, current_stock: 0, is_active: true,
/// #     updated_at: Utc::now(),
/// # };
///
/// let mut acc = StockAccumulator::new();
/// acc.select(product);
///
/// acc.on_scan(&NormalizedCode::from_raw("ABCdef1234")).unwrap();
/// assert!(acc.on_scan(&NormalizedCode::from_raw("XYZ")).is_err());
/// assert_eq!(acc.pending_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StockAccumulator {
    selected: Option<Product>,
    pending_count: i64,
    last_mismatch: Option<ScanError>,
    manual_input: String,
}

impl StockAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a product for stock-in. A different product starts a fresh
    /// accumulation.
    pub fn select(&mut self, product: Product) {
        let same = self
            .selected
            .as_ref()
            .is_some_and(|current| current.id == product.id);
        if !same {
            debug!(product_id = %product.id, "Stock-in product selected");
            self.reset();
        }
        self.selected = Some(product);
    }

    /// Clears the selection (and the accumulation with it).
    pub fn deselect(&mut self) {
        self.selected = None;
        self.reset();
    }

    pub fn selected(&self) -> Option<&Product> {
        self.selected.as_ref()
    }

    pub fn has_selection(&self) -> bool {
        self.selected.is_some()
    }

    pub fn pending_count(&self) -> i64 {
        self.pending_count
    }

    pub fn last_mismatch(&self) -> Option<&ScanError> {
        self.last_mismatch.as_ref()
    }

    pub fn state(&self) -> StockInState {
        if self.pending_count > 0 {
            StockInState::Accumulating
        } else {
            StockInState::Idle
        }
    }

    pub fn manual_input(&self) -> &str {
        &self.manual_input
    }

    /// Mirrors the manual quantity field.
    pub fn set_manual_input(&mut self, input: impl Into<String>) {
        self.manual_input = input.into();
    }

    /// Handles a routed stock-in scan.
    ///
    /// ## Returns
    /// * `Ok(pending)` - code matched; counter incremented
    /// * `Err(BarcodeMismatch)` - code belongs to another product; counter
    ///   unchanged, indicator set
    /// * `Err(NoProductSelected)` - nothing to count against
    pub fn on_scan(&mut self, code: &NormalizedCode) -> ScanResult<i64> {
        let product = self.selected.as_ref().ok_or(ScanError::NoProductSelected)?;

        if product.has_barcode(code) {
            self.pending_count += 1;
            self.last_mismatch = None;
            debug!(product_id = %product.id, pending = self.pending_count, "Stock-in scan matched");
            return Ok(self.pending_count);
        }

        let err = ScanError::BarcodeMismatch {
            expected: product.barcode.clone(),
            scanned: code.to_string(),
        };
        warn!(product_id = %product.id, scanned = %code, "Stock-in scan mismatched");
        self.last_mismatch = Some(err.clone());
        Err(err)
    }

    /// Zeroes the counter. No catalog side effects.
    pub fn reset(&mut self) {
        self.pending_count = 0;
        self.last_mismatch = None;
    }

    /// Validates and resolves the quantity to commit.
    ///
    /// Nothing is mutated: a rejected plan leaves the panel as it was.
    pub fn prepare_commit(
        &self,
        reason: Option<&str>,
        require_reason: bool,
    ) -> ScanResult<CommitPlan> {
        let product = self.selected.as_ref().ok_or(ScanError::NoProductSelected)?;

        // A decimal in the manual field is rejected even when scans would win.
        if has_decimal_point(&self.manual_input) {
            return Err(ValidationError::MustBeWholeNumber {
                field: "quantity".to_string(),
            }
            .into());
        }

        let reason = validate_reason_code(reason, require_reason)?;

        let (quantity, source) = if self.pending_count != 0 {
            validate_stock_in_quantity(self.pending_count)?;
            (self.pending_count, QuantitySource::Scanned)
        } else {
            (parse_manual_quantity(&self.manual_input)?, QuantitySource::Manual)
        };

        Ok(CommitPlan {
            product_id: product.id.clone(),
            quantity,
            source,
            reason,
        })
    }

    /// Applies a successful commit: stores the updated product, zeroes the
    /// counter and clears the manual field.
    pub fn complete_commit(&mut self, updated: Product) {
        info!(
            product_id = %updated.id,
            committed = self.pending_count,
            stock = updated.current_stock,
            "Stock-in committed"
        );
        self.selected = Some(updated);
        self.manual_input.clear();
        self.reset();
    }

    /// Rendering snapshot.
    pub fn snapshot(&self) -> StockAccumulation {
        StockAccumulation {
            state: self.state(),
            pending_count: self.pending_count,
            last_mismatch: self.last_mismatch.as_ref().map(|e| e.to_string()),
            selected_product_id: self.selected.as_ref().map(|p| p.id.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: &str, barcode: Option<&str>) -> Product {
        Product {
            id: id.to_string(),
            sku: format!("SKU-{}", id),
            barcode: barcode.map(str::to_string),
            name: format!("Product {}", id),
            price_cents: 199,
            current_stock: 5,
            is_active: true,
            updated_at: Utc::now(),
        }
    }

    fn code(raw: &str) -> NormalizedCode {
        NormalizedCode::from_raw(raw)
    }

    #[test]
    fn test_match_increments_by_one() {
        let mut acc = StockAccumulator::new();
        acc.select(product("1", Some("ABC-def-1234")));

        assert_eq!(acc.on_scan(&code("ABCdef1234")).unwrap(), 1);
        assert_eq!(acc.on_scan(&code("ABC-def-1234")).unwrap(), 2);
        assert_eq!(acc.state(), StockInState::Accumulating);
    }

    #[test]
    fn test_mismatch_never_increments() {
        let mut acc = StockAccumulator::new();
        acc.select(product("1", Some("ABC-def-1234")));
        acc.on_scan(&code("ABCdef1234")).unwrap();

        let err = acc.on_scan(&code("XYZdef1234")).unwrap_err();
        assert!(matches!(err, ScanError::BarcodeMismatch { .. }));
        assert_eq!(acc.pending_count(), 1);
        assert!(acc.last_mismatch().is_some());
        assert_eq!(acc.state(), StockInState::Accumulating);

        acc.on_scan(&code("ABCdef1234")).unwrap();
        assert_eq!(acc.pending_count(), 2);
        assert!(acc.last_mismatch().is_none());
    }

    #[test]
    fn test_product_without_barcode_always_mismatches() {
        let mut acc = StockAccumulator::new();
        acc.select(product("1", None));

        assert!(acc.on_scan(&code("ABCdef1234")).is_err());
        assert_eq!(acc.pending_count(), 0);
        assert_eq!(acc.state(), StockInState::Idle);
    }

    #[test]
    fn test_scan_without_selection() {
        let mut acc = StockAccumulator::new();
        assert_eq!(
            acc.on_scan(&code("ABC")).unwrap_err(),
            ScanError::NoProductSelected
        );
    }

    #[test]
    fn test_commit_prefers_pending_over_manual() {
        let mut acc = StockAccumulator::new();
        acc.select(product("1", Some("ABC-def-1234")));
        for _ in 0..3 {
            acc.on_scan(&code("ABCdef1234")).unwrap();
        }
        acc.set_manual_input("7");

        let plan = acc.prepare_commit(None, false).unwrap();
        assert_eq!(plan.quantity, 3);
        assert_eq!(plan.source, QuantitySource::Scanned);
        assert_eq!(plan.product_id, "1");
    }

    #[test]
    fn test_commit_uses_manual_when_nothing_scanned() {
        let mut acc = StockAccumulator::new();
        acc.select(product("1", Some("ABC-def-1234")));
        acc.set_manual_input("12");

        let plan = acc.prepare_commit(Some("delivery"), true).unwrap();
        assert_eq!(plan.quantity, 12);
        assert_eq!(plan.source, QuantitySource::Manual);
        assert_eq!(plan.reason.as_deref(), Some("delivery"));
    }

    #[test]
    fn test_commit_has_no_upper_bound() {
        let mut acc = StockAccumulator::new();
        acc.select(product("1", Some("ABC-def-1234")));
        acc.set_manual_input("1000001");

        let plan = acc.prepare_commit(None, false).unwrap();
        assert_eq!(plan.quantity, 1_000_001);
        assert_eq!(plan.source, QuantitySource::Manual);

        let scanned = code("ABCdef1234");
        for _ in 0..1_000_001 {
            acc.on_scan(&scanned).unwrap();
        }
        let plan = acc.prepare_commit(None, false).unwrap();
        assert_eq!(plan.quantity, 1_000_001);
        assert_eq!(plan.source, QuantitySource::Scanned);
    }

    #[test]
    fn test_commit_rejections() {
        let mut acc = StockAccumulator::new();
        assert_eq!(
            acc.prepare_commit(None, false).unwrap_err(),
            ScanError::NoProductSelected
        );

        acc.select(product("1", Some("ABC-def-1234")));
        acc.set_manual_input("2.5");
        assert_eq!(
            acc.prepare_commit(None, false).unwrap_err(),
            ScanError::Validation(ValidationError::MustBeWholeNumber {
                field: "quantity".to_string()
            })
        );

        acc.on_scan(&code("ABCdef1234")).unwrap();
        assert!(acc.prepare_commit(None, false).is_err());

        acc.set_manual_input("");
        assert!(acc.prepare_commit(None, true).is_err());
        assert!(acc.prepare_commit(None, false).is_ok());

        acc.reset();
        assert!(matches!(
            acc.prepare_commit(None, false).unwrap_err(),
            ScanError::Validation(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_complete_commit_resets() {
        let mut acc = StockAccumulator::new();
        acc.select(product("1", Some("ABC-def-1234")));
        acc.on_scan(&code("ABCdef1234")).unwrap();
        acc.set_manual_input("4");

        let mut updated = product("1", Some("ABC-def-1234"));
        updated.current_stock = 6;
        acc.complete_commit(updated);

        assert_eq!(acc.pending_count(), 0);
        assert_eq!(acc.manual_input(), "");
        assert_eq!(acc.state(), StockInState::Idle);
        assert_eq!(acc.selected().map(|p| p.current_stock), Some(6));
    }

    #[test]
    fn test_reset_and_reselect() {
        let mut acc = StockAccumulator::new();
        acc.select(product("1", Some("ABC-def-1234")));
        acc.on_scan(&code("ABCdef1234")).unwrap();
        acc.on_scan(&code("ABCdef1234")).unwrap();

        // Re-selecting the same product keeps the count.
        acc.select(product("1", Some("ABC-def-1234")));
        assert_eq!(acc.pending_count(), 2);

        acc.select(product("2", Some("XYZ-000-0001")));
        assert_eq!(acc.pending_count(), 0);

        acc.select(product("1", Some("ABC-def-1234")));
        acc.on_scan(&code("ABCdef1234")).unwrap();
        acc.reset();
        assert_eq!(acc.pending_count(), 0);
        assert_eq!(acc.state(), StockInState::Idle);
    }

    #[test]
    fn test_snapshot() {
        let mut acc = StockAccumulator::new();
        acc.select(product("1", Some("ABC-def-1234")));
        let _ = acc.on_scan(&code("nope"));

        let snap = acc.snapshot();
        assert_eq!(snap.state, StockInState::Idle);
        assert_eq!(snap.pending_count, 0);
        assert_eq!(snap.selected_product_id.as_deref(), Some("1"));
        assert!(snap.last_mismatch.unwrap().contains("Invalid barcode"));
    }
}
