//! # Scan Pipeline
//!
//! Glues the pure core to the collaborators: keystrokes and camera decodes
//! come in, consumer actions go out.
//!
//! ## Dispatch Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Routed Consumer Actions                         │
//! │                                                                         │
//! │  Consumer          Action                           Outcome             │
//! │  ────────          ──────                           ───────             │
//! │  StockIn           StockAccumulator::on_scan        StockMatched /      │
//! │                                                     StockMismatch       │
//! │  ProductSearch     fill search box, lookup-by-code  ProductFound /      │
//! │                                                     ProductNotFound     │
//! │  CreateBarcode     fill barcode field               FieldPopulated      │
//! │  InventoryFilter   fill filter box                  FieldPopulated      │
//! │  PosCart           lookup-by-code, add to cart      AddedToCart /       │
//! │                                                     ProductNotFound     │
//! │  (nobody)          drop                             Discarded           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All state lives behind `&mut self` and is driven from one task. The only
//! suspension points are the catalog and cart calls.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use titan_scan_core::{
    CaptureOutcome, CaptureSession, Consumer, ConsumerMode, ConsumerModes, Key, NormalizedCode,
    Product, ScanError, ScanEvent, ScanRouter, StockAccumulation, StockAccumulator,
};

use crate::catalog::{CartSink, Catalog};
use crate::config::ScanConfig;
use crate::error::{RuntimeError, RuntimeResult};
use crate::optical::{OpticalScanner, OpticalSessionHandle};

// =============================================================================
// Outcomes
// =============================================================================

/// What a single scan did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// No consumer accepted the scan.
    Discarded { code: NormalizedCode },
    /// A text field now holds the code.
    FieldPopulated { consumer: Consumer, code: NormalizedCode },
    ProductFound { consumer: Consumer, product: Product },
    ProductNotFound { consumer: Consumer, code: NormalizedCode },
    StockMatched { pending: i64 },
    /// Transient "invalid barcode" indicator.
    StockMismatch {
        expected: Option<String>,
        scanned: String,
    },
    AddedToCart { product: Product },
}

impl ScanOutcome {
    /// The consumer that handled the scan, if any.
    pub fn consumer(&self) -> Option<Consumer> {
        match self {
            ScanOutcome::Discarded { .. } => None,
            ScanOutcome::FieldPopulated { consumer, .. }
            | ScanOutcome::ProductFound { consumer, .. }
            | ScanOutcome::ProductNotFound { consumer, .. } => Some(*consumer),
            ScanOutcome::StockMatched { .. } | ScanOutcome::StockMismatch { .. } => {
                Some(Consumer::StockIn)
            }
            ScanOutcome::AddedToCart { .. } => Some(Consumer::PosCart),
        }
    }
}

/// Text fields scans can land in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanFields {
    pub create_barcode: String,
    pub search_query: String,
    pub inventory_filter: String,
}

// =============================================================================
// Pipeline
// =============================================================================

/// One screen's worth of scan state.
///
/// ## Example
/// ```rust,ignore
/// let mut pipeline = ScanPipeline::new(&config, catalog, cart);
/// pipeline.set_mode(Consumer::StockIn, ConsumerMode::Usb);
/// pipeline.select_for_stock_in(product);
///
/// for (key, at) in keystrokes {
///     if let Some(outcome) = pipeline.on_key(key, at).await? {
///         println!("{:?}", outcome);
///     }
/// }
/// let updated = pipeline.commit_stock_in(Some("delivery")).await?;
/// ```
pub struct ScanPipeline {
    capture: CaptureSession,
    router: ScanRouter,
    modes: ConsumerModes,
    stock_in: StockAccumulator,
    fields: ScanFields,
    catalog: Arc<dyn Catalog>,
    cart: Arc<dyn CartSink>,
    require_reason_code: bool,
    auto_stop_after_cart_add: bool,
}

impl ScanPipeline {
    pub fn new(config: &ScanConfig, catalog: Arc<dyn Catalog>, cart: Arc<dyn CartSink>) -> Self {
        ScanPipeline {
            capture: CaptureSession::new(config.burst_threshold()),
            router: config.router(),
            modes: ConsumerModes::new(),
            stock_in: StockAccumulator::new(),
            fields: ScanFields::default(),
            catalog,
            cart,
            require_reason_code: config.stock_in.require_reason_code,
            auto_stop_after_cart_add: config.optical.auto_stop_after_cart_add,
        }
    }

    // =========================================================================
    // Modes
    // =========================================================================

    /// Switches a consumer's input mode. Returns the previous mode.
    pub fn set_mode(&mut self, consumer: Consumer, mode: ConsumerMode) -> ConsumerMode {
        let previous = self.modes.set(consumer, mode);
        self.capture.declare(consumer, mode);
        if previous != mode {
            debug!(consumer = %consumer, from = %previous, to = %mode, "Consumer mode changed");
        }
        previous
    }

    pub fn mode(&self, consumer: Consumer) -> ConsumerMode {
        self.modes.get(consumer)
    }

    /// Withdraws a consumer (screen closed): back to manual, listener
    /// released.
    pub fn release(&mut self, consumer: Consumer) {
        self.modes.set(consumer, ConsumerMode::Manual);
        self.capture.release(consumer);
    }

    /// Whether the keyboard listener is registered.
    pub fn is_listening(&self) -> bool {
        self.capture.is_listening()
    }

    pub fn capture(&self) -> &CaptureSession {
        &self.capture
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Feeds one key press. Returns an outcome when the key completed a
    /// burst.
    pub async fn on_key(&mut self, key: Key, at: Instant) -> RuntimeResult<Option<ScanOutcome>> {
        match self.capture.on_key(key, at) {
            CaptureOutcome::Completed(code) => {
                let outcome = self.dispatch(ScanEvent::keyboard(code, Utc::now())).await?;
                Ok(Some(outcome))
            }
            CaptureOutcome::Buffered | CaptureOutcome::EmptyTerminator | CaptureOutcome::Ignored => {
                Ok(None)
            }
        }
    }

    /// Routes a normalized scan and performs the winning consumer's action.
    ///
    /// Scan-level failures (not found, mismatch) are outcomes, not errors.
    /// Only collaborator failures are returned as `Err`.
    pub async fn dispatch(&mut self, event: ScanEvent) -> RuntimeResult<ScanOutcome> {
        let Some(delivery) = self.router.route(&event, &self.modes) else {
            return Ok(ScanOutcome::Discarded { code: event.code });
        };

        let code = delivery.code;
        match delivery.consumer {
            Consumer::StockIn => Ok(self.on_stock_in_scan(&code)),
            Consumer::ProductSearch => {
                self.fields.search_query = code.to_string();
                self.lookup(Consumer::ProductSearch, code).await
            }
            Consumer::CreateBarcode => {
                self.fields.create_barcode = code.to_string();
                Ok(ScanOutcome::FieldPopulated {
                    consumer: Consumer::CreateBarcode,
                    code,
                })
            }
            Consumer::InventoryFilter => {
                self.fields.inventory_filter = code.to_string();
                Ok(ScanOutcome::FieldPopulated {
                    consumer: Consumer::InventoryFilter,
                    code,
                })
            }
            Consumer::PosCart => match self.lookup(Consumer::PosCart, code).await? {
                ScanOutcome::ProductFound { product, .. } => {
                    self.cart.add_to_cart(&product).await?;
                    info!(product_id = %product.id, sku = %product.sku, "Scanned product added to cart");
                    Ok(ScanOutcome::AddedToCart { product })
                }
                other => Ok(other),
            },
        }
    }

    fn on_stock_in_scan(&mut self, code: &NormalizedCode) -> ScanOutcome {
        match self.stock_in.on_scan(code) {
            Ok(pending) => ScanOutcome::StockMatched { pending },
            Err(ScanError::BarcodeMismatch { expected, scanned }) => {
                ScanOutcome::StockMismatch { expected, scanned }
            }
            // The router only delivers here with a product selected.
            Err(_) => ScanOutcome::Discarded { code: code.clone() },
        }
    }

    async fn lookup(&self, consumer: Consumer, code: NormalizedCode) -> RuntimeResult<ScanOutcome> {
        match self.catalog.lookup_product_by_code(&code).await? {
            Some(product) => Ok(ScanOutcome::ProductFound { consumer, product }),
            None => {
                debug!(consumer = %consumer, code = %code, "Product not found");
                Ok(ScanOutcome::ProductNotFound { consumer, code })
            }
        }
    }

    /// Feeds camera scans into the pipeline until the session ends.
    ///
    /// When the POS cart accepts a camera scan and auto-stop is configured,
    /// the session is stopped and the loop returns. Collaborator failures are
    /// logged and scanning continues.
    pub async fn run_camera(
        &mut self,
        scanner: &mut OpticalScanner,
        handle: &mut OpticalSessionHandle,
    ) -> Vec<ScanOutcome> {
        let mut outcomes = Vec::new();

        while let Some(event) = handle.next_scan().await {
            match self.dispatch(event).await {
                Ok(outcome) => {
                    let stop = self.auto_stop_after_cart_add
                        && matches!(outcome, ScanOutcome::AddedToCart { .. });
                    outcomes.push(outcome);
                    if stop {
                        debug!(session_id = %handle.id(), "Stopping camera after cart add");
                        scanner.stop(handle).await;
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "Camera scan could not be handled"),
            }
        }

        outcomes
    }

    // =========================================================================
    // Stock-in
    // =========================================================================

    /// Selects the product being received. A different product restarts the
    /// count.
    pub fn select_for_stock_in(&mut self, product: Product) {
        self.stock_in.select(product);
        self.modes.set_stock_in_selected(true);
    }

    /// Looks up a product by code and selects it for stock-in.
    pub async fn select_for_stock_in_by_code(&mut self, raw: &str) -> RuntimeResult<Product> {
        let code = NormalizedCode::from_raw(raw);
        let product = self
            .catalog
            .lookup_product_by_code(&code)
            .await?
            .ok_or_else(|| ScanError::ProductNotFound(code.to_string()))?;
        self.select_for_stock_in(product.clone());
        Ok(product)
    }

    pub fn clear_stock_in_selection(&mut self) {
        self.stock_in.deselect();
        self.modes.set_stock_in_selected(false);
    }

    /// Mirrors the manual quantity field.
    pub fn set_manual_quantity(&mut self, input: impl Into<String>) {
        self.stock_in.set_manual_input(input);
    }

    /// Commits the pending (or manual) quantity to the catalog.
    ///
    /// Validation runs first; a rejected commit makes no catalog call and
    /// leaves the counter untouched. So does a failed catalog call.
    pub async fn commit_stock_in(&mut self, reason: Option<&str>) -> RuntimeResult<Product> {
        let plan = self
            .stock_in
            .prepare_commit(reason, self.require_reason_code)
            .map_err(RuntimeError::from)?;

        let updated = self
            .catalog
            .add_product_quantity(&plan.product_id, plan.quantity)
            .await?;

        info!(
            product_id = %plan.product_id,
            quantity = plan.quantity,
            source = ?plan.source,
            reason = plan.reason.as_deref().unwrap_or("-"),
            "Stock-in commit applied"
        );
        self.stock_in.complete_commit(updated.clone());
        Ok(updated)
    }

    /// Zeroes the pending count. No catalog call.
    pub fn reset_stock_in(&mut self) {
        self.stock_in.reset();
    }

    pub fn stock_in(&self) -> StockAccumulation {
        self.stock_in.snapshot()
    }

    pub fn selected_product(&self) -> Option<&Product> {
        self.stock_in.selected()
    }

    pub fn fields(&self) -> &ScanFields {
        &self.fields
    }
}
