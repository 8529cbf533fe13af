//! # Scan Router
//!
//! Delivers each normalized code to exactly one consumer.
//!
//! ## Precedence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    route(event, modes)                                  │
//! │                                                                         │
//! │  Rules are evaluated top to bottom; first match wins.                   │
//! │                                                                         │
//! │   1. StockIn          mode accepts source AND product selected         │
//! │   2. ProductSearch    mode accepts source                               │
//! │   3. CreateBarcode    mode accepts source                               │
//! │   4. InventoryFilter  mode accepts source                               │
//! │   5. PosCart          mode accepts source                               │
//! │                                                                         │
//! │   No match → code discarded silently                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The narrowest context wins: an operator who selected a product for
//! stock-in is counting units, even if the search box is also in `usb` mode.
//! The order is data (`Vec<RouteRule>`), so reordering is a configuration
//! change.

use std::collections::HashMap;
use tracing::debug;

use crate::code::NormalizedCode;
use crate::types::{Consumer, ConsumerMode, ScanEvent};

// =============================================================================
// Consumer Modes
// =============================================================================

/// The mode of every consumer on the current screen, plus the stock-in
/// selection flag the router needs.
#[derive(Debug, Clone, Default)]
pub struct ConsumerModes {
    modes: HashMap<Consumer, ConsumerMode>,
    stock_in_selected: bool,
}

impl ConsumerModes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a consumer's mode, returning the previous one.
    pub fn set(&mut self, consumer: Consumer, mode: ConsumerMode) -> ConsumerMode {
        self.modes.insert(consumer, mode).unwrap_or_default()
    }

    /// Returns a consumer's mode (`Manual` when never set).
    pub fn get(&self, consumer: Consumer) -> ConsumerMode {
        self.modes.get(&consumer).copied().unwrap_or_default()
    }

    pub fn set_stock_in_selected(&mut self, selected: bool) {
        self.stock_in_selected = selected;
    }

    pub fn stock_in_selected(&self) -> bool {
        self.stock_in_selected
    }

    /// Builder-style helper.
    pub fn with(mut self, consumer: Consumer, mode: ConsumerMode) -> Self {
        self.set(consumer, mode);
        self
    }
}

// =============================================================================
// Route Rules
// =============================================================================

/// One entry of the precedence list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRule {
    pub consumer: Consumer,
    /// Rule only applies while a stock-in product is selected.
    pub requires_selection: bool,
}

impl RouteRule {
    /// The rule for a consumer with its built-in guard.
    pub fn for_consumer(consumer: Consumer) -> Self {
        RouteRule {
            consumer,
            requires_selection: consumer == Consumer::StockIn,
        }
    }

    fn admits(&self, event: &ScanEvent, modes: &ConsumerModes) -> bool {
        if self.requires_selection && !modes.stock_in_selected() {
            return false;
        }
        modes.get(self.consumer).accepts(event.source)
    }
}

/// A routing decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub consumer: Consumer,
    pub code: NormalizedCode,
}

// =============================================================================
// Router
// =============================================================================

/// Evaluates the precedence list once per scan.
///
/// ## Example
/// ```rust
/// use titan_scan_core::router::{ConsumerModes, ScanRouter};
/// use chrono::Utc;
/// use titan_scan_core::{Consumer, ConsumerMode, NormalizedCode, ScanEvent};
///
/// let router = ScanRouter::default();
/// let mut modes = ConsumerModes::new()
///     .with(Consumer::StockIn, ConsumerMode::Usb)
///     .with(Consumer::ProductSearch, ConsumerMode::Usb);
/// modes.set_stock_in_selected(true);
///
/// let event = ScanEvent::keyboard(NormalizedCode::from_raw("ABCdef1234"), Utc::now());
/// let delivery = router.route(&event, &modes).unwrap();
/// assert_eq!(delivery.consumer, Consumer::StockIn);
/// ```
#[derive(Debug, Clone)]
pub struct ScanRouter {
    rules: Vec<RouteRule>,
}

impl Default for ScanRouter {
    fn default() -> Self {
        Self::with_precedence(&Consumer::ALL)
    }
}

impl ScanRouter {
    /// Builds a router from a precedence order, highest first.
    ///
    /// Duplicates are dropped (first occurrence kept).
    pub fn with_precedence(order: &[Consumer]) -> Self {
        let mut rules: Vec<RouteRule> = Vec::with_capacity(order.len());
        for &consumer in order {
            if !rules.iter().any(|r| r.consumer == consumer) {
                rules.push(RouteRule::for_consumer(consumer));
            }
        }
        ScanRouter { rules }
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// Picks the consumer for a scan, or `None` to discard it.
    pub fn route(&self, event: &ScanEvent, modes: &ConsumerModes) -> Option<Delivery> {
        let winner = self.rules.iter().find(|rule| rule.admits(event, modes));

        match winner {
            Some(rule) => {
                debug!(code = %event.code, source = ?event.source, consumer = %rule.consumer, "Scan routed");
                Some(Delivery {
                    consumer: rule.consumer,
                    code: event.code.clone(),
                })
            }
            None => {
                debug!(code = %event.code, source = ?event.source, "No consumer accepts scan, discarding");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn usb_scan(raw: &str) -> ScanEvent {
        ScanEvent::keyboard(NormalizedCode::from_raw(raw), Utc::now())
    }

    #[test]
    fn test_stock_in_beats_search_when_selected() {
        let router = ScanRouter::default();
        let mut modes = ConsumerModes::new()
            .with(Consumer::StockIn, ConsumerMode::Usb)
            .with(Consumer::ProductSearch, ConsumerMode::Usb);
        modes.set_stock_in_selected(true);

        let delivery = router.route(&usb_scan("ABCdef1234"), &modes).unwrap();
        assert_eq!(delivery.consumer, Consumer::StockIn);
        assert_eq!(delivery.code.as_str(), "ABC-def-1234");
    }

    #[test]
    fn test_stock_in_skipped_without_selection() {
        let router = ScanRouter::default();
        let modes = ConsumerModes::new()
            .with(Consumer::StockIn, ConsumerMode::Usb)
            .with(Consumer::ProductSearch, ConsumerMode::Usb);

        let delivery = router.route(&usb_scan("ABC"), &modes).unwrap();
        assert_eq!(delivery.consumer, Consumer::ProductSearch);
    }

    #[test]
    fn test_full_precedence_chain() {
        let router = ScanRouter::default();
        let mut modes = ConsumerModes::new();
        for consumer in Consumer::ALL {
            modes.set(consumer, ConsumerMode::Usb);
        }
        modes.set_stock_in_selected(true);

        let mut order = Vec::new();
        for _ in Consumer::ALL {
            let delivery = router.route(&usb_scan("X"), &modes).unwrap();
            order.push(delivery.consumer);
            modes.set(delivery.consumer, ConsumerMode::Manual);
        }
        assert_eq!(order, Consumer::ALL.to_vec());
        assert!(router.route(&usb_scan("X"), &modes).is_none());
    }

    #[test]
    fn test_source_must_match_mode() {
        let router = ScanRouter::default();
        let modes = ConsumerModes::new()
            .with(Consumer::ProductSearch, ConsumerMode::Camera)
            .with(Consumer::InventoryFilter, ConsumerMode::Usb);

        let keyboard = router.route(&usb_scan("X"), &modes).unwrap();
        assert_eq!(keyboard.consumer, Consumer::InventoryFilter);

        let camera = ScanEvent::camera(NormalizedCode::from_raw("X"), Utc::now());
        let delivery = router.route(&camera, &modes).unwrap();
        assert_eq!(delivery.consumer, Consumer::ProductSearch);
    }

    #[test]
    fn test_no_active_consumer_discards() {
        let router = ScanRouter::default();
        let modes = ConsumerModes::new().with(Consumer::ProductSearch, ConsumerMode::Manual);
        assert!(router.route(&usb_scan("ABC"), &modes).is_none());
    }

    #[test]
    fn test_custom_precedence_is_data() {
        let router = ScanRouter::with_precedence(&[
            Consumer::InventoryFilter,
            Consumer::ProductSearch,
            Consumer::InventoryFilter,
        ]);
        assert_eq!(router.rules().len(), 2);

        let modes = ConsumerModes::new()
            .with(Consumer::ProductSearch, ConsumerMode::Usb)
            .with(Consumer::InventoryFilter, ConsumerMode::Usb)
            .with(Consumer::CreateBarcode, ConsumerMode::Usb);

        let delivery = router.route(&usb_scan("X"), &modes).unwrap();
        assert_eq!(delivery.consumer, Consumer::InventoryFilter);
    }
}
