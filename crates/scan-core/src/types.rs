//! # Domain Types
//!
//! Types shared by every stage of the scan pipeline.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Scan Domain Types                               │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  ConsumerMode   │   │    Consumer     │   │   ScanSource    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Manual         │   │  StockIn        │   │  Keyboard       │       │
//! │  │  Usb            │   │  ProductSearch  │   │  Camera         │       │
//! │  │  Camera         │   │  CreateBarcode  │   └─────────────────┘       │
//! │  └─────────────────┘   │  InventoryFilter│                              │
//! │                        │  PosCart        │   ┌─────────────────┐       │
//! │  ┌─────────────────┐   └─────────────────┘   │   ScanEvent     │       │
//! │  │    Product      │                         │  ─────────────  │       │
//! │  │  (catalog DTO)  │                         │  code           │       │
//! │  └─────────────────┘                         │  source         │       │
//! │                                              │  captured_at    │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::code::NormalizedCode;
use crate::error::ValidationError;

// =============================================================================
// Consumer Mode
// =============================================================================

/// How a consumer field receives its value.
///
/// ## Mode Behavior
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  MANUAL (Default)   operator types into the field; scans never land    │
/// │  USB                accepts bursts from a keyboard-wedge scanner       │
/// │  CAMERA             accepts decodes from the optical session           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ConsumerMode {
    #[default]
    Manual,
    Usb,
    Camera,
}

impl ConsumerMode {
    /// Returns true if a scan from `source` may be delivered to a consumer in
    /// this mode.
    pub fn accepts(&self, source: ScanSource) -> bool {
        match self {
            ConsumerMode::Manual => false,
            ConsumerMode::Usb => source == ScanSource::Keyboard,
            ConsumerMode::Camera => source == ScanSource::Camera,
        }
    }

    /// Returns true if this mode needs the global keyboard listener.
    pub fn needs_keyboard(&self) -> bool {
        matches!(self, ConsumerMode::Usb)
    }
}

impl fmt::Display for ConsumerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsumerMode::Manual => write!(f, "manual"),
            ConsumerMode::Usb => write!(f, "usb"),
            ConsumerMode::Camera => write!(f, "camera"),
        }
    }
}

impl FromStr for ConsumerMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Ok(ConsumerMode::Manual),
            "usb" | "scanner" => Ok(ConsumerMode::Usb),
            "camera" => Ok(ConsumerMode::Camera),
            other => Err(ValidationError::InvalidFormat {
                field: "mode".to_string(),
                reason: format!("unknown mode '{}', expected manual, usb or camera", other),
            }),
        }
    }
}

// =============================================================================
// Consumer
// =============================================================================

/// A logical surface that can receive a scanned code.
///
/// The first four live on the inventory screen; `PosCart` lives on the
/// point-of-sale screen.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS,
)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Consumer {
    /// Stock-in quantity accumulator.
    StockIn,
    /// Product search/select box.
    ProductSearch,
    /// Barcode field of the product creation form.
    CreateBarcode,
    /// Inventory monitor filter box.
    InventoryFilter,
    /// POS cart (scan-to-add).
    PosCart,
}

impl Consumer {
    /// Every consumer, in default precedence order.
    pub const ALL: [Consumer; 5] = [
        Consumer::StockIn,
        Consumer::ProductSearch,
        Consumer::CreateBarcode,
        Consumer::InventoryFilter,
        Consumer::PosCart,
    ];
}

impl fmt::Display for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Consumer::StockIn => write!(f, "stock_in"),
            Consumer::ProductSearch => write!(f, "product_search"),
            Consumer::CreateBarcode => write!(f, "create_barcode"),
            Consumer::InventoryFilter => write!(f, "inventory_filter"),
            Consumer::PosCart => write!(f, "pos_cart"),
        }
    }
}

impl FromStr for Consumer {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "stock_in" => Ok(Consumer::StockIn),
            "product_search" | "search" => Ok(Consumer::ProductSearch),
            "create_barcode" | "create" => Ok(Consumer::CreateBarcode),
            "inventory_filter" | "filter" => Ok(Consumer::InventoryFilter),
            "pos_cart" | "pos" | "cart" => Ok(Consumer::PosCart),
            other => Err(ValidationError::InvalidFormat {
                field: "consumer".to_string(),
                reason: format!("unknown consumer '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Scan Source & Event
// =============================================================================

/// Which acquisition front-end produced a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ScanSource {
    /// Keyboard-wedge burst reconstructed by the keyed capture.
    Keyboard,
    /// Optical decode from a camera session.
    Camera,
}

/// A normalized code ready for routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEvent {
    pub code: NormalizedCode,
    pub source: ScanSource,
    pub captured_at: DateTime<Utc>,
}

impl ScanEvent {
    /// Creates an event from a raw token, normalizing it.
    ///
    /// `captured_at` comes from the caller; this crate never reads the clock.
    pub fn from_raw(raw: &str, source: ScanSource, captured_at: DateTime<Utc>) -> Self {
        ScanEvent {
            code: NormalizedCode::from_raw(raw),
            source,
            captured_at,
        }
    }

    /// Event produced by a completed keyboard burst.
    pub fn keyboard(code: NormalizedCode, captured_at: DateTime<Utc>) -> Self {
        ScanEvent {
            code,
            source: ScanSource::Keyboard,
            captured_at,
        }
    }

    /// Event produced by a camera decode.
    pub fn camera(code: NormalizedCode, captured_at: DateTime<Utc>) -> Self {
        ScanEvent {
            code,
            source: ScanSource::Camera,
            captured_at,
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// Product as returned by the catalog store.
///
/// Only the fields the scan core reads are modelled; the catalog owns the
/// full record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Canonical barcode, if the product has one.
    pub barcode: Option<String>,

    /// Display name shown to the operator.
    pub name: String,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Current stock level.
    pub current_stock: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks whether a scanned code belongs to this product.
    pub fn has_barcode(&self, code: &NormalizedCode) -> bool {
        self.barcode.as_deref().is_some_and(|b| code.matches(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("manual".parse::<ConsumerMode>().unwrap(), ConsumerMode::Manual);
        assert_eq!("USB".parse::<ConsumerMode>().unwrap(), ConsumerMode::Usb);
        assert_eq!("scanner".parse::<ConsumerMode>().unwrap(), ConsumerMode::Usb);
        assert_eq!("camera".parse::<ConsumerMode>().unwrap(), ConsumerMode::Camera);
        assert!("bluetooth".parse::<ConsumerMode>().is_err());
    }

    #[test]
    fn test_mode_accepts_matching_source_only() {
        assert!(ConsumerMode::Usb.accepts(ScanSource::Keyboard));
        assert!(!ConsumerMode::Usb.accepts(ScanSource::Camera));
        assert!(ConsumerMode::Camera.accepts(ScanSource::Camera));
        assert!(!ConsumerMode::Camera.accepts(ScanSource::Keyboard));
        assert!(!ConsumerMode::Manual.accepts(ScanSource::Keyboard));
        assert!(!ConsumerMode::Manual.accepts(ScanSource::Camera));
    }

    #[test]
    fn test_consumer_round_trips_through_display() {
        for consumer in Consumer::ALL {
            assert_eq!(consumer.to_string().parse::<Consumer>().unwrap(), consumer);
        }
        assert_eq!("stock-in".parse::<Consumer>().unwrap(), Consumer::StockIn);
    }

    #[test]
    fn test_mode_wire_format() {
        let json = serde_json::to_string(&ConsumerMode::Usb).unwrap();
        assert_eq!(json, "\"usb\"");
        let json = serde_json::to_string(&Consumer::InventoryFilter).unwrap();
        assert_eq!(json, "\"inventory_filter\"");
    }

    #[test]
    fn test_product_has_barcode() {
        let mut product = Product {
            id: "p-1".to_string(),
            sku: "BEV-COL-001".to_string(),
            barcode: Some("ABC-def-1234".to_string()),
            name: "Cola 330ml".to_string(),
            price_cents: 199,
            current_stock: 10,
            is_active: true,
            updated_at: Utc::now(),
        };
        assert!(product.has_barcode(&NormalizedCode::from_raw("ABCdef1234")));
        assert!(!product.has_barcode(&NormalizedCode::from_raw("ABCdef9999")));

        product.barcode = None;
        assert!(!product.has_barcode(&NormalizedCode::from_raw("ABCdef1234")));
    }

    #[test]
    fn test_scan_event_keeps_caller_timestamp() {
        let at = DateTime::parse_from_rfc3339("2026-03-01T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let event = ScanEvent::from_raw("ABCdef1234", ScanSource::Camera, at);
        assert_eq!(event.captured_at, at);
        assert_eq!(event.code.as_str(), "ABC-def-1234");

        assert_eq!(ScanEvent::keyboard(event.code.clone(), at).captured_at, at);
        assert_eq!(ScanEvent::camera(event.code, at).source, ScanSource::Camera);
    }
}
