//! # titan-scan-core: Pure Scan Logic for Titan POS
//!
//! Decides what a barcode scan means and who receives it. Zero I/O: the
//! camera, the catalog and the clock all live in the caller.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Titan Scan Pipeline                              │
//! │                                                                         │
//! │   Keyboard stream                       Camera feed                     │
//! │        │                                     │                          │
//! │        ▼                                     ▼                          │
//! │  ┌───────────────────┐              ┌───────────────────┐              │
//! │  │ KeyedInputCapture │              │ OpticalScanSession│ (runtime)    │
//! │  │   (capture)       │              │                   │              │
//! │  └─────────┬─────────┘              └─────────┬─────────┘              │
//! │            └──────────────┬───────────────────┘                        │
//! │                           ▼                                             │
//! │                 ┌───────────────────┐                                   │
//! │                 │  CodeNormalizer   │  (code)                           │
//! │                 └─────────┬─────────┘                                   │
//! │                           ▼                                             │
//! │                 ┌───────────────────┐                                   │
//! │                 │    ScanRouter     │  (router)                         │
//! │                 └─────────┬─────────┘                                   │
//! │     ┌──────────┬──────────┼──────────┬──────────────┐                  │
//! │     ▼          ▼          ▼          ▼              ▼                   │
//! │  StockIn    Search     Create     Filter        PosCart                 │
//! │  (stock)                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`code`] - Canonical code shape (`XXX-YYY-ZZZZ`)
//! - [`capture`] - Keystroke burst reconstruction and listener ownership
//! - [`router`] - Fixed-precedence consumer routing
//! - [`stock`] - Stock-in pending quantity accumulator
//! - [`types`] - Consumers, modes, scan events, product DTO
//! - [`validation`] - Stock-in input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use std::time::{Duration, Instant};
//! use titan_scan_core::capture::{CaptureOutcome, Key, KeyedInputCapture};
//! use titan_scan_core::router::{ConsumerModes, ScanRouter};
//! use titan_scan_core::{Consumer, ConsumerMode, ScanEvent};
//!
//! let mut capture = KeyedInputCapture::default();
//! let router = ScanRouter::default();
//! let modes = ConsumerModes::new().with(Consumer::ProductSearch, ConsumerMode::Usb);
//!
//! let t0 = Instant::now();
//! for (i, c) in "590123456".chars().enumerate() {
//!     capture.on_key(Key::Char(c), t0 + Duration::from_millis(i as u64 * 3));
//! }
//! if let CaptureOutcome::Completed(code) = capture.on_key(Key::Enter, t0 + Duration::from_millis(30)) {
//!     let delivery = router.route(&ScanEvent::keyboard(code, Utc::now()), &modes).unwrap();
//!     assert_eq!(delivery.consumer, Consumer::ProductSearch);
//!     assert_eq!(delivery.code.as_str(), "590-123-456");
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod capture;
pub mod code;
pub mod error;
pub mod router;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use capture::{CaptureOutcome, CaptureSession, Key, KeyedInputCapture};
pub use code::{normalize, NormalizedCode};
pub use error::{ScanError, ScanResult, ValidationError};
pub use router::{ConsumerModes, Delivery, ScanRouter};
pub use stock::{CommitPlan, StockAccumulation, StockAccumulator, StockInState};
pub use types::*;
