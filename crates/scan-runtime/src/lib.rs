//! # titan-scan-runtime: Async Scan Runtime for Titan POS
//!
//! Everything in the scan pipeline that waits on something: camera
//! sessions, catalog lookups, stock-in commits and configuration files.
//!
//! ## Runtime Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Scan Runtime                                   │
//! │                                                                         │
//! │  key presses ──► ScanPipeline::on_key ─┐                                │
//! │                                        │                                │
//! │  OpticalScanner ──► SessionHandle ─────┼──► ScanPipeline::dispatch      │
//! │   (decode task per surface)            │          │                     │
//! │                                        │          ├─► StockAccumulator  │
//! │                                        │          ├─► text fields       │
//! │                                        │          ├─► Catalog lookup    │
//! │                                        │          └─► CartSink          │
//! │                                                                         │
//! │  ScanConfig: defaults → scan.toml → TITAN_SCAN_* env                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use std::sync::Arc;
//! use titan_scan_runtime::{InMemoryCatalog, MemoryCart, ScanConfig, ScanPipeline};
//! use titan_scan_core::{Consumer, ConsumerMode};
//!
//! let config = ScanConfig::load_or_default(None);
//! let catalog = Arc::new(InMemoryCatalog::new());
//! let mut pipeline = ScanPipeline::new(&config, catalog, Arc::new(MemoryCart::new()));
//! pipeline.set_mode(Consumer::PosCart, ConsumerMode::Usb);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod config;
pub mod error;
pub mod optical;
pub mod pipeline;

// =============================================================================
// Re-exports
// =============================================================================

pub use catalog::{CartLine, CartSink, Catalog, InMemoryCatalog, MemoryCart};
pub use config::ScanConfig;
pub use error::{RuntimeError, RuntimeResult};
pub use optical::{
    CameraBackend, DecodeStream, OpticalScanner, OpticalSessionHandle, SessionStatus, VideoSurface,
};
pub use pipeline::{ScanFields, ScanOutcome, ScanPipeline};
