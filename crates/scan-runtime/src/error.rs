//! # Runtime Error Types
//!
//! Error types for the async side of the scan pipeline.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Runtime Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │     Device      │  │       Catalog           │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  PermissionDen. │  │  CatalogUnavailable     │ │
//! │  │  ConfigLoad     │  │  DeviceBusy     │  │  CatalogRejected        │ │
//! │  │  ConfigSave     │  │  DeviceInit     │  │  CartRejected           │ │
//! │  └─────────────────┘  │  DeviceLost     │  └─────────────────────────┘ │
//! │                       └─────────────────┘                               │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  Scan (wraps titan-scan-core ScanError)                         │   │
//! │  │  ProductNotFound, BarcodeMismatch, Validation, ...              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here is retried automatically. Device failures surface as a
//! "failed to start" state; the operator may press start again.

use thiserror::Error;
use titan_scan_core::ScanError;

/// Result type alias for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors raised by camera sessions, collaborator calls and configuration.
#[derive(Debug, Error)]
pub enum RuntimeError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid scan configuration.
    #[error("Invalid scan configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Device Errors
    // =========================================================================
    /// Operator (or OS) denied camera access.
    #[error("Camera permission denied")]
    PermissionDenied,

    /// Camera is held by another application.
    #[error("Camera is busy: {0}")]
    DeviceBusy(String),

    /// Decoder or camera failed to initialize.
    #[error("Failed to start camera: {0}")]
    DeviceInitFailed(String),

    /// Camera went away while a session was running.
    #[error("Camera lost: {0}")]
    DeviceLost(String),

    // =========================================================================
    // Collaborator Errors
    // =========================================================================
    /// Catalog store could not be reached.
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// Catalog refused the operation.
    #[error("Catalog rejected request: {0}")]
    CatalogRejected(String),

    /// Cart refused the product.
    #[error("Cart rejected product: {0}")]
    CartRejected(String),

    // =========================================================================
    // Scan Errors
    // =========================================================================
    /// Scan-level failure from the core.
    #[error(transparent)]
    Scan(#[from] ScanError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<titan_scan_core::ValidationError> for RuntimeError {
    fn from(err: titan_scan_core::ValidationError) -> Self {
        RuntimeError::Scan(ScanError::Validation(err))
    }
}

impl From<std::io::Error> for RuntimeError {
    fn from(err: std::io::Error) -> Self {
        RuntimeError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for RuntimeError {
    fn from(err: toml::de::Error) -> Self {
        RuntimeError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for RuntimeError {
    fn from(err: toml::ser::Error) -> Self {
        RuntimeError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl RuntimeError {
    /// Returns true if this is a camera/device failure.
    pub fn is_device_error(&self) -> bool {
        matches!(
            self,
            RuntimeError::PermissionDenied
                | RuntimeError::DeviceBusy(_)
                | RuntimeError::DeviceInitFailed(_)
                | RuntimeError::DeviceLost(_)
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            RuntimeError::InvalidConfig(_)
                | RuntimeError::ConfigLoadFailed(_)
                | RuntimeError::ConfigSaveFailed(_)
        )
    }

    /// Returns true if the error was raised before any collaborator call
    /// (shown inline next to the field).
    pub fn is_validation_error(&self) -> bool {
        matches!(self, RuntimeError::Scan(ScanError::Validation(_)))
    }

    /// Returns true if the operator can act on the message directly
    /// (scan-level problems and camera start failures).
    pub fn is_user_facing(&self) -> bool {
        matches!(self, RuntimeError::Scan(_)) || self.is_device_error()
    }
}
