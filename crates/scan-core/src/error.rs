//! # Error Types
//!
//! Domain-specific error types for titan-scan-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  titan-scan-core errors (this file)                                    │
//! │  ├── ScanError        - Scan outcomes the operator must see            │
//! │  └── ValidationError  - Stock-in input validation failures             │
//! │                                                                         │
//! │  titan-scan-runtime errors (separate crate)                            │
//! │  └── RuntimeError     - Device, catalog and config failures            │
//! │                                                                         │
//! │  Flow: ValidationError → ScanError → RuntimeError → Screen             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Capture noise (stray partial buffers, non-alphanumeric keys) is NOT an
//! error. It is dropped silently by the capture state machine and never
//! reaches these types.

use thiserror::Error;

// =============================================================================
// Scan Error
// =============================================================================

/// Failures a routed scan can produce.
///
/// None of these are fatal: the capture pipeline keeps running and the next
/// scan is processed normally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// Scanned or typed code matches no product in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Scanned code does not belong to the product selected for stock-in.
    ///
    /// ## User Workflow
    /// ```text
    /// Selected: "Cola 330ml" (barcode 590-000-0001)
    ///      │
    ///      ▼
    /// Scan: 590-000-0002
    ///      │
    ///      ▼
    /// BarcodeMismatch { expected: Some("590-000-0001"), scanned: "590-000-0002" }
    ///      │
    ///      ▼
    /// UI flashes: "Invalid barcode" (pending count unchanged)
    /// ```
    #[error("Invalid barcode: scanned {scanned}, expected {}", .expected.as_deref().unwrap_or("<none>"))]
    BarcodeMismatch {
        expected: Option<String>,
        scanned: String,
    },

    /// A stock-in operation was attempted with no product selected.
    #[error("No product selected for stock-in")]
    NoProductSelected,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any catalog call is made and shown inline next to the
/// offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field contains a decimal point where only whole numbers are allowed.
    #[error("{field} must be a whole number")]
    MustBeWholeNumber { field: String },

    /// Invalid format (not a number, stray characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Numeric value is below zero.
    #[error("{field} must not be negative")]
    Negative { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with ScanError.
pub type ScanResult<T> = Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_message() {
        let err = ScanError::BarcodeMismatch {
            expected: Some("ABC-def-1234".to_string()),
            scanned: "XYZ-000-0000".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid barcode: scanned XYZ-000-0000, expected ABC-def-1234"
        );

        let err = ScanError::BarcodeMismatch {
            expected: None,
            scanned: "123".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid barcode: scanned 123, expected <none>");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::MustBeWholeNumber {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be a whole number");

        let err = ValidationError::Required {
            field: "reason".to_string(),
        };
        assert_eq!(err.to_string(), "reason is required");

        let err = ValidationError::Negative {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must not be negative");
    }

    #[test]
    fn test_validation_converts_to_scan_error() {
        let validation_err = ValidationError::Required {
            field: "quantity".to_string(),
        };
        let scan_err: ScanError = validation_err.into();
        assert!(matches!(scan_err, ScanError::Validation(_)));
    }
}
