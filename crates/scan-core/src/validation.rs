//! # Validation Module
//!
//! Input validation for the stock-in panel.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Stock-in Commit Validation                         │
//! │                                                                         │
//! │  Manual field "12"   ──► parse_manual_quantity ──► Ok(12)              │
//! │  Manual field "1.5"  ──► parse_manual_quantity ──► MustBeWholeNumber   │
//! │  Manual field "-3"   ──► parse_manual_quantity ──► Negative            │
//! │  Manual field "abc"  ──► parse_manual_quantity ──► InvalidFormat       │
//! │  Manual field ""     ──► parse_manual_quantity ──► Required            │
//! │                                                                         │
//! │  Everything here runs BEFORE the catalog is called.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted reason code.
pub const MAX_REASON_LEN: usize = 64;

/// Returns true if the manual field contains a decimal point.
pub fn has_decimal_point(input: &str) -> bool {
    input.contains('.')
}

/// Parses the manual quantity field.
///
/// ## Rules
/// - Must not be empty
/// - Must not contain a decimal point
/// - Must be a non-negative integer (values past `i64::MAX` are
///   `InvalidFormat`)
///
/// ## Example
/// ```rust
/// use titan_scan_core::validation::parse_manual_quantity;
///
/// assert_eq!(parse_manual_quantity(" 7 ").unwrap(), 7);
/// assert!(parse_manual_quantity("7.0").is_err());
/// assert!(parse_manual_quantity("-1").is_err());
/// ```
pub fn parse_manual_quantity(input: &str) -> ValidationResult<i64> {
    let input = input.trim();

    if input.is_empty() {
        return Err(ValidationError::Required {
            field: "quantity".to_string(),
        });
    }

    if has_decimal_point(input) {
        return Err(ValidationError::MustBeWholeNumber {
            field: "quantity".to_string(),
        });
    }

    let qty: i64 = input.parse().map_err(|_| ValidationError::InvalidFormat {
        field: "quantity".to_string(),
        reason: "must be a number".to_string(),
    })?;

    validate_stock_in_quantity(qty)?;
    Ok(qty)
}

/// Validates a resolved stock-in quantity. There is no upper bound.
pub fn validate_stock_in_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::Negative {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates the reason code attached to a stock-in commit.
///
/// ## Returns
/// The trimmed reason, or `None` when absent and not required.
pub fn validate_reason_code(reason: Option<&str>, required: bool) -> ValidationResult<Option<String>> {
    let reason = reason.map(str::trim).filter(|r| !r.is_empty());

    match reason {
        None if required => Err(ValidationError::Required {
            field: "reason".to_string(),
        }),
        None => Ok(None),
        Some(r) if r.len() > MAX_REASON_LEN => Err(ValidationError::InvalidFormat {
            field: "reason".to_string(),
            reason: format!("must be at most {} characters", MAX_REASON_LEN),
        }),
        Some(r) => Ok(Some(r.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manual_quantity() {
        assert_eq!(parse_manual_quantity("7").unwrap(), 7);
        assert_eq!(parse_manual_quantity("0").unwrap(), 0);
        assert_eq!(parse_manual_quantity(" 42 ").unwrap(), 42);

        assert!(matches!(
            parse_manual_quantity(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            parse_manual_quantity("2.5"),
            Err(ValidationError::MustBeWholeNumber { .. })
        ));
        assert!(matches!(
            parse_manual_quantity("3."),
            Err(ValidationError::MustBeWholeNumber { .. })
        ));
        assert!(matches!(
            parse_manual_quantity("abc"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            parse_manual_quantity("-3"),
            Err(ValidationError::Negative { .. })
        ));
        assert!(matches!(
            parse_manual_quantity("99999999999999999999"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_large_quantities_are_accepted() {
        assert_eq!(parse_manual_quantity("1000000").unwrap(), 1_000_000);
        assert_eq!(parse_manual_quantity("1000001").unwrap(), 1_000_001);
        assert_eq!(
            parse_manual_quantity(&i64::MAX.to_string()).unwrap(),
            i64::MAX
        );
        assert!(validate_stock_in_quantity(1_000_001).is_ok());
        assert!(validate_stock_in_quantity(0).is_ok());
        assert!(validate_stock_in_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_reason_code() {
        assert_eq!(validate_reason_code(None, false).unwrap(), None);
        assert_eq!(validate_reason_code(Some("  "), false).unwrap(), None);
        assert_eq!(
            validate_reason_code(Some(" delivery "), true).unwrap(),
            Some("delivery".to_string())
        );
        assert!(validate_reason_code(None, true).is_err());
        assert!(validate_reason_code(Some(""), true).is_err());
        assert!(validate_reason_code(Some(&"x".repeat(65)), false).is_err());
    }
}
