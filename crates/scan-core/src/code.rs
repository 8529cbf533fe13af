//! # Code Normalization
//!
//! Turns a raw captured token into the canonical product-code shape used for
//! storage and comparison.
//!
//! ## Canonical Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      normalize(token)                                   │
//! │                                                                         │
//! │  Token is 9+ chars AND only [0-9A-Za-z]?                               │
//! │       │                                                                 │
//! │       ├── YES: insert '-' after the 3rd and 6th characters             │
//! │       │        "ABCdef1234"  →  "ABC-def-1234"                         │
//! │       │                                                                 │
//! │       └── NO:  return token unchanged                                  │
//! │                "ABC"          →  "ABC"                                 │
//! │                "ABC-def-1234" →  "ABC-def-1234"  (idempotent)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Normalization is applied only to captured scans (keyboard bursts and
//! camera decodes). Text typed into a field in manual mode is stored as typed.
//!
//! ## Usage
//! ```rust
//! use titan_scan_core::code::{normalize, NormalizedCode};
//!
//! assert_eq!(normalize("ABCdef1234"), "ABC-def-1234");
//! assert_eq!(normalize("ABC-def-1234"), "ABC-def-1234");
//!
//! let code = NormalizedCode::from_raw("590123456789");
//! assert_eq!(code.as_str(), "590-123-456789");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// Minimum token length that gets segmented.
pub const SEGMENT_MIN_LEN: usize = 9;

/// Separator inserted between segments.
pub const SEGMENT_SEPARATOR: char = '-';

/// Returns true for the characters a keyboard-wedge scanner payload is made of.
#[inline]
pub fn is_code_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

/// Normalizes a raw token into its canonical form.
///
/// Pure and total: never fails, never allocates more than one string.
pub fn normalize(token: &str) -> String {
    // All chars are ASCII past this check, so byte offsets are char offsets.
    if token.len() < SEGMENT_MIN_LEN || !token.chars().all(is_code_char) {
        return token.to_string();
    }

    let mut out = String::with_capacity(token.len() + 2);
    out.push_str(&token[..3]);
    out.push(SEGMENT_SEPARATOR);
    out.push_str(&token[3..6]);
    out.push(SEGMENT_SEPARATOR);
    out.push_str(&token[6..]);
    out
}

// =============================================================================
// NormalizedCode
// =============================================================================

/// A product code that has been through [`normalize`].
///
/// Every constructor, deserialization included, runs [`normalize`], so
/// holding one proves the normalization step ran before routing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(from = "String")]
#[ts(export)]
pub struct NormalizedCode(String);

impl NormalizedCode {
    /// Normalizes a raw token.
    pub fn from_raw(token: &str) -> Self {
        NormalizedCode(normalize(token))
    }

    /// Returns the canonical code.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks whether this code equals a stored product barcode.
    ///
    /// Comparison is exact: stored barcodes are expected to be canonical
    /// already.
    pub fn matches(&self, barcode: &str) -> bool {
        self.0 == barcode
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NormalizedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NormalizedCode {
    fn from(raw: String) -> Self {
        NormalizedCode(normalize(&raw))
    }
}

impl AsRef<str> for NormalizedCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_long_alphanumeric_tokens() {
        assert_eq!(normalize("ABCdef1234"), "ABC-def-1234");
        assert_eq!(normalize("123456789"), "123-456-789");
        assert_eq!(normalize("5901234123457"), "590-123-4123457");
    }

    #[test]
    fn test_short_tokens_pass_through() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("C"), "C");
        assert_eq!(normalize("ABCDEFGH"), "ABCDEFGH");
    }

    #[test]
    fn test_non_alphanumeric_tokens_pass_through() {
        assert_eq!(normalize("ABC-def-1234"), "ABC-def-1234");
        assert_eq!(normalize("ABC def 1234"), "ABC def 1234");
        assert_eq!(normalize("ÄBCdef12345"), "ÄBCdef12345");
        assert_eq!(normalize("ABCdef1234\n"), "ABCdef1234\n");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "",
            "A",
            "ABCdef1234",
            "ABC-def-1234",
            "123456789",
            "12345678",
            "A-B",
            "ÄÖÜäöüßxyz",
            "0000000000000000000000",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input {:?}", input);
        }
    }

    #[test]
    fn test_shape_for_every_length() {
        let source = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
        for len in SEGMENT_MIN_LEN..=source.len() {
            let s = &source[..len];
            let expected = format!("{}-{}-{}", &s[0..3], &s[3..6], &s[6..]);
            assert_eq!(normalize(s), expected);
        }
    }

    #[test]
    fn test_normalized_code_matches_barcode() {
        let code = NormalizedCode::from_raw("ABCdef1234");
        assert!(code.matches("ABC-def-1234"));
        assert!(!code.matches("ABCdef1234"));
        assert_eq!(code.to_string(), "ABC-def-1234");
    }

    #[test]
    fn test_deserialize_normalizes() {
        let code: NormalizedCode = serde_json::from_str("\"ABCdef1234\"").unwrap();
        assert_eq!(code.as_str(), "ABC-def-1234");

        let canonical: NormalizedCode = serde_json::from_str("\"ABC-def-1234\"").unwrap();
        assert_eq!(canonical, code);
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"ABC-def-1234\"");
    }
}
