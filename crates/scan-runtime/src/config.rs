//! # Scan Configuration
//!
//! Configuration for burst detection, camera sessions, stock-in rules and
//! routing precedence.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TITAN_SCAN_BURST_MS=80                                             │
//! │     TITAN_SCAN_PRECEDENCE=stock_in,product_search                      │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/titan-pos/scan.toml (Linux)                              │
//! │     ~/Library/Application Support/com.titan.pos/scan.toml (macOS)      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     50ms bursts, default precedence, reason code optional              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [capture]
//! burst_threshold_ms = 50
//!
//! [optical]
//! auto_stop_after_cart_add = true
//! event_buffer = 16
//!
//! [stock_in]
//! require_reason_code = false
//!
//! [routing]
//! precedence = ["stock_in", "product_search", "create_barcode", "inventory_filter", "pos_cart"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use titan_scan_core::{Consumer, ScanRouter};

use crate::error::{RuntimeError, RuntimeResult};

// =============================================================================
// Capture Settings
// =============================================================================

/// Keyboard-wedge burst detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Inter-keystroke gap (milliseconds) above which a new burst starts.
    #[serde(default = "default_burst_threshold")]
    pub burst_threshold_ms: u64,
}

fn default_burst_threshold() -> u64 {
    50
}

impl Default for CaptureSettings {
    fn default() -> Self {
        CaptureSettings {
            burst_threshold_ms: default_burst_threshold(),
        }
    }
}

impl CaptureSettings {
    pub fn burst_threshold(&self) -> Duration {
        Duration::from_millis(self.burst_threshold_ms)
    }
}

// =============================================================================
// Optical Settings
// =============================================================================

/// Camera session behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpticalSettings {
    /// Stop the camera after a scan lands in the POS cart.
    #[serde(default = "default_true")]
    pub auto_stop_after_cart_add: bool,

    /// Decoded codes buffered between the decode loop and the pipeline.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_true() -> bool {
    true
}

fn default_event_buffer() -> usize {
    16
}

impl Default for OpticalSettings {
    fn default() -> Self {
        OpticalSettings {
            auto_stop_after_cart_add: true,
            event_buffer: default_event_buffer(),
        }
    }
}

// =============================================================================
// Stock-in Settings
// =============================================================================

/// Stock-in commit rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockInSettings {
    /// Reject commits that carry no reason code.
    #[serde(default)]
    pub require_reason_code: bool,
}

// =============================================================================
// Routing Settings
// =============================================================================

/// Consumer precedence, highest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingSettings {
    #[serde(default = "default_precedence")]
    pub precedence: Vec<Consumer>,
}

fn default_precedence() -> Vec<Consumer> {
    Consumer::ALL.to_vec()
}

impl Default for RoutingSettings {
    fn default() -> Self {
        RoutingSettings {
            precedence: default_precedence(),
        }
    }
}

// =============================================================================
// Main Scan Configuration
// =============================================================================

/// Complete scan configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub capture: CaptureSettings,

    #[serde(default)]
    pub optical: OpticalSettings,

    #[serde(default)]
    pub stock_in: StockInSettings,

    #[serde(default)]
    pub routing: RoutingSettings,
}

impl ScanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (scan.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> RuntimeResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading scan config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load scan config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> RuntimeResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| RuntimeError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RuntimeError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| RuntimeError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Scan config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> RuntimeResult<()> {
        if self.capture.burst_threshold_ms == 0 {
            return Err(RuntimeError::InvalidConfig(
                "burst_threshold_ms must be greater than 0".into(),
            ));
        }

        if self.optical.event_buffer == 0 {
            return Err(RuntimeError::InvalidConfig(
                "event_buffer must be greater than 0".into(),
            ));
        }

        if self.routing.precedence.is_empty() {
            return Err(RuntimeError::InvalidConfig(
                "routing precedence must name at least one consumer".into(),
            ));
        }

        let mut seen = Vec::with_capacity(self.routing.precedence.len());
        for consumer in &self.routing.precedence {
            if seen.contains(consumer) {
                return Err(RuntimeError::InvalidConfig(format!(
                    "consumer '{}' listed twice in routing precedence",
                    consumer
                )));
            }
            seen.push(*consumer);
        }

        Ok(())
    }

    /// Applies overrides from a variable lookup (the process environment in
    /// production).
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ms) = lookup("TITAN_SCAN_BURST_MS") {
            match ms.parse::<u64>() {
                Ok(ms) => {
                    debug!(burst_threshold_ms = ms, "Overriding burst threshold from environment");
                    self.capture.burst_threshold_ms = ms;
                }
                Err(_) => warn!(value = %ms, "Ignoring invalid TITAN_SCAN_BURST_MS"),
            }
        }

        if let Some(flag) = lookup("TITAN_SCAN_REQUIRE_REASON") {
            match parse_flag(&flag) {
                Some(v) => self.stock_in.require_reason_code = v,
                None => warn!(value = %flag, "Ignoring invalid TITAN_SCAN_REQUIRE_REASON"),
            }
        }

        if let Some(flag) = lookup("TITAN_SCAN_CAMERA_AUTO_STOP") {
            match parse_flag(&flag) {
                Some(v) => self.optical.auto_stop_after_cart_add = v,
                None => warn!(value = %flag, "Ignoring invalid TITAN_SCAN_CAMERA_AUTO_STOP"),
            }
        }

        if let Some(list) = lookup("TITAN_SCAN_PRECEDENCE") {
            let parsed: Result<Vec<Consumer>, _> = list
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(str::parse)
                .collect();
            match parsed {
                Ok(order) => {
                    debug!(?order, "Overriding routing precedence from environment");
                    self.routing.precedence = order;
                }
                Err(e) => warn!(error = %e, "Ignoring invalid TITAN_SCAN_PRECEDENCE"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "titan", "pos")
            .map(|dirs| dirs.config_dir().join("scan.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn burst_threshold(&self) -> Duration {
        self.capture.burst_threshold()
    }

    /// Builds the router for the configured precedence.
    pub fn router(&self) -> ScanRouter {
        ScanRouter::with_precedence(&self.routing.precedence)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ScanConfig::default();
        assert_eq!(config.capture.burst_threshold_ms, 50);
        assert_eq!(config.burst_threshold(), Duration::from_millis(50));
        assert!(config.optical.auto_stop_after_cart_add);
        assert!(!config.stock_in.require_reason_code);
        assert_eq!(config.routing.precedence, Consumer::ALL.to_vec());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ScanConfig::default();
        config.capture.burst_threshold_ms = 0;
        assert!(config.validate().is_err());

        let mut config = ScanConfig::default();
        config.routing.precedence.clear();
        assert!(config.validate().is_err());

        let mut config = ScanConfig::default();
        config.routing.precedence = vec![Consumer::PosCart, Consumer::PosCart];
        assert!(config.validate().is_err());

        let mut config = ScanConfig::default();
        config.optical.event_buffer = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = ScanConfig::default();
        config.apply_overrides(lookup(&[
            ("TITAN_SCAN_BURST_MS", "80"),
            ("TITAN_SCAN_REQUIRE_REASON", "yes"),
            ("TITAN_SCAN_CAMERA_AUTO_STOP", "off"),
            ("TITAN_SCAN_PRECEDENCE", "product_search, stock_in"),
        ]));

        assert_eq!(config.capture.burst_threshold_ms, 80);
        assert!(config.stock_in.require_reason_code);
        assert!(!config.optical.auto_stop_after_cart_add);
        assert_eq!(
            config.routing.precedence,
            vec![Consumer::ProductSearch, Consumer::StockIn]
        );
    }

    #[test]
    fn test_invalid_overrides_are_ignored() {
        let mut config = ScanConfig::default();
        config.apply_overrides(lookup(&[
            ("TITAN_SCAN_BURST_MS", "fast"),
            ("TITAN_SCAN_REQUIRE_REASON", "maybe"),
            ("TITAN_SCAN_PRECEDENCE", "stock_in,warehouse"),
        ]));

        assert_eq!(config.capture.burst_threshold_ms, 50);
        assert!(!config.stock_in.require_reason_code);
        assert_eq!(config.routing.precedence, Consumer::ALL.to_vec());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ScanConfig = toml::from_str(
            r#"
            [capture]
            burst_threshold_ms = 30

            [routing]
            precedence = ["inventory_filter", "product_search"]
            "#,
        )
        .unwrap();

        assert_eq!(config.capture.burst_threshold_ms, 30);
        assert_eq!(config.optical.event_buffer, 16);
        assert_eq!(config.router().rules().len(), 2);
        assert_eq!(config.router().rules()[0].consumer, Consumer::InventoryFilter);
    }

    #[test]
    fn test_toml_serialization() {
        let config = ScanConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[capture]"));
        assert!(toml_str.contains("[routing]"));
        assert!(toml_str.contains("\"stock_in\""));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join(format!("titan-scan-{}.toml", uuid::Uuid::new_v4()));
        let config = ScanConfig::load_or_default(Some(path));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("titan-scan-{}.toml", uuid::Uuid::new_v4()));
        let mut config = ScanConfig::default();
        config.capture.burst_threshold_ms = 35;
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let loaded: ScanConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.capture.burst_threshold_ms, 35);

        let _ = std::fs::remove_file(path);
    }
}
