//! Audit configuration
//!
//! Everything that used to live as constants or global state in earlier
//! incarnations of the auditor is an explicit config object here, loaded
//! fail-soft from an optional JSON file next to the ledgers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// What to do when the cost-conservation check fails beyond epsilon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreachPolicy {
    /// Log the drift and publish the report anyway.
    Log,
    /// Log the drift and withhold the report.
    Block,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Fraction of the listed price actually received after marketplace
    /// commission.
    #[serde(with = "rust_decimal::serde::float")]
    pub payout_rate: Decimal,
    /// Tolerance for the cost-conservation invariant, in currency units.
    #[serde(with = "rust_decimal::serde::float")]
    pub conservation_epsilon: Decimal,
    pub on_conservation_breach: BreachPolicy,
}

impl Default for AuditConfig {
    fn default() -> Self {
        AuditConfig {
            payout_rate: Decimal::new(97, 2),
            conservation_epsilon: Decimal::new(1, 2),
            on_conservation_breach: BreachPolicy::Log,
        }
    }
}

impl AuditConfig {
    /// Load from disk; any problem falls back to defaults.
    pub fn load(path: &Path) -> AuditConfig {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No audit config, using defaults");
                return AuditConfig::default();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Malformed audit config, using defaults");
                AuditConfig::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let config = AuditConfig::default();
        assert_eq!(config.payout_rate, dec!(0.97));
        assert_eq!(config.conservation_epsilon, dec!(0.01));
        assert_eq!(config.on_conservation_breach, BreachPolicy::Log);
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit_config.json");
        std::fs::write(&path, r#"{"payout_rate": 0.95, "on_conservation_breach": "block"}"#).unwrap();

        let config = AuditConfig::load(&path);
        assert_eq!(config.payout_rate, dec!(0.95));
        assert_eq!(config.on_conservation_breach, BreachPolicy::Block);
        assert_eq!(config.conservation_epsilon, dec!(0.01));
    }

    #[test]
    fn test_load_failures_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            AuditConfig::load(&dir.path().join("missing.json")).payout_rate,
            dec!(0.97)
        );

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "oops").unwrap();
        assert_eq!(AuditConfig::load(&bad).payout_rate, dec!(0.97));
    }
}
