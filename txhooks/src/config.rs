// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Coordinator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::hooks::HookSettings;

/// Settings for a [`TransactionCoordinator`](crate::TransactionCoordinator)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Name prefixed to every log line of this coordinator
    pub label: String,
    /// Hooks running longer than this are logged as slow (0 disables)
    pub slow_hook_threshold_ms: u64,
    /// Log each hook start and outcome at debug level
    pub log_hooks: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            label: "default".to_string(),
            slow_hook_threshold_ms: 1000, // 1 second
            log_hooks: true,
        }
    }
}

impl CoordinatorConfig {
    /// Create with a custom log label
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    /// Create with a custom slow hook threshold
    pub fn with_slow_hook_threshold(threshold: Duration) -> Self {
        Self {
            slow_hook_threshold_ms: u64::try_from(threshold.as_millis()).unwrap_or(u64::MAX),
            ..Default::default()
        }
    }

    /// Create with per-hook logging switched off
    pub fn quiet() -> Self {
        Self {
            log_hooks: false,
            slow_hook_threshold_ms: 0,
            ..Default::default()
        }
    }

    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(Error::Config("label must not be empty".to_string()));
        }
        Ok(())
    }

    /// Slow hook threshold, `None` when disabled
    pub fn slow_hook_threshold(&self) -> Option<Duration> {
        match self.slow_hook_threshold_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub(crate) fn hook_settings(&self) -> HookSettings {
        HookSettings {
            slow_threshold: self.slow_hook_threshold(),
            log_hooks: self.log_hooks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.label, "default");
        assert_eq!(config.slow_hook_threshold(), Some(Duration::from_secs(1)));
        assert!(config.log_hooks);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let config = CoordinatorConfig::from_json(r#"{"label": "orders"}"#).unwrap();
        assert_eq!(config.label, "orders");
        assert_eq!(config.slow_hook_threshold_ms, 1000);
        assert!(config.log_hooks);
    }

    #[test]
    fn test_zero_threshold_disables_slow_logging() {
        let config = CoordinatorConfig::quiet();
        assert_eq!(config.slow_hook_threshold(), None);
        assert!(!config.hook_settings().log_hooks);
    }

    #[test]
    fn test_rejects_empty_label() {
        let err = CoordinatorConfig::from_json(r#"{"label": "  "}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = CoordinatorConfig::from_json("{label").unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_custom_threshold() {
        let config = CoordinatorConfig::with_slow_hook_threshold(Duration::from_millis(250));
        assert_eq!(config.slow_hook_threshold_ms, 250);
        assert_eq!(config.label, "default");
    }

    #[test]
    fn test_oversized_threshold_saturates() {
        let config = CoordinatorConfig::with_slow_hook_threshold(Duration::MAX);
        assert_eq!(config.slow_hook_threshold_ms, u64::MAX);
    }
}
