//! User settings for BudgetMe
//!
//! Manages retry behavior for backend fetches, notification tuning,
//! prediction quota limits and logging preferences.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::paths::BudgetPaths;
use crate::error::BudgetError;

/// Retry settings for backend fetches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts per fetch (first try included)
    pub max_attempts: u32,
    /// Fixed delay between attempts in milliseconds
    pub delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 1500,
        }
    }
}

impl RetrySettings {
    /// Delay between attempts
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Notification tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Absolute amount (in cents) at which a transaction counts as large
    pub large_transaction_cents: i64,
    /// Days until a generated notification expires
    pub expiry_days: i64,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            large_transaction_cents: 100_000,
            expiry_days: 30,
        }
    }
}

/// Prediction quota settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSettings {
    /// Predictions allowed per window
    pub max_predictions: u32,
    /// Length of a quota window in days
    pub reset_window_days: i64,
}

impl Default for UsageSettings {
    fn default() -> Self {
        Self {
            max_predictions: 5,
            reset_window_days: 30,
        }
    }
}

/// User settings for BudgetMe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Backend fetch retry policy
    #[serde(default)]
    pub retry: RetrySettings,

    /// Notification tuning
    #[serde(default)]
    pub notifications: NotificationSettings,

    /// Prediction quota
    #[serde(default)]
    pub usage: UsageSettings,

    /// Default log filter (overridden by `BUDGETME_LOG`)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Default currency symbol
    #[serde(default = "default_currency")]
    pub currency_symbol: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_currency() -> String {
    "$".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            retry: RetrySettings::default(),
            notifications: NotificationSettings::default(),
            usage: UsageSettings::default(),
            log_level: default_log_level(),
            currency_symbol: default_currency(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &BudgetPaths) -> Result<Self, BudgetError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                BudgetError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                BudgetError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &BudgetPaths) -> Result<(), BudgetError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            BudgetError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| BudgetError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}
