//! Configuration module for BudgetMe
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - Settings persistence (retry, notification, quota and logging sections)

pub mod paths;
pub mod settings;

pub use paths::BudgetPaths;
pub use settings::Settings;
