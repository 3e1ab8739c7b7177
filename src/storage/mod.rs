//! Storage layer for BudgetMe
//!
//! Local JSON stores with atomic writes and automatic directory creation.
//! They back the notification API and the prediction quota when no hosted
//! backend is configured.

pub mod file_io;
pub mod notifications;
pub mod usage;

pub use file_io::{read_json, write_json_atomic};
pub use notifications::NotificationStore;
pub use usage::UsageRepository;

use std::sync::Arc;

use crate::config::paths::BudgetPaths;
use crate::error::BudgetResult;

/// Main storage coordinator that provides access to all stores
pub struct Storage {
    paths: BudgetPaths,
    pub notifications: Arc<NotificationStore>,
    pub usage: UsageRepository,
}

impl Storage {
    /// Create a new Storage instance, creating directories as needed
    pub fn new(paths: BudgetPaths) -> BudgetResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            notifications: Arc::new(NotificationStore::new(
                paths.notifications_file(),
                paths.preferences_file(),
            )),
            usage: UsageRepository::new(paths.usage_file()),
            paths,
        })
    }

    pub fn paths(&self) -> &BudgetPaths {
        &self.paths
    }

    /// Load all data from disk
    pub fn load_all(&self) -> BudgetResult<()> {
        self.notifications.load()?;
        self.usage.load()?;
        Ok(())
    }

    /// Check if storage has been initialized (has a settings file)
    pub fn is_initialized(&self) -> bool {
        self.paths.settings_file().exists()
    }
}
