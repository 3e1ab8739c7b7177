//! CLI command handlers
//!
//! Bridges clap argument parsing with the coordinator, the local stores and
//! the prediction helpers.

pub mod check;
pub mod notifications;
pub mod usage;
pub mod validate;

pub use check::{handle_check_command, CheckCommand};
pub use notifications::{handle_notifications_command, NotificationCommands};
pub use usage::{handle_usage_command, UsageCommands};
pub use validate::handle_validate_command;

use std::sync::Arc;

use crate::config::{paths::BudgetPaths, settings::Settings};
use crate::error::{BudgetError, BudgetResult};
use crate::models::{Money, UserId};
use crate::notify::{
    ApiResult, EventBus, LocalRealtime, NotificationCoordinator, NotificationServices,
    StoreNotifier,
};
use crate::data::{Backend, DataHooks};
use crate::retry::RetryPolicy;
use crate::storage::Storage;

/// Everything a command needs, wired once per invocation
pub struct AppContext {
    pub paths: BudgetPaths,
    pub settings: Settings,
    pub storage: Storage,
    pub coordinator: NotificationCoordinator,
}

impl AppContext {
    pub fn new(paths: BudgetPaths, settings: Settings) -> BudgetResult<Self> {
        let storage = Storage::new(paths.clone())?;
        storage.load_all()?;

        let realtime = Arc::new(LocalRealtime::new());
        let notifier = Arc::new(
            StoreNotifier::new(storage.notifications.clone(), &settings.notifications)
                .with_delivery(realtime.clone()),
        );
        let services = NotificationServices::new()
            .with_all_domains(notifier)
            .with_api(storage.notifications.clone())
            .with_realtime(realtime);
        let coordinator = NotificationCoordinator::new(services, EventBus::new(), &settings.notifications);

        Ok(Self {
            paths,
            settings,
            storage,
            coordinator,
        })
    }

    /// Data hooks over a hosted backend, retrying per the configured policy
    pub fn data_hooks(&self, backend: Arc<dyn Backend>) -> DataHooks {
        DataHooks::new(backend, RetryPolicy::from_settings(&self.settings.retry))
    }
}

/// Parse a user id given as a UUID (with or without the `usr-` prefix)
pub fn parse_user(user: Option<&str>) -> BudgetResult<UserId> {
    let user = user.ok_or_else(|| {
        BudgetError::Validation("A user is required. Pass --user or set BUDGETME_USER".to_string())
    })?;
    user.parse::<UserId>()
        .map_err(|e| BudgetError::Validation(format!("Invalid user id '{}': {}", user, e)))
}

pub(crate) fn parse_money(label: &str, value: &str) -> BudgetResult<Money> {
    Money::parse(value).map_err(|e| {
        BudgetError::Validation(format!(
            "Invalid {} '{}'. Use format like '1000.00' or '1000'. Error: {}",
            label, value, e
        ))
    })
}

pub(crate) fn api_data<T>(result: ApiResult<T>) -> BudgetResult<T> {
    match (result.success, result.data) {
        (true, Some(data)) => Ok(data),
        _ => Err(BudgetError::Storage(
            result.error.unwrap_or_else(|| "notification api returned no data".to_string()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user() {
        let user = UserId::new();
        assert_eq!(parse_user(Some(&user.to_db_string())).unwrap(), user);
        assert!(parse_user(None).unwrap_err().is_validation());
        assert!(parse_user(Some("not-a-uuid")).unwrap_err().is_validation());
    }

    #[test]
    fn test_api_data() {
        assert_eq!(api_data(ApiResult::ok(3usize)).unwrap(), 3);
        let err = api_data::<usize>(ApiResult::failure("store offline")).unwrap_err();
        assert!(err.to_string().contains("store offline"));
    }

    struct EmptyBackend;

    #[async_trait::async_trait]
    impl Backend for EmptyBackend {
        async fn select(&self, _: &str, _: &[crate::data::Filter]) -> Result<Vec<serde_json::Value>, crate::BackendError> {
            Ok(Vec::new())
        }

        async fn rpc(&self, _: &str, _: serde_json::Value) -> Result<serde_json::Value, crate::BackendError> {
            Ok(serde_json::Value::Null)
        }
    }

    #[test]
    fn test_data_hooks_use_configured_retry() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = BudgetPaths::with_base_dir(dir.path().to_path_buf());
        let mut settings = Settings::default();
        settings.retry.max_attempts = 5;
        settings.retry.delay_ms = 250;

        let ctx = AppContext::new(paths, settings).unwrap();
        let hooks = ctx.data_hooks(Arc::new(EmptyBackend));
        assert_eq!(hooks.retry_policy().max_attempts(), 5);
        assert_eq!(hooks.retry_policy().delay(), std::time::Duration::from_millis(250));
    }
}
