//! Notification coordination
//!
//! - `coordinator`: decides which domain changes deserve a notification and
//!   owns the per-user live feed
//! - `thresholds`: crossing detection for budget and goal percentages
//! - `services`: traits for the notifiers, the notification API and the
//!   real-time transport
//! - `notifier`: default notifier that renders and stores notifications
//! - `realtime`: in-process real-time transport
//! - `bus`: typed publish/subscribe channel for UI consumers
//!
//! # Example
//!
//! ```rust,ignore
//! let store = Arc::new(NotificationStore::open(&paths)?);
//! let realtime = Arc::new(LocalRealtime::new());
//! let notifier = Arc::new(StoreNotifier::new(store.clone(), &settings.notifications)
//!     .with_delivery(realtime.clone()));
//! let services = NotificationServices::new()
//!     .with_all_domains(notifier)
//!     .with_api(store)
//!     .with_realtime(realtime);
//! let coordinator = NotificationCoordinator::new(services, EventBus::new(), &settings.notifications);
//! coordinator.initialize(user_id).await;
//! coordinator.handle_budget_update(&budget, Some(previous_spent)).await;
//! ```

pub mod bus;
pub mod coordinator;
pub mod events;
pub mod notifier;
pub mod realtime;
pub mod services;
pub mod thresholds;

pub use bus::EventBus;
pub use coordinator::{ApiResult, HealthReport, NotificationCoordinator};
pub use events::{
    BudgetAlert, BudgetEvent, GoalAlert, GoalEvent, LargeTransactionEvent, MemberJoined, UiEvent,
};
pub use notifier::StoreNotifier;
pub use realtime::LocalRealtime;
pub use services::{
    BudgetNotifier, FamilyNotifier, GoalNotifier, NotificationApi, NotificationCallback,
    NotificationPreferences, NotificationServices, NotificationStats, RealtimeTransport,
    Subscription, TransactionNotifier,
};
