//! Collaborator seams of the notification coordinator
//!
//! The coordinator never talks to the backend directly. Every sub-service is a
//! trait object so callers can inject the production implementations, the
//! local JSON store, or test doubles.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::events::{BudgetEvent, GoalEvent, LargeTransactionEvent, MemberJoined};
use crate::error::BudgetResult;
use crate::models::{FamilyInvitation, Notification, NotificationKind, RoleChange, UserId};

#[async_trait]
pub trait BudgetNotifier: Send + Sync {
    async fn budget_alert(&self, event: &BudgetEvent) -> BudgetResult<()>;
}

#[async_trait]
pub trait GoalNotifier: Send + Sync {
    async fn goal_alert(&self, event: &GoalEvent) -> BudgetResult<()>;
}

#[async_trait]
pub trait TransactionNotifier: Send + Sync {
    async fn large_transaction(&self, event: &LargeTransactionEvent) -> BudgetResult<()>;
}

#[async_trait]
pub trait FamilyNotifier: Send + Sync {
    async fn invitation(&self, invitation: &FamilyInvitation) -> BudgetResult<()>;
    async fn member_joined(&self, joined: &MemberJoined) -> BudgetResult<()>;
    async fn role_changed(&self, change: &RoleChange) -> BudgetResult<()>;
}

/// Summary of a user's notifications
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationStats {
    pub total: usize,
    pub unread: usize,
    pub by_kind: BTreeMap<NotificationKind, usize>,
}

/// Per-user delivery preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    #[serde(default = "default_true")]
    pub in_app_enabled: bool,
    #[serde(default)]
    pub muted_kinds: BTreeSet<NotificationKind>,
}

fn default_true() -> bool {
    true
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            in_app_enabled: true,
            muted_kinds: BTreeSet::new(),
        }
    }
}

impl NotificationPreferences {
    /// Whether notifications of `kind` should be delivered
    pub fn allows(&self, kind: NotificationKind) -> bool {
        self.in_app_enabled && !self.muted_kinds.contains(&kind)
    }
}

/// Notification persistence and maintenance owned by the backend
#[async_trait]
pub trait NotificationApi: Send + Sync {
    async fn insert(&self, notification: Notification) -> BudgetResult<()>;
    async fn list(&self, user_id: UserId, unread_only: bool) -> BudgetResult<Vec<Notification>>;
    async fn stats(&self, user_id: UserId) -> BudgetResult<NotificationStats>;
    /// Returns how many notifications changed
    async fn mark_all_read(&self, user_id: UserId) -> BudgetResult<usize>;
    /// Returns how many notifications were deleted
    async fn delete_older_than(&self, user_id: UserId, days_old: i64) -> BudgetResult<usize>;
    /// Returns how many expired notifications were deleted
    async fn purge_expired(&self, user_id: UserId) -> BudgetResult<usize>;
    async fn load_preferences(&self, user_id: UserId) -> BudgetResult<NotificationPreferences>;
}

/// Handle for an active real-time subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: UserId,
}

impl Subscription {
    pub fn new(user_id: UserId) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
        }
    }
}

/// Callback invoked for every notification the live feed delivers
pub type NotificationCallback = Arc<dyn Fn(Notification) + Send + Sync>;

/// Live feed of backend notification inserts, keyed by user
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    async fn subscribe(&self, user_id: UserId, callback: NotificationCallback) -> BudgetResult<Subscription>;
    async fn unsubscribe(&self, subscription: Subscription) -> BudgetResult<()>;
}

/// The sub-services a coordinator is built from
///
/// Any of them may be absent; the coordinator then skips that concern and
/// reports itself unhealthy.
#[derive(Clone, Default)]
pub struct NotificationServices {
    pub budget: Option<Arc<dyn BudgetNotifier>>,
    pub goal: Option<Arc<dyn GoalNotifier>>,
    pub transaction: Option<Arc<dyn TransactionNotifier>>,
    pub family: Option<Arc<dyn FamilyNotifier>>,
    pub api: Option<Arc<dyn NotificationApi>>,
    pub realtime: Option<Arc<dyn RealtimeTransport>>,
}

impl NotificationServices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_budget(mut self, notifier: Arc<dyn BudgetNotifier>) -> Self {
        self.budget = Some(notifier);
        self
    }

    pub fn with_goal(mut self, notifier: Arc<dyn GoalNotifier>) -> Self {
        self.goal = Some(notifier);
        self
    }

    pub fn with_transaction(mut self, notifier: Arc<dyn TransactionNotifier>) -> Self {
        self.transaction = Some(notifier);
        self
    }

    pub fn with_family(mut self, notifier: Arc<dyn FamilyNotifier>) -> Self {
        self.family = Some(notifier);
        self
    }

    pub fn with_api(mut self, api: Arc<dyn NotificationApi>) -> Self {
        self.api = Some(api);
        self
    }

    pub fn with_realtime(mut self, realtime: Arc<dyn RealtimeTransport>) -> Self {
        self.realtime = Some(realtime);
        self
    }

    /// Use one notifier for every domain
    pub fn with_all_domains<N>(self, notifier: Arc<N>) -> Self
    where
        N: BudgetNotifier + GoalNotifier + TransactionNotifier + FamilyNotifier + 'static,
    {
        self.with_budget(notifier.clone())
            .with_goal(notifier.clone())
            .with_transaction(notifier.clone())
            .with_family(notifier)
    }
}
