//! Notification coordinator
//!
//! Single entry point the rest of the app calls after it changes a budget,
//! goal, transaction or family. It decides whether the change deserves a
//! notification and hands the event to the matching notifier. It also owns
//! the user's real-time subscription.
//!
//! Nothing here fails outward: every operation logs its failure and reports
//! it as `false` or as a failed [`ApiResult`]. A missed notification is
//! acceptable, breaking the caller's flow is not.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::bus::EventBus;
use super::events::{
    BudgetAlert, BudgetEvent, GoalAlert, GoalEvent, LargeTransactionEvent, MemberJoined, UiEvent,
};
use super::services::{
    NotificationCallback, NotificationPreferences, NotificationServices, NotificationStats,
    Subscription,
};
use super::thresholds::{self, BUDGET_THRESHOLDS, GOAL_MILESTONES};
use crate::config::settings::NotificationSettings;
use crate::error::BudgetResult;
use crate::models::{
    Budget, FamilyInvitation, Goal, Money, NotificationKind, RoleChange, Transaction, UserId,
};

/// Outcome of a delegated notification API call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    fn from_result(op: &str, result: BudgetResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => {
                error!(op, error = %err, "notification api call failed");
                Self::failure(err.to_string())
            }
        }
    }
}

/// Which sub-services are wired in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub budget_notifier: bool,
    pub goal_notifier: bool,
    pub transaction_notifier: bool,
    pub family_notifier: bool,
    pub notification_api: bool,
    pub realtime: bool,
    pub initialized: bool,
    pub is_healthy: bool,
}

#[derive(Default)]
struct CoordinatorState {
    user: Option<UserId>,
    subscription: Option<Subscription>,
    preferences: NotificationPreferences,
}

/// Coordinates notification decisions and the live feed for one session
pub struct NotificationCoordinator {
    services: NotificationServices,
    bus: EventBus,
    large_transaction: Money,
    state: Mutex<CoordinatorState>,
}

impl NotificationCoordinator {
    pub fn new(services: NotificationServices, bus: EventBus, settings: &NotificationSettings) -> Self {
        Self {
            services,
            bus,
            large_transaction: Money::from_cents(settings.large_transaction_cents),
            state: Mutex::new(CoordinatorState::default()),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub async fn is_initialized(&self) -> bool {
        self.state.lock().await.user.is_some()
    }

    pub async fn current_user(&self) -> Option<UserId> {
        self.state.lock().await.user
    }

    /// Start the live feed for `user_id` and run best-effort setup
    ///
    /// Calling again for the same user is a no-op that returns `true`.
    /// Initializing for another user tears the previous feed down first.
    pub async fn initialize(&self, user_id: UserId) -> bool {
        let mut state = self.state.lock().await;

        if state.user == Some(user_id) {
            debug!(user = %user_id, "notification coordinator already initialized");
            return true;
        }

        if let Some(previous) = state.user.take() {
            info!(previous = %previous, next = %user_id, "switching notification user");
            self.stop_subscription(&mut state).await;
        }

        match &self.services.realtime {
            Some(realtime) => {
                let bus = self.bus.clone();
                let callback: NotificationCallback = Arc::new(move |notification| {
                    bus.publish(UiEvent::NotificationReceived(notification));
                });
                match realtime.subscribe(user_id, callback).await {
                    Ok(subscription) => state.subscription = Some(subscription),
                    Err(err) => {
                        error!(user = %user_id, error = %err, "failed to start realtime subscription");
                        return false;
                    }
                }
            }
            None => warn!(user = %user_id, "no realtime transport configured; live updates disabled"),
        }

        if let Some(api) = &self.services.api {
            match api.load_preferences(user_id).await {
                Ok(preferences) => state.preferences = preferences,
                Err(err) => {
                    warn!(user = %user_id, error = %err, "failed to load notification preferences");
                    state.preferences = NotificationPreferences::default();
                }
            }
            match api.purge_expired(user_id).await {
                Ok(removed) => debug!(user = %user_id, removed, "purged expired notifications"),
                Err(err) => warn!(user = %user_id, error = %err, "expired notification cleanup failed"),
            }
        }

        state.user = Some(user_id);
        info!(user = %user_id, "notification coordinator initialized");
        true
    }

    /// Stop the live feed and forget the initialized user
    ///
    /// Returns `false` if stopping the subscription reported an error; the
    /// coordinator is reset either way. A request for a user other than the
    /// initialized one returns `false` and leaves that user's feed running.
    pub async fn cleanup(&self, user_id: UserId) -> bool {
        let mut state = self.state.lock().await;

        match state.user {
            Some(current) if current != user_id => {
                warn!(requested = %user_id, current = %current, "cleanup requested for a different user");
                return false;
            }
            None => debug!(user = %user_id, "cleanup called while not initialized"),
            _ => {}
        }

        let clean = self.stop_subscription(&mut state).await;
        state.user = None;
        state.preferences = NotificationPreferences::default();
        info!(user = %user_id, "notification coordinator cleaned up");
        clean
    }

    async fn stop_subscription(&self, state: &mut CoordinatorState) -> bool {
        let (Some(subscription), Some(realtime)) = (state.subscription.take(), &self.services.realtime)
        else {
            return true;
        };
        match realtime.unsubscribe(subscription).await {
            Ok(()) => true,
            Err(err) => {
                error!(user = %subscription.user_id, error = %err, "failed to stop realtime subscription");
                false
            }
        }
    }

    /// Preferences that apply to notifications for `user_id`
    async fn preferences_for(&self, user_id: UserId) -> NotificationPreferences {
        let state = self.state.lock().await;
        if state.user == Some(user_id) {
            state.preferences.clone()
        } else {
            NotificationPreferences::default()
        }
    }

    /// Check a budget after its spent amount changed
    ///
    /// Without `previous_spent` the previous percentage is taken as 0.
    pub async fn handle_budget_update(&self, budget: &Budget, previous_spent: Option<Money>) -> bool {
        let current = budget.spent_percentage();
        let previous = previous_spent.map_or(0.0, |spent| budget.percentage_for(spent));

        let mut alerts: Vec<BudgetAlert> = thresholds::crossed_thresholds(previous, current, &BUDGET_THRESHOLDS)
            .into_iter()
            .map(|threshold| BudgetAlert::ThresholdReached { threshold })
            .collect();
        if thresholds::exceeded(previous, current) {
            alerts.push(BudgetAlert::Exceeded);
        }

        if alerts.is_empty() {
            return true;
        }

        let Some(notifier) = &self.services.budget else {
            warn!(budget = %budget.id, "budget notifier missing; dropping alerts");
            return false;
        };

        let preferences = self.preferences_for(budget.user_id).await;
        let mut ok = true;
        for alert in alerts {
            let event = BudgetEvent::new(budget, alert);
            if !preferences.allows(event.kind()) {
                debug!(budget = %budget.id, kind = %event.kind(), "muted by preferences");
                continue;
            }
            if let Err(err) = notifier.budget_alert(&event).await {
                error!(budget = %budget.id, ?alert, error = %err, "failed to send budget notification");
                ok = false;
            }
        }
        ok
    }

    /// Check a goal after its saved amount changed, using the current time
    pub async fn handle_goal_update(&self, goal: &Goal, previous_amount: Option<Money>) -> bool {
        self.handle_goal_update_at(goal, previous_amount, Utc::now()).await
    }

    /// Check a goal as of `now`
    ///
    /// Deadline reminders fire on the exact days 30, 7 and 1; a caller that
    /// does not check on those days misses the reminder.
    pub async fn handle_goal_update_at(
        &self,
        goal: &Goal,
        previous_amount: Option<Money>,
        now: DateTime<Utc>,
    ) -> bool {
        let current = goal.progress_percentage();
        let previous = previous_amount.map_or(0.0, |amount| goal.percentage_for(amount));

        let mut alerts: Vec<GoalAlert> = thresholds::crossed_thresholds(previous, current, &GOAL_MILESTONES)
            .into_iter()
            .map(|percent| GoalAlert::Milestone { percent })
            .collect();
        if thresholds::completed(previous, current) {
            alerts.push(GoalAlert::Completed);
        }
        if let Some(days_left) = goal.days_until_deadline(now) {
            if thresholds::deadline_reminder_due(days_left, current) {
                alerts.push(GoalAlert::DeadlineApproaching { days_left });
            }
        }

        if alerts.is_empty() {
            return true;
        }

        let Some(notifier) = &self.services.goal else {
            warn!(goal = %goal.id, "goal notifier missing; dropping alerts");
            return false;
        };

        let preferences = self.preferences_for(goal.user_id).await;
        let mut ok = true;
        for alert in alerts {
            let event = GoalEvent::new(goal, alert);
            if !preferences.allows(event.kind()) {
                debug!(goal = %goal.id, kind = %event.kind(), "muted by preferences");
                continue;
            }
            if let Err(err) = notifier.goal_alert(&event).await {
                error!(goal = %goal.id, ?alert, error = %err, "failed to send goal notification");
                ok = false;
            }
        }
        ok
    }

    /// Flag transactions whose absolute amount reaches the large-transaction limit
    pub async fn handle_transaction_creation(&self, transaction: &Transaction) -> bool {
        if transaction.amount.abs() < self.large_transaction {
            return true;
        }

        let Some(notifier) = &self.services.transaction else {
            warn!(transaction = %transaction.id, "transaction notifier missing");
            return false;
        };

        let preferences = self.preferences_for(transaction.user_id).await;
        if !preferences.allows(NotificationKind::LargeTransaction) {
            debug!(transaction = %transaction.id, "large transaction muted by preferences");
            return true;
        }

        let event = LargeTransactionEvent::from(transaction);
        match notifier.large_transaction(&event).await {
            Ok(()) => true,
            Err(err) => {
                error!(transaction = %transaction.id, error = %err, "failed to send large transaction notification");
                false
            }
        }
    }

    pub async fn handle_family_invitation(&self, invitation: &FamilyInvitation) -> bool {
        let Some(family) = &self.services.family else {
            warn!(family = %invitation.family_id, "family notifier missing");
            return false;
        };
        log_family_result("invitation", family.invitation(invitation).await)
    }

    pub async fn handle_family_member_joined(&self, joined: &MemberJoined) -> bool {
        let Some(family) = &self.services.family else {
            warn!(family = %joined.family_id, "family notifier missing");
            return false;
        };
        log_family_result("member_joined", family.member_joined(joined).await)
    }

    pub async fn handle_family_role_change(&self, change: &RoleChange) -> bool {
        let Some(family) = &self.services.family else {
            warn!(family = %change.family_id, "family notifier missing");
            return false;
        };
        log_family_result("role_change", family.role_changed(change).await)
    }

    pub async fn notification_stats(&self, user_id: UserId) -> ApiResult<NotificationStats> {
        let Some(api) = &self.services.api else {
            return ApiResult::failure("notification api not configured");
        };
        ApiResult::from_result("stats", api.stats(user_id).await)
    }

    pub async fn mark_all_as_read(&self, user_id: UserId) -> ApiResult<usize> {
        let Some(api) = &self.services.api else {
            return ApiResult::failure("notification api not configured");
        };
        ApiResult::from_result("mark_all_read", api.mark_all_read(user_id).await)
    }

    pub async fn delete_old_notifications(&self, user_id: UserId, days_old: i64) -> ApiResult<usize> {
        let Some(api) = &self.services.api else {
            return ApiResult::failure("notification api not configured");
        };
        ApiResult::from_result("delete_old", api.delete_older_than(user_id, days_old).await)
    }

    /// Ask consumers to refresh when the app becomes visible again
    pub async fn on_visibility_change(&self, visible: bool) -> bool {
        if visible && self.is_initialized().await {
            self.bus.publish(UiEvent::RefreshRequested);
            return true;
        }
        false
    }

    /// Ask consumers to reconnect when the network comes back
    pub async fn on_network_change(&self, online: bool) -> bool {
        if online && self.is_initialized().await {
            self.bus.publish(UiEvent::ReconnectRequested);
            return true;
        }
        false
    }

    pub async fn health_check(&self) -> HealthReport {
        let s = &self.services;
        let budget_notifier = s.budget.is_some();
        let goal_notifier = s.goal.is_some();
        let transaction_notifier = s.transaction.is_some();
        let family_notifier = s.family.is_some();
        let notification_api = s.api.is_some();
        let realtime = s.realtime.is_some();

        HealthReport {
            budget_notifier,
            goal_notifier,
            transaction_notifier,
            family_notifier,
            notification_api,
            realtime,
            initialized: self.is_initialized().await,
            is_healthy: budget_notifier
                && goal_notifier
                && transaction_notifier
                && family_notifier
                && notification_api
                && realtime,
        }
    }
}

fn log_family_result(op: &str, result: BudgetResult<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            error!(op, error = %err, "failed to send family notification");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BudgetError;
    use crate::models::{BudgetPeriod, FamilyId, FamilyRole, Notification};
    use crate::notify::events::MemberJoined;
    use crate::notify::notifier::StoreNotifier;
    use crate::notify::realtime::LocalRealtime;
    use crate::notify::services::{
        BudgetNotifier, FamilyNotifier, GoalNotifier, NotificationApi, RealtimeTransport,
        TransactionNotifier,
    };
    use crate::storage::NotificationStore;
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        budget: std::sync::Mutex<Vec<BudgetAlert>>,
        goal: std::sync::Mutex<Vec<GoalAlert>>,
        transactions: std::sync::Mutex<Vec<LargeTransactionEvent>>,
        family: std::sync::Mutex<Vec<&'static str>>,
        fail: AtomicBool,
    }

    impl Recorder {
        fn check(&self) -> BudgetResult<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(BudgetError::Storage("notifier offline".into()));
            }
            Ok(())
        }

        fn budget_alerts(&self) -> Vec<BudgetAlert> {
            self.budget.lock().unwrap().clone()
        }

        fn goal_alerts(&self) -> Vec<GoalAlert> {
            self.goal.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BudgetNotifier for Recorder {
        async fn budget_alert(&self, event: &BudgetEvent) -> BudgetResult<()> {
            self.check()?;
            self.budget.lock().unwrap().push(event.alert);
            Ok(())
        }
    }

    #[async_trait]
    impl GoalNotifier for Recorder {
        async fn goal_alert(&self, event: &GoalEvent) -> BudgetResult<()> {
            self.check()?;
            self.goal.lock().unwrap().push(event.alert);
            Ok(())
        }
    }

    #[async_trait]
    impl TransactionNotifier for Recorder {
        async fn large_transaction(&self, event: &LargeTransactionEvent) -> BudgetResult<()> {
            self.check()?;
            self.transactions.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    #[async_trait]
    impl FamilyNotifier for Recorder {
        async fn invitation(&self, _: &FamilyInvitation) -> BudgetResult<()> {
            self.check()?;
            self.family.lock().unwrap().push("invitation");
            Ok(())
        }

        async fn member_joined(&self, _: &MemberJoined) -> BudgetResult<()> {
            self.check()?;
            self.family.lock().unwrap().push("member_joined");
            Ok(())
        }

        async fn role_changed(&self, _: &RoleChange) -> BudgetResult<()> {
            self.check()?;
            self.family.lock().unwrap().push("role_changed");
            Ok(())
        }
    }

    /// Notification API double with fixed preferences
    #[derive(Default)]
    struct FakeApi {
        preferences: NotificationPreferences,
        fail: bool,
    }

    impl FakeApi {
        fn result<T>(&self, value: T) -> BudgetResult<T> {
            if self.fail {
                Err(BudgetError::Storage("api unavailable".into()))
            } else {
                Ok(value)
            }
        }
    }

    #[async_trait]
    impl NotificationApi for FakeApi {
        async fn insert(&self, _: Notification) -> BudgetResult<()> {
            self.result(())
        }
        async fn list(&self, _: UserId, _: bool) -> BudgetResult<Vec<Notification>> {
            self.result(Vec::new())
        }
        async fn stats(&self, _: UserId) -> BudgetResult<NotificationStats> {
            self.result(NotificationStats::default())
        }
        async fn mark_all_read(&self, _: UserId) -> BudgetResult<usize> {
            self.result(4)
        }
        async fn delete_older_than(&self, _: UserId, _: i64) -> BudgetResult<usize> {
            self.result(2)
        }
        async fn purge_expired(&self, _: UserId) -> BudgetResult<usize> {
            self.result(0)
        }
        async fn load_preferences(&self, _: UserId) -> BudgetResult<NotificationPreferences> {
            self.result(self.preferences.clone())
        }
    }

    struct RefusingRealtime;

    #[async_trait]
    impl RealtimeTransport for RefusingRealtime {
        async fn subscribe(&self, _: UserId, _: NotificationCallback) -> BudgetResult<Subscription> {
            Err(BudgetError::Realtime("channel closed".into()))
        }
        async fn unsubscribe(&self, _: Subscription) -> BudgetResult<()> {
            Ok(())
        }
    }

    struct Harness {
        coordinator: NotificationCoordinator,
        recorder: Arc<Recorder>,
        realtime: Arc<LocalRealtime>,
    }

    fn harness_with_api(api: FakeApi) -> Harness {
        let recorder = Arc::new(Recorder::default());
        let realtime = Arc::new(LocalRealtime::new());
        let services = NotificationServices::new()
            .with_all_domains(recorder.clone())
            .with_api(Arc::new(api))
            .with_realtime(realtime.clone());
        Harness {
            coordinator: NotificationCoordinator::new(services, EventBus::new(), &NotificationSettings::default()),
            recorder,
            realtime,
        }
    }

    fn harness() -> Harness {
        harness_with_api(FakeApi::default())
    }

    fn budget(user: UserId, spent_units: i64) -> Budget {
        Budget::new(user, "Groceries", Money::from_units(1000), BudgetPeriod::Monthly)
            .with_spent(Money::from_units(spent_units))
    }

    fn goal(user: UserId, current_units: i64) -> Goal {
        Goal::new(user, "Emergency fund", Money::from_units(2000)).with_current(Money::from_units(current_units))
    }

    #[tokio::test]
    async fn test_budget_crossing_fifty() {
        let h = harness();
        let b = budget(UserId::new(), 520);

        assert!(h.coordinator.handle_budget_update(&b, Some(Money::from_units(400))).await);
        assert_eq!(h.recorder.budget_alerts(), vec![BudgetAlert::ThresholdReached { threshold: 50 }]);
    }

    #[tokio::test]
    async fn test_budget_no_repeat_above_threshold() {
        let h = harness();
        let b = budget(UserId::new(), 530);

        assert!(h.coordinator.handle_budget_update(&b, Some(Money::from_units(520))).await);
        assert!(h.recorder.budget_alerts().is_empty());
    }

    #[tokio::test]
    async fn test_budget_exceeded_from_ninety() {
        // Previous spending already sat at 90%, so only the overrun is new
        let h = harness();
        let b = budget(UserId::new(), 1050);

        h.coordinator.handle_budget_update(&b, Some(Money::from_units(900))).await;
        assert_eq!(h.recorder.budget_alerts(), vec![BudgetAlert::Exceeded]);
    }

    #[tokio::test]
    async fn test_budget_jump_fires_every_crossed_threshold() {
        let h = harness();
        let b = budget(UserId::new(), 1050);

        h.coordinator.handle_budget_update(&b, Some(Money::from_units(890))).await;
        assert_eq!(
            h.recorder.budget_alerts(),
            vec![BudgetAlert::ThresholdReached { threshold: 90 }, BudgetAlert::Exceeded]
        );
    }

    #[tokio::test]
    async fn test_budget_without_previous_starts_at_zero() {
        let h = harness();
        h.coordinator.handle_budget_update(&budget(UserId::new(), 800), None).await;
        assert_eq!(
            h.recorder.budget_alerts(),
            vec![
                BudgetAlert::ThresholdReached { threshold: 50 },
                BudgetAlert::ThresholdReached { threshold: 75 },
            ]
        );
    }

    #[tokio::test]
    async fn test_budget_exactly_full_is_not_exceeded() {
        let h = harness();
        h.coordinator
            .handle_budget_update(&budget(UserId::new(), 1000), Some(Money::from_units(950)))
            .await;
        assert!(h.recorder.budget_alerts().is_empty());
    }

    #[tokio::test]
    async fn test_goal_milestones_and_completion() {
        let h = harness();
        let user = UserId::new();

        h.coordinator.handle_goal_update(&goal(user, 1000), Some(Money::zero())).await;
        assert_eq!(
            h.recorder.goal_alerts(),
            vec![GoalAlert::Milestone { percent: 25 }, GoalAlert::Milestone { percent: 50 }]
        );

        h.recorder.goal.lock().unwrap().clear();
        h.coordinator.handle_goal_update(&goal(user, 2000), Some(Money::from_units(1800))).await;
        assert_eq!(h.recorder.goal_alerts(), vec![GoalAlert::Completed]);
    }

    #[tokio::test]
    async fn test_goal_deadline_reminders() {
        let h = harness();
        let target = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let g = goal(UserId::new(), 200).with_target_date(target);

        // 6.5 days out rounds up to 7
        let now = Utc.with_ymd_and_hms(2026, 3, 3, 12, 0, 0).unwrap();
        h.coordinator.handle_goal_update_at(&g, Some(Money::from_units(200)), now).await;
        assert_eq!(h.recorder.goal_alerts(), vec![GoalAlert::DeadlineApproaching { days_left: 7 }]);

        h.recorder.goal.lock().unwrap().clear();
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
        h.coordinator.handle_goal_update_at(&g, Some(Money::from_units(200)), now).await;
        assert!(h.recorder.goal_alerts().is_empty());
    }

    #[tokio::test]
    async fn test_completed_goal_gets_no_deadline_reminder() {
        let h = harness();
        let target = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let g = goal(UserId::new(), 2000).with_target_date(target);
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 6, 0, 0).unwrap();

        h.coordinator.handle_goal_update_at(&g, Some(Money::from_units(2000)), now).await;
        assert!(h.recorder.goal_alerts().is_empty());
    }

    #[tokio::test]
    async fn test_large_transaction_boundary() {
        let h = harness();
        let user = UserId::new();
        let day = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();

        let small = Transaction::new(user, Money::from_cents(99_999), "Travel", day);
        let exact = Transaction::new(user, Money::from_units(1000), "Travel", day);
        let outflow = Transaction::new(user, Money::from_units(-1500), "Rent", day);

        assert!(h.coordinator.handle_transaction_creation(&small).await);
        assert!(h.coordinator.handle_transaction_creation(&exact).await);
        assert!(h.coordinator.handle_transaction_creation(&outflow).await);

        let seen = h.recorder.transactions.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].amount, Money::from_units(-1500));
    }

    #[tokio::test]
    async fn test_notifier_failure_returns_false() {
        let h = harness();
        h.recorder.fail.store(true, Ordering::SeqCst);
        assert!(!h.coordinator.handle_budget_update(&budget(UserId::new(), 600), None).await);
    }

    #[tokio::test]
    async fn test_family_pass_through() {
        let h = harness();
        let family_id = FamilyId::new();
        let user = UserId::new();

        let invitation = FamilyInvitation {
            family_id,
            family_name: "Okafor".into(),
            invitee_id: user,
            inviter_name: "Chidi".into(),
            role: FamilyRole::Member,
        };
        let change = RoleChange {
            family_id,
            family_name: "Okafor".into(),
            user_id: user,
            old_role: FamilyRole::Member,
            new_role: FamilyRole::Admin,
        };
        let joined = MemberJoined {
            family_id,
            family_name: "Okafor".into(),
            member_id: user,
            member_name: "Ada".into(),
            recipients: vec![UserId::new()],
        };

        assert!(h.coordinator.handle_family_invitation(&invitation).await);
        assert!(h.coordinator.handle_family_member_joined(&joined).await);
        assert!(h.coordinator.handle_family_role_change(&change).await);
        assert_eq!(
            *h.recorder.family.lock().unwrap(),
            vec!["invitation", "member_joined", "role_changed"]
        );
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let h = harness();
        let user = UserId::new();

        assert!(h.coordinator.initialize(user).await);
        assert!(h.coordinator.initialize(user).await);
        assert_eq!(h.realtime.active_subscriptions(), 1);
        assert_eq!(h.coordinator.current_user().await, Some(user));
    }

    #[tokio::test]
    async fn test_switching_user_replaces_subscription() {
        let h = harness();
        let first = UserId::new();
        let second = UserId::new();

        h.coordinator.initialize(first).await;
        h.coordinator.initialize(second).await;
        assert_eq!(h.realtime.active_subscriptions(), 1);
        assert_eq!(h.coordinator.current_user().await, Some(second));
    }

    #[tokio::test]
    async fn test_cleanup_then_reinitialize() {
        let h = harness();
        let user = UserId::new();

        h.coordinator.initialize(user).await;
        assert!(h.coordinator.cleanup(user).await);
        assert!(!h.coordinator.is_initialized().await);
        assert_eq!(h.realtime.active_subscriptions(), 0);

        assert!(h.coordinator.initialize(user).await);
        assert_eq!(h.realtime.active_subscriptions(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_for_other_user_keeps_feed() {
        let h = harness();
        let owner = UserId::new();

        h.coordinator.initialize(owner).await;
        assert!(!h.coordinator.cleanup(UserId::new()).await);
        assert_eq!(h.realtime.active_subscriptions(), 1);
        assert_eq!(h.coordinator.current_user().await, Some(owner));

        assert!(h.coordinator.cleanup(owner).await);
        assert_eq!(h.realtime.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_subscribe_failure_leaves_uninitialized() {
        let services = NotificationServices::new().with_realtime(Arc::new(RefusingRealtime));
        let coordinator = NotificationCoordinator::new(services, EventBus::new(), &NotificationSettings::default());

        assert!(!coordinator.initialize(UserId::new()).await);
        assert!(!coordinator.is_initialized().await);
    }

    #[tokio::test]
    async fn test_preference_failure_does_not_block_initialize() {
        let h = harness_with_api(FakeApi {
            fail: true,
            ..FakeApi::default()
        });
        assert!(h.coordinator.initialize(UserId::new()).await);
    }

    #[tokio::test]
    async fn test_muted_kind_is_skipped_for_initialized_user() {
        let mut preferences = NotificationPreferences::default();
        preferences.muted_kinds.insert(NotificationKind::BudgetThreshold);
        let h = harness_with_api(FakeApi {
            preferences,
            fail: false,
        });
        let user = UserId::new();
        h.coordinator.initialize(user).await;

        assert!(h.coordinator.handle_budget_update(&budget(user, 1100), Some(Money::from_units(700))).await);
        assert_eq!(h.recorder.budget_alerts(), vec![BudgetAlert::Exceeded]);
    }

    #[tokio::test]
    async fn test_health_check_reports_missing_services() {
        let h = harness();
        let report = h.coordinator.health_check().await;
        assert!(report.is_healthy);
        assert!(!report.initialized);

        let partial = NotificationCoordinator::new(
            NotificationServices::new().with_budget(Arc::new(Recorder::default())),
            EventBus::new(),
            &NotificationSettings::default(),
        );
        let report = partial.health_check().await;
        assert!(report.budget_notifier);
        assert!(!report.family_notifier);
        assert!(!report.is_healthy);
    }

    #[tokio::test]
    async fn test_api_results() {
        let h = harness();
        let user = UserId::new();
        assert_eq!(h.coordinator.mark_all_as_read(user).await, ApiResult::ok(4));
        assert_eq!(h.coordinator.delete_old_notifications(user, 30).await, ApiResult::ok(2));

        let failing = harness_with_api(FakeApi {
            fail: true,
            ..FakeApi::default()
        });
        let result = failing.coordinator.notification_stats(user).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("api unavailable"));

        let bare = NotificationCoordinator::new(NotificationServices::new(), EventBus::new(), &NotificationSettings::default());
        assert!(!bare.mark_all_as_read(user).await.success);
    }

    #[tokio::test]
    async fn test_visibility_and_network_events() {
        let h = harness();
        let mut events = h.coordinator.bus().subscribe();

        assert!(!h.coordinator.on_visibility_change(true).await);
        h.coordinator.initialize(UserId::new()).await;
        assert!(!h.coordinator.on_visibility_change(false).await);
        assert!(h.coordinator.on_visibility_change(true).await);
        assert!(h.coordinator.on_network_change(true).await);

        assert_eq!(events.try_recv().unwrap(), UiEvent::RefreshRequested);
        assert_eq!(events.try_recv().unwrap(), UiEvent::ReconnectRequested);
    }

    #[tokio::test]
    async fn test_end_to_end_through_store_and_feed() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(NotificationStore::new(
            dir.path().join("notifications.json"),
            dir.path().join("preferences.json"),
        ));
        let realtime = Arc::new(LocalRealtime::new());
        let settings = NotificationSettings::default();
        let notifier = Arc::new(StoreNotifier::new(store.clone(), &settings).with_delivery(realtime.clone()));
        let services = NotificationServices::new()
            .with_all_domains(notifier)
            .with_api(store.clone())
            .with_realtime(realtime);
        let coordinator = NotificationCoordinator::new(services, EventBus::new(), &settings);

        let user = UserId::new();
        let mut events = coordinator.bus().subscribe();
        assert!(coordinator.initialize(user).await);
        assert!(coordinator.handle_budget_update(&budget(user, 760), Some(Money::from_units(700))).await);

        match events.try_recv().unwrap() {
            UiEvent::NotificationReceived(n) => {
                assert_eq!(n.kind, NotificationKind::BudgetThreshold);
                assert!(n.message.contains("75%"));
                assert!(n.expires_at.is_some());
            }
            other => panic!("unexpected event {:?}", other),
        }

        let stats = coordinator.notification_stats(user).await.data.unwrap();
        assert_eq!(stats.unread, 1);
        assert_eq!(coordinator.mark_all_as_read(user).await.data, Some(1));
    }

    #[tokio::test]
    async fn test_delete_old_with_huge_age_is_a_failure_result() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(NotificationStore::new(
            dir.path().join("notifications.json"),
            dir.path().join("preferences.json"),
        ));
        let services = NotificationServices::new().with_api(store);
        let coordinator = NotificationCoordinator::new(services, EventBus::new(), &NotificationSettings::default());

        let result = coordinator.delete_old_notifications(UserId::new(), 200_000_000).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("out of range"));
    }
}
