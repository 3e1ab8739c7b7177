//! Default per-domain notifier
//!
//! Renders typed events into user-facing notifications and stores them
//! through the [`NotificationApi`]. When a [`LocalRealtime`] is attached each
//! stored notification is also pushed to the live feed, the way the hosted
//! backend's change feed would.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::events::{
    BudgetAlert, BudgetEvent, GoalAlert, GoalEvent, LargeTransactionEvent, MemberJoined,
};
use super::realtime::LocalRealtime;
use super::services::{BudgetNotifier, FamilyNotifier, GoalNotifier, NotificationApi, TransactionNotifier};
use crate::config::settings::NotificationSettings;
use crate::error::BudgetResult;
use crate::models::{FamilyInvitation, Notification, NotificationKind, RoleChange, UserId};

pub struct StoreNotifier {
    api: Arc<dyn NotificationApi>,
    realtime: Option<Arc<LocalRealtime>>,
    expiry_days: i64,
}

impl StoreNotifier {
    pub fn new(api: Arc<dyn NotificationApi>, settings: &NotificationSettings) -> Self {
        Self {
            api,
            realtime: None,
            expiry_days: settings.expiry_days,
        }
    }

    /// Push every stored notification to `realtime`
    pub fn with_delivery(mut self, realtime: Arc<LocalRealtime>) -> Self {
        self.realtime = Some(realtime);
        self
    }

    async fn send<P: Serialize>(
        &self,
        user_id: UserId,
        kind: NotificationKind,
        title: String,
        message: String,
        payload: &P,
    ) -> BudgetResult<()> {
        let notification = Notification::new(user_id, kind, title, message)
            .with_payload(serde_json::to_value(payload)?)
            .expires_after_days(self.expiry_days);

        self.api.insert(notification.clone()).await?;
        debug!(user = %user_id, kind = %kind, id = %notification.id, "notification stored");

        if let Some(realtime) = &self.realtime {
            realtime.deliver(&notification);
        }
        Ok(())
    }
}

#[async_trait]
impl BudgetNotifier for StoreNotifier {
    async fn budget_alert(&self, event: &BudgetEvent) -> BudgetResult<()> {
        let (title, message) = match event.alert {
            BudgetAlert::ThresholdReached { threshold } => (
                format!("Budget alert: {}", event.budget_name),
                format!(
                    "You've used {}% of your {} budget ({} of {}).",
                    threshold, event.budget_name, event.spent, event.amount
                ),
            ),
            BudgetAlert::Exceeded => (
                format!("Budget exceeded: {}", event.budget_name),
                format!(
                    "You've spent {} against a {} budget for {} ({:.0}%).",
                    event.spent, event.amount, event.budget_name, event.percentage
                ),
            ),
        };
        self.send(event.user_id, event.kind(), title, message, event).await
    }
}

#[async_trait]
impl GoalNotifier for StoreNotifier {
    async fn goal_alert(&self, event: &GoalEvent) -> BudgetResult<()> {
        let (title, message) = match event.alert {
            GoalAlert::Milestone { percent } => (
                "Goal milestone reached".to_string(),
                format!("{} is {}% funded.", event.goal_name, percent),
            ),
            GoalAlert::Completed => (
                "Goal completed!".to_string(),
                format!(
                    "Congratulations! You reached your {} goal of {}.",
                    event.goal_name, event.target_amount
                ),
            ),
            GoalAlert::DeadlineApproaching { days_left } => (
                "Goal deadline approaching".to_string(),
                format!(
                    "{} day{} left to reach {}. You're {:.0}% of the way there.",
                    days_left,
                    if days_left == 1 { "" } else { "s" },
                    event.goal_name,
                    event.progress
                ),
            ),
        };
        self.send(event.user_id, event.kind(), title, message, event).await
    }
}

#[async_trait]
impl TransactionNotifier for StoreNotifier {
    async fn large_transaction(&self, event: &LargeTransactionEvent) -> BudgetResult<()> {
        let message = format!(
            "A transaction of {} was recorded in {} on {}.",
            event.amount, event.category, event.date
        );
        self.send(
            event.user_id,
            NotificationKind::LargeTransaction,
            "Large transaction detected".to_string(),
            message,
            event,
        )
        .await
    }
}

#[async_trait]
impl FamilyNotifier for StoreNotifier {
    async fn invitation(&self, invitation: &FamilyInvitation) -> BudgetResult<()> {
        let message = format!(
            "{} invited you to join {} as {}.",
            invitation.inviter_name, invitation.family_name, invitation.role
        );
        self.send(
            invitation.invitee_id,
            NotificationKind::FamilyInvite,
            "Family invitation".to_string(),
            message,
            invitation,
        )
        .await
    }

    async fn member_joined(&self, joined: &MemberJoined) -> BudgetResult<()> {
        for recipient in joined.recipients.iter().filter(|r| **r != joined.member_id) {
            self.send(
                *recipient,
                NotificationKind::FamilyJoin,
                "New family member".to_string(),
                format!("{} joined {}.", joined.member_name, joined.family_name),
                joined,
            )
            .await?;
        }
        Ok(())
    }

    async fn role_changed(&self, change: &RoleChange) -> BudgetResult<()> {
        let message = format!(
            "Your role in {} changed from {} to {}.",
            change.family_name, change.old_role, change.new_role
        );
        self.send(
            change.user_id,
            NotificationKind::FamilyRoleChange,
            "Family role updated".to_string(),
            message,
            change,
        )
        .await
    }
}
