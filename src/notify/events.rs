//! Typed notification events
//!
//! The coordinator turns domain state transitions into these events and hands
//! them to the per-domain notifiers. `UiEvent` is what the event bus carries
//! to whatever renders notifications.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{
    Budget, BudgetId, FamilyId, Goal, GoalId, Money, Notification, NotificationKind, Transaction,
    TransactionId, UserId,
};

/// Budget condition worth telling the user about
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BudgetAlert {
    ThresholdReached { threshold: u8 },
    Exceeded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetEvent {
    pub budget_id: BudgetId,
    pub user_id: UserId,
    pub budget_name: String,
    pub alert: BudgetAlert,
    pub percentage: f64,
    pub spent: Money,
    pub amount: Money,
}

impl BudgetEvent {
    pub fn new(budget: &Budget, alert: BudgetAlert) -> Self {
        Self {
            budget_id: budget.id,
            user_id: budget.user_id,
            budget_name: budget.name.clone(),
            alert,
            percentage: budget.spent_percentage(),
            spent: budget.spent,
            amount: budget.amount,
        }
    }

    pub fn kind(&self) -> NotificationKind {
        match self.alert {
            BudgetAlert::ThresholdReached { .. } => NotificationKind::BudgetThreshold,
            BudgetAlert::Exceeded => NotificationKind::BudgetExceeded,
        }
    }
}

/// Goal condition worth telling the user about
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GoalAlert {
    Milestone { percent: u8 },
    Completed,
    DeadlineApproaching { days_left: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalEvent {
    pub goal_id: GoalId,
    pub user_id: UserId,
    pub goal_name: String,
    pub alert: GoalAlert,
    pub progress: f64,
    pub current_amount: Money,
    pub target_amount: Money,
}

impl GoalEvent {
    pub fn new(goal: &Goal, alert: GoalAlert) -> Self {
        Self {
            goal_id: goal.id,
            user_id: goal.user_id,
            goal_name: goal.name.clone(),
            alert,
            progress: goal.progress_percentage(),
            current_amount: goal.current_amount,
            target_amount: goal.target_amount,
        }
    }

    pub fn kind(&self) -> NotificationKind {
        match self.alert {
            GoalAlert::Milestone { .. } => NotificationKind::GoalMilestone,
            GoalAlert::Completed => NotificationKind::GoalCompleted,
            GoalAlert::DeadlineApproaching { .. } => NotificationKind::GoalDeadline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LargeTransactionEvent {
    pub transaction_id: TransactionId,
    pub user_id: UserId,
    pub amount: Money,
    pub category: String,
    pub date: NaiveDate,
}

impl From<&Transaction> for LargeTransactionEvent {
    fn from(txn: &Transaction) -> Self {
        Self {
            transaction_id: txn.id,
            user_id: txn.user_id,
            amount: txn.amount,
            category: txn.category.clone(),
            date: txn.date,
        }
    }
}

/// A new member joined a family; `recipients` are the members to tell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberJoined {
    pub family_id: FamilyId,
    pub family_name: String,
    pub member_id: UserId,
    pub member_name: String,
    pub recipients: Vec<UserId>,
}

/// Events published on the in-process bus
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// A notification arrived (locally generated or via the real-time feed)
    NotificationReceived(Notification),
    /// Consumers should re-fetch their notification lists
    RefreshRequested,
    /// Consumers should re-establish their live connections
    ReconnectRequested,
}
