//! In-app notification model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{NotificationId, UserId};

/// What a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    BudgetThreshold,
    BudgetExceeded,
    GoalMilestone,
    GoalCompleted,
    GoalDeadline,
    LargeTransaction,
    FamilyInvite,
    FamilyJoin,
    FamilyRoleChange,
}

impl NotificationKind {
    /// Kebab-case name as stored by the backend
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BudgetThreshold => "budget-threshold",
            Self::BudgetExceeded => "budget-exceeded",
            Self::GoalMilestone => "goal-milestone",
            Self::GoalCompleted => "goal-completed",
            Self::GoalDeadline => "goal-deadline",
            Self::LargeTransaction => "large-transaction",
            Self::FamilyInvite => "family-invite",
            Self::FamilyJoin => "family-join",
            Self::FamilyRoleChange => "family-role-change",
        }
    }

    pub fn all() -> [NotificationKind; 9] {
        [
            Self::BudgetThreshold,
            Self::BudgetExceeded,
            Self::GoalMilestone,
            Self::GoalCompleted,
            Self::GoalDeadline,
            Self::LargeTransaction,
            Self::FamilyInvite,
            Self::FamilyJoin,
            Self::FamilyRoleChange,
        ]
    }

    /// Parse a kind from its kebab-case name (case-insensitive, `_` allowed)
    pub fn parse(s: &str) -> Option<Self> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        Self::all().into_iter().find(|k| k.as_str() == wanted)
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification delivered to one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Create an unread notification created now
    pub fn new(
        user_id: UserId,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            user_id,
            kind,
            title: title.into(),
            message: message.into(),
            payload: serde_json::Value::Null,
            read: false,
            created_at: Utc::now(),
            expires_at: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Expire `days` after creation; an out-of-range age never expires
    pub fn expires_after_days(mut self, days: i64) -> Self {
        self.expires_at = Duration::try_days(days).and_then(|age| self.created_at.checked_add_signed(age));
        self
    }

    /// Check if the notification has expired at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}
