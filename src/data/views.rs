//! Typed views over backend rows
//!
//! Raw rows use the backend's column names and floating point amounts; the
//! views carry typed ids, `Money` and derived fields.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BackendError;
use crate::models::{FamilyId, FamilyMember, FamilyRole, Goal, GoalId, JoinRequestId, MemberStatus, Money, UserId};

fn parse_row<T: for<'de> Deserialize<'de>>(kind: &str, row: Value) -> Result<T, BackendError> {
    serde_json::from_value(row)
        .map_err(|e| BackendError::with_code("parse", format!("Malformed {} row: {}", kind, e)))
}

/// The user's family, as reported by the membership procedures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyMembership {
    pub family_id: FamilyId,
    pub family_name: String,
    pub role: FamilyRole,
    #[serde(default)]
    pub is_owner: bool,
}

#[derive(Deserialize)]
struct MembershipRow {
    #[serde(default)]
    is_member: Option<bool>,
    family_id: Option<FamilyId>,
    #[serde(default)]
    family_name: Option<String>,
    #[serde(default)]
    role: FamilyRole,
    #[serde(default)]
    is_owner: bool,
}

impl FamilyMembership {
    /// Normalize a membership procedure result
    ///
    /// Both procedures return either a single object or a one-row array.
    /// `Ok(None)` means the user is not in a family.
    pub fn from_rpc(value: Value) -> Result<Option<Self>, BackendError> {
        let row = match value {
            Value::Null => return Ok(None),
            Value::Array(rows) => match rows.into_iter().next() {
                Some(row) => row,
                None => return Ok(None),
            },
            other => other,
        };

        let row: MembershipRow = parse_row("membership", row)?;
        if row.is_member == Some(false) {
            return Ok(None);
        }
        Ok(row.family_id.map(|family_id| Self {
            family_id,
            family_name: row.family_name.unwrap_or_else(|| "Family".to_string()),
            role: row.role,
            is_owner: row.is_owner,
        }))
    }
}

/// A goal with derived progress
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalView {
    pub id: GoalId,
    pub user_id: UserId,
    pub name: String,
    pub target_amount: Money,
    pub current_amount: Money,
    pub remaining: Money,
    pub target_date: Option<NaiveDate>,
    pub progress_percentage: f64,
}

#[derive(Deserialize)]
struct GoalRow {
    id: GoalId,
    user_id: UserId,
    goal_name: String,
    target_amount: f64,
    #[serde(default)]
    current_amount: f64,
    #[serde(default)]
    target_date: Option<NaiveDate>,
}

impl GoalView {
    pub fn from_row(row: Value) -> Result<Self, BackendError> {
        let row: GoalRow = parse_row("goal", row)?;
        let goal = Goal {
            id: row.id,
            user_id: row.user_id,
            name: row.goal_name,
            target_amount: Money::from_f64(row.target_amount),
            current_amount: Money::from_f64(row.current_amount),
            target_date: row.target_date,
        };
        Ok(Self::from(&goal))
    }

    /// The model the coordinator evaluates
    pub fn to_goal(&self) -> Goal {
        Goal {
            id: self.id,
            user_id: self.user_id,
            name: self.name.clone(),
            target_amount: self.target_amount,
            current_amount: self.current_amount,
            target_date: self.target_date,
        }
    }
}

impl From<&Goal> for GoalView {
    fn from(goal: &Goal) -> Self {
        let remaining = goal.target_amount - goal.current_amount;
        Self {
            id: goal.id,
            user_id: goal.user_id,
            name: goal.name.clone(),
            target_amount: goal.target_amount,
            current_amount: goal.current_amount,
            remaining: if remaining.is_negative() { Money::zero() } else { remaining },
            target_date: goal.target_date,
            progress_percentage: goal.progress_percentage(),
        }
    }
}

/// An active family member
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberView {
    pub user_id: UserId,
    pub display_name: String,
    pub email: Option<String>,
    pub role: FamilyRole,
    pub status: MemberStatus,
    pub joined_at: Option<DateTime<Utc>>,
}

impl MemberView {
    pub fn from_row(row: Value) -> Result<Self, BackendError> {
        let member: FamilyMember = parse_row("family member", row)?;
        Ok(Self::from(member))
    }

    pub fn is_admin(&self) -> bool {
        self.role == FamilyRole::Admin
    }
}

impl From<FamilyMember> for MemberView {
    fn from(member: FamilyMember) -> Self {
        let display_name = member
            .display_name
            .filter(|n| !n.trim().is_empty())
            .or_else(|| member.email.clone())
            .unwrap_or_else(|| "Unknown member".to_string());
        Self {
            user_id: member.user_id,
            display_name,
            email: member.email,
            role: member.role,
            status: member.status,
            joined_at: member.joined_at,
        }
    }
}

/// A pending request to join a family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRequestView {
    pub id: JoinRequestId,
    pub family_id: FamilyId,
    pub user_id: UserId,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl JoinRequestView {
    pub fn from_row(row: Value) -> Result<Self, BackendError> {
        parse_row("join request", row)
    }
}

/// Structured result of a mutating procedure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResult {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl RpcResult {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }

    /// Normalize a procedure response; a bare `true`/`null` counts as success
    pub fn from_value(value: Value) -> Result<Self, BackendError> {
        match value {
            Value::Null | Value::Bool(true) => Ok(Self {
                success: true,
                message: None,
            }),
            Value::Bool(false) => Ok(Self::failed("Request was not processed")),
            Value::Array(rows) => match rows.into_iter().next() {
                Some(row) => parse_row("procedure result", row),
                None => Ok(Self::failed("Empty response")),
            },
            other => parse_row("procedure result", other),
        }
    }
}
