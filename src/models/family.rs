//! Family sharing models
//!
//! Members move through `Invited -> Active -> Removed`; an invited member can
//! also be removed before accepting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{FamilyId, UserId};

/// Role of a member within a family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FamilyRole {
    Admin,
    #[default]
    Member,
    Viewer,
}

impl fmt::Display for FamilyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Member => write!(f, "member"),
            Self::Viewer => write!(f, "viewer"),
        }
    }
}

/// Membership lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    #[default]
    Invited,
    Active,
    Removed,
}

impl MemberStatus {
    /// Whether the lifecycle allows moving from `self` to `next`
    pub fn can_transition_to(self, next: MemberStatus) -> bool {
        matches!(
            (self, next),
            (Self::Invited, Self::Active) | (Self::Invited, Self::Removed) | (Self::Active, Self::Removed)
        )
    }
}

/// A member of a family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub family_id: FamilyId,
    pub user_id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "full_name")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: FamilyRole,
    #[serde(default)]
    pub status: MemberStatus,
    #[serde(default, alias = "created_at")]
    pub joined_at: Option<DateTime<Utc>>,
}

/// An invitation to join a family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyInvitation {
    pub family_id: FamilyId,
    pub family_name: String,
    /// The invited user
    pub invitee_id: UserId,
    pub inviter_name: String,
    pub role: FamilyRole,
}

/// A role change for an existing member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleChange {
    pub family_id: FamilyId,
    pub family_name: String,
    pub user_id: UserId,
    pub old_role: FamilyRole,
    pub new_role: FamilyRole,
}
