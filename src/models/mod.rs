//! Core data models for BudgetMe
//!
//! Typed views of the rows the hosted backend owns: budgets, goals,
//! transactions, family membership and notifications.

pub mod budget;
pub mod family;
pub mod goal;
pub mod ids;
pub mod money;
pub mod notification;
pub mod transaction;
pub mod usage;

pub use budget::{Budget, BudgetPeriod};
pub use family::{FamilyInvitation, FamilyMember, FamilyRole, MemberStatus, RoleChange};
pub use goal::Goal;
pub use ids::{BudgetId, FamilyId, GoalId, JoinRequestId, NotificationId, TransactionId, UserId};
pub use money::Money;
pub use notification::{Notification, NotificationKind};
pub use transaction::Transaction;
pub use usage::{UsageRecord, UsageStatistics, UsageStatus};
