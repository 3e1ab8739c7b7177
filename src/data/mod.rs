//! Data-access hooks
//!
//! Typed fetches over the hosted backend for family membership, goals,
//! members and join requests, all sharing one [`RetryPolicy`](crate::retry::RetryPolicy).

pub mod backend;
pub mod hooks;
pub mod views;

pub use backend::{Backend, Filter};
pub use hooks::DataHooks;
pub use views::{FamilyMembership, GoalView, JoinRequestView, MemberView, RpcResult};
