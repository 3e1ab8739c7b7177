//! Fetch and mutate helpers for family and goal data
//!
//! Every read goes through the shared [`RetryPolicy`]; mutations run once
//! and report a structured [`RpcResult`].

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, error, info};

use super::backend::{Backend, Filter};
use super::views::{FamilyMembership, GoalView, JoinRequestView, MemberView, RpcResult};
use crate::error::BackendError;
use crate::models::{FamilyId, JoinRequestId, UserId};
use crate::retry::{FetchState, RetryPolicy};

pub const CHECK_USER_FAMILY: &str = "check_user_family";
pub const GET_FAMILY_MEMBERSHIP: &str = "get_family_membership";
pub const APPROVE_JOIN_REQUEST: &str = "approve_join_request";
pub const REJECT_JOIN_REQUEST: &str = "reject_join_request";

/// Errors meaning the procedure is not deployed
const MISSING_FUNCTION_MARKERS: [&str; 2] = ["PGRST202", "Could not find the function"];

fn is_missing_function(err: &BackendError) -> bool {
    let text = err.describe();
    MISSING_FUNCTION_MARKERS.iter().any(|m| text.contains(m))
}

fn normalize_rows<T>(
    rows: Vec<Value>,
    normalize: impl Fn(Value) -> Result<T, BackendError>,
) -> Result<Vec<T>, BackendError> {
    rows.into_iter().map(normalize).collect()
}

pub struct DataHooks {
    backend: Arc<dyn Backend>,
    retry: RetryPolicy,
}

impl DataHooks {
    pub fn new(backend: Arc<dyn Backend>, retry: RetryPolicy) -> Self {
        Self { backend, retry }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// The family `user_id` belongs to
    ///
    /// Tries `check_user_family` first and falls back to
    /// `get_family_membership` when the first procedure is not deployed.
    pub async fn fetch_family_membership(&self, user_id: UserId) -> FetchState<FamilyMembership> {
        self.retry
            .run("family membership", move |attempt| async move {
                let args = json!({ "p_user_id": user_id.to_db_string() });
                let value = match self.backend.rpc(CHECK_USER_FAMILY, args.clone()).await {
                    Err(err) if is_missing_function(&err) => {
                        debug!(attempt, error = %err.describe(), "primary membership check unavailable, using fallback");
                        self.backend.rpc(GET_FAMILY_MEMBERSHIP, args).await?
                    }
                    other => other?,
                };
                FamilyMembership::from_rpc(value)
            })
            .await
    }

    /// All goals owned by `user_id`; an empty list is a valid answer
    pub async fn fetch_goals(&self, user_id: UserId) -> FetchState<Vec<GoalView>> {
        self.retry
            .run("goals", move |_| async move {
                let filters = [Filter::eq("user_id", user_id.to_db_string())];
                let rows = self.backend.select("goals", &filters).await?;
                normalize_rows(rows, GoalView::from_row).map(Some)
            })
            .await
    }

    /// Active members of a family
    pub async fn fetch_members(&self, family_id: FamilyId) -> FetchState<Vec<MemberView>> {
        self.retry
            .run("family members", move |_| async move {
                let filters = [
                    Filter::eq("family_id", family_id.to_db_string()),
                    Filter::eq("status", "active"),
                ];
                let rows = self.backend.select("family_members", &filters).await?;
                normalize_rows(rows, MemberView::from_row).map(Some)
            })
            .await
    }

    /// Pending join requests for a family, oldest first
    pub async fn fetch_join_requests(&self, family_id: FamilyId) -> FetchState<Vec<JoinRequestView>> {
        self.retry
            .run("join requests", move |_| async move {
                let filters = [
                    Filter::eq("family_id", family_id.to_db_string()),
                    Filter::eq("status", "pending"),
                ];
                let rows = self.backend.select("join_requests", &filters).await?;
                let mut requests = normalize_rows(rows, JoinRequestView::from_row)?;
                requests.sort_by(|a, b| a.created_at.cmp(&b.created_at));
                Ok(Some(requests))
            })
            .await
    }

    pub async fn approve_join_request(&self, request_id: JoinRequestId, reviewer: UserId) -> RpcResult {
        let args = json!({
            "p_request_id": request_id.to_db_string(),
            "p_reviewer_id": reviewer.to_db_string(),
        });
        self.mutate(APPROVE_JOIN_REQUEST, args).await
    }

    pub async fn reject_join_request(
        &self,
        request_id: JoinRequestId,
        reviewer: UserId,
        reason: Option<&str>,
    ) -> RpcResult {
        let args = json!({
            "p_request_id": request_id.to_db_string(),
            "p_reviewer_id": reviewer.to_db_string(),
            "p_reason": reason,
        });
        self.mutate(REJECT_JOIN_REQUEST, args).await
    }

    async fn mutate(&self, procedure: &str, args: Value) -> RpcResult {
        let result = match self.backend.rpc(procedure, args).await {
            Ok(value) => RpcResult::from_value(value),
            Err(err) => Err(err),
        };
        match result {
            Ok(result) => {
                info!(procedure, success = result.success, "procedure completed");
                result
            }
            Err(err) => {
                error!(procedure, error = %err.describe(), "procedure failed");
                RpcResult::failed(err.message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;

    type Reply = Result<Value, BackendError>;

    /// Backend that answers each call name from a queue of replies
    #[derive(Default)]
    struct ScriptedBackend {
        replies: Mutex<HashMap<String, VecDeque<Reply>>>,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl ScriptedBackend {
        fn reply(self, name: &str, reply: Reply) -> Self {
            self.replies
                .lock()
                .unwrap()
                .entry(name.to_string())
                .or_default()
                .push_back(reply);
            self
        }

        fn calls_to(&self, name: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|(n, _)| n == name).count()
        }

        fn next(&self, name: &str, args: Value) -> Reply {
            self.calls.lock().unwrap().push((name.to_string(), args));
            self.replies
                .lock()
                .unwrap()
                .get_mut(name)
                .and_then(|q| q.pop_front())
                .unwrap_or_else(|| Err(BackendError::new(format!("no scripted reply for {}", name))))
        }
    }

    #[async_trait]
    impl Backend for ScriptedBackend {
        async fn select(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, BackendError> {
            let args = filters
                .iter()
                .map(|f| {
                    let mut pair = serde_json::Map::new();
                    pair.insert(f.column.clone(), f.value.clone());
                    Value::Object(pair)
                })
                .collect();
            match self.next(table, Value::Array(args))? {
                Value::Array(rows) => Ok(rows),
                other => Ok(vec![other]),
            }
        }

        async fn rpc(&self, name: &str, args: Value) -> Result<Value, BackendError> {
            self.next(name, args)
        }
    }

    fn hooks(backend: ScriptedBackend) -> (DataHooks, Arc<ScriptedBackend>) {
        let backend = Arc::new(backend);
        let hooks = DataHooks::new(backend.clone(), RetryPolicy::new(3, Duration::from_millis(1500)));
        (hooks, backend)
    }

    fn membership_row(family: FamilyId) -> Value {
        json!([{ "is_member": true, "family_id": family.to_db_string(), "family_name": "Lee Family", "role": "member" }])
    }

    #[tokio::test(start_paused = true)]
    async fn test_family_falls_back_when_primary_missing() {
        let family = FamilyId::new();
        let missing = BackendError::with_code(
            "PGRST202",
            "Could not find the function public.check_user_family",
        );
        let (hooks, backend) = hooks(
            ScriptedBackend::default()
                .reply(CHECK_USER_FAMILY, Err(missing))
                .reply(GET_FAMILY_MEMBERSHIP, Ok(membership_row(family))),
        );

        let state = hooks.fetch_family_membership(UserId::new()).await;
        let membership = state.loaded().unwrap();
        assert_eq!(membership.family_id, family);
        assert_eq!(backend.calls_to(CHECK_USER_FAMILY), 1);
        assert_eq!(backend.calls_to(GET_FAMILY_MEMBERSHIP), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_family_no_data_after_three_attempts() {
        let (hooks, backend) = hooks(
            ScriptedBackend::default()
                .reply(CHECK_USER_FAMILY, Ok(json!([])))
                .reply(CHECK_USER_FAMILY, Ok(json!([])))
                .reply(CHECK_USER_FAMILY, Ok(json!([]))),
        );

        let started = tokio::time::Instant::now();
        let state = hooks.fetch_family_membership(UserId::new()).await;
        assert_eq!(state, FetchState::NoData);
        assert_eq!(backend.calls_to(CHECK_USER_FAMILY), 3);
        assert!(started.elapsed() >= Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_family_recovers_on_second_attempt() {
        let family = FamilyId::new();
        let (hooks, backend) = hooks(
            ScriptedBackend::default()
                .reply(CHECK_USER_FAMILY, Err(BackendError::new("connection reset")))
                .reply(CHECK_USER_FAMILY, Ok(membership_row(family))),
        );

        let state = hooks.fetch_family_membership(UserId::new()).await;
        assert!(state.is_loaded());
        assert_eq!(backend.calls_to(CHECK_USER_FAMILY), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_request_is_not_retried() {
        let (hooks, backend) = hooks(
            ScriptedBackend::default().reply("goals", Err(BackendError::with_code("400", "Bad Request"))),
        );

        let state = hooks.fetch_goals(UserId::new()).await;
        assert!(matches!(state, FetchState::Error(_)));
        assert_eq!(backend.calls_to("goals"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_goal_list_is_loaded() {
        let (hooks, backend) = hooks(ScriptedBackend::default().reply("goals", Ok(json!([]))));

        let state = hooks.fetch_goals(UserId::new()).await;
        assert_eq!(state, FetchState::Loaded(Vec::new()));
        assert_eq!(backend.calls_to("goals"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_members_filter_active() {
        let family = FamilyId::new();
        let row = json!({ "family_id": family.to_db_string(), "user_id": UserId::new().to_db_string(), "full_name": "Ana", "role": "admin", "status": "active" });
        let (hooks, backend) = hooks(ScriptedBackend::default().reply("family_members", Ok(json!([row]))));

        let members = hooks.fetch_members(family).await.loaded().unwrap();
        assert_eq!(members.len(), 1);
        assert!(members[0].is_admin());

        let calls = backend.calls.lock().unwrap();
        let (_, filters) = &calls[0];
        assert_eq!(filters[1], json!({ "status": "active" }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_requests_sorted_oldest_first() {
        let family = FamilyId::new();
        let row = |created: &str| {
            json!({
                "id": JoinRequestId::new().to_db_string(),
                "family_id": family.to_db_string(),
                "user_id": UserId::new().to_db_string(),
                "created_at": created,
            })
        };
        let (hooks, _) = hooks(ScriptedBackend::default().reply(
            "join_requests",
            Ok(json!([row("2026-03-02T10:00:00Z"), row("2026-03-01T10:00:00Z")])),
        ));

        let requests = hooks.fetch_join_requests(family).await.loaded().unwrap();
        assert!(requests[0].created_at < requests[1].created_at);
    }

    #[tokio::test]
    async fn test_approve_and_reject_results() {
        let (hooks, backend) = hooks(
            ScriptedBackend::default()
                .reply(APPROVE_JOIN_REQUEST, Ok(json!({ "success": true, "message": "Approved" })))
                .reply(REJECT_JOIN_REQUEST, Err(BackendError::new("permission denied"))),
        );

        let approved = hooks.approve_join_request(JoinRequestId::new(), UserId::new()).await;
        assert!(approved.success);

        let rejected = hooks
            .reject_join_request(JoinRequestId::new(), UserId::new(), Some("Unknown requester"))
            .await;
        assert!(!rejected.success);
        assert_eq!(rejected.message.as_deref(), Some("permission denied"));
        assert_eq!(backend.calls_to(REJECT_JOIN_REQUEST), 1);
    }
}
