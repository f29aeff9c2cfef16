// coaching.rs - Post-call coaching and AI checklist coverage for the selected call/plan pair

use crate::decode::decode_list;
use crate::error::DiscoveryError;
use crate::gateway::{ApiRequest, Gateway};
use crate::model::{AiCoverageQuestion, CoverageAnswer, PostCallCoaching};
use crate::selection::SelectionKey;
use crate::stores::{lock, ViewScope};
use serde_json::{json, Value};
use std::sync::Mutex;

pub const SELECT_CALL_FIRST: &str = "Select a call first.";
pub const SELECT_CALL_AND_PLAN_FIRST: &str = "Select a call and pre-call plan first.";
pub const COACHING_FAILED: &str = "Could not generate post-call coaching. Please try again.";
pub const COVERAGE_FAILED: &str = "Could not generate AI checklist coverage.";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoachingView {
    pub key: SelectionKey,
    pub coaching: Option<PostCallCoaching>,
    pub loading: bool,
    pub error: Option<String>,
    pub coverage: Option<Vec<AiCoverageQuestion>>,
    pub coverage_loading: bool,
    pub coverage_error: Option<String>,
}

impl CoachingView {
    fn reset_for(&mut self, key: SelectionKey) {
        *self = CoachingView {
            key,
            ..CoachingView::default()
        };
    }
}

/// Derived panel bound to a `(job, plan)` key. Changing either half drops
/// everything derived from the old pair before any new request goes out.
pub struct CoachingPanel {
    state: Mutex<CoachingView>,
    scope: ViewScope,
}

impl CoachingPanel {
    pub fn new(scope: ViewScope) -> Self {
        Self {
            state: Mutex::new(CoachingView::default()),
            scope,
        }
    }

    pub fn key(&self) -> SelectionKey {
        lock(&self.state).key.clone()
    }

    /// Follow the selected job. Returns true when the key changed.
    pub fn sync_job(&self, job_id: Option<&str>) -> bool {
        let mut state = lock(&self.state);
        if state.key.job_id.as_deref() == job_id {
            return false;
        }
        let key = SelectionKey::new(job_id, state.key.plan_id.as_deref());
        tracing::debug!("Coaching key changed to {:?}", key);
        state.reset_for(key);
        true
    }

    /// Link a pre-call plan. Returns true when the key changed.
    pub fn select_plan(&self, plan_id: Option<&str>) -> bool {
        let mut state = lock(&self.state);
        if state.key.plan_id.as_deref() == plan_id {
            return false;
        }
        let key = SelectionKey::new(state.key.job_id.as_deref(), plan_id);
        tracing::debug!("Coaching key changed to {:?}", key);
        state.reset_for(key);
        true
    }

    /// Generate coaching for the current key. `coverage` is the rep's own
    /// checklist coverage for the linked plan; it is reported first, best
    /// effort.
    pub async fn generate(
        &self,
        gateway: &dyn Gateway,
        coverage: Option<Vec<CoverageAnswer>>,
    ) -> Result<Option<PostCallCoaching>, DiscoveryError> {
        let key = {
            let mut state = lock(&self.state);
            if state.key.job_id.is_none() {
                state.error = Some(SELECT_CALL_FIRST.to_string());
                return Err(DiscoveryError::UserInput(SELECT_CALL_FIRST));
            }
            state.loading = true;
            state.error = None;
            state.coaching = None;
            state.key.clone()
        };
        let job_id = key.job_id.clone().unwrap_or_default();

        if let (Some(plan_id), Some(questions)) = (key.plan_id.as_deref(), coverage) {
            let body = json!({ "precallPlanId": plan_id, "questions": questions });
            let path = format!("/calls/{}/checklist-coverage", job_id);
            if let Err(e) = gateway.request(ApiRequest::post_json(path, body)).await {
                tracing::warn!("Checklist coverage report for {} failed: {}", job_id, e);
            }
        }

        let body = json!({
            "jobId": job_id,
            "precallPlanId": key.plan_id,
            "extraNotes": "",
        });
        let result = gateway
            .request(ApiRequest::post_json("/postcall-coaching", body))
            .await;

        let mut state = lock(&self.state);
        if !self.scope.is_current() || state.key != key {
            tracing::debug!("Discarding coaching for stale key {:?}", key);
            return Ok(None);
        }
        state.loading = false;
        match result {
            Ok(mut value) => {
                let coaching = parse_coaching(value.get_mut("coaching").map(Value::take));
                tracing::info!("Post-call coaching ready for {}", job_id);
                state.coaching = coaching.clone();
                Ok(coaching)
            }
            Err(e) => {
                tracing::error!("Post-call coaching for {} failed: {}", job_id, e);
                state.error = Some(COACHING_FAILED.to_string());
                Err(e.into())
            }
        }
    }

    /// Ask the server which checklist questions the call covered.
    pub async fn run_coverage(
        &self,
        gateway: &dyn Gateway,
    ) -> Result<Vec<AiCoverageQuestion>, DiscoveryError> {
        let key = {
            let mut state = lock(&self.state);
            if state.key.job_id.is_none() || state.key.plan_id.is_none() {
                state.coverage_error = Some(SELECT_CALL_AND_PLAN_FIRST.to_string());
                return Err(DiscoveryError::UserInput(SELECT_CALL_AND_PLAN_FIRST));
            }
            state.coverage_loading = true;
            state.coverage_error = None;
            state.key.clone()
        };

        let body = json!({ "jobId": key.job_id, "precallPlanId": key.plan_id });
        let result = gateway
            .request(ApiRequest::post_json("/ai-checklist-coverage", body))
            .await;

        let mut state = lock(&self.state);
        if !self.scope.is_current() || state.key != key {
            tracing::debug!("Discarding coverage for stale key {:?}", key);
            return Ok(Vec::new());
        }
        state.coverage_loading = false;
        match result {
            Ok(mut value) => {
                let questions = match value.get_mut("questions").map(Value::take) {
                    Some(list @ Value::Array(_)) => decode_list(list, "questions"),
                    _ => Vec::new(),
                };
                state.coverage = Some(questions.clone());
                Ok(questions)
            }
            Err(e) => {
                tracing::error!("AI checklist coverage failed: {}", e);
                state.coverage_error = Some(COVERAGE_FAILED.to_string());
                Err(e.into())
            }
        }
    }

    pub fn close_coverage(&self) {
        let mut state = lock(&self.state);
        state.coverage = None;
        state.coverage_error = None;
    }

    pub fn view(&self) -> CoachingView {
        lock(&self.state).clone()
    }
}

fn parse_coaching(value: Option<Value>) -> Option<PostCallCoaching> {
    match value {
        None | Some(Value::Null) => {
            tracing::warn!("Coaching response had no coaching payload");
            None
        }
        Some(value) => match serde_json::from_value(value) {
            Ok(coaching) => Some(coaching),
            Err(e) => {
                tracing::warn!("Unreadable coaching payload: {}", e);
                None
            }
        },
    }
}
