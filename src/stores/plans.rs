// stores/plans.rs - Saved pre-call plans and the active pre-call result

use super::{lock, ViewScope};
use crate::decode::decode_list;
use crate::error::DiscoveryError;
use crate::gateway::{ApiRequest, Gateway};
use crate::model::{CoverageAnswer, PlanDetail, PlanSummary, PrecallForm, PrecallResult};
use std::sync::Mutex;

pub const PLANS_LOAD_FAILED: &str = "Could not load recent pre-call plans.";
pub const PLAN_SAVED: &str = "Pre-call plan saved.";
pub const PLAN_CREATE_FAILED: &str = "Could not generate pre-call prep. Please try again.";
pub const PLAN_LOAD_FAILED: &str = "Could not load saved pre-call plan. Please try again.";
pub const PLAN_DELETE_FAILED: &str = "Could not delete pre-call plan. Please try again.";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlansSnapshot {
    pub summaries: Vec<PlanSummary>,
    pub loading: bool,
    pub list_error: Option<String>,
    pub active: Option<PrecallResult>,
    pub creating: bool,
    pub error: Option<String>,
    pub saved_message: Option<String>,
}

#[derive(Debug, Default)]
struct PlansState {
    summaries: Vec<PlanSummary>,
    loaded_once: bool,
    loading: bool,
    list_error: Option<String>,
    active: Option<PrecallResult>,
    creating: bool,
    error: Option<String>,
    saved_message: Option<String>,
}

pub struct PlansStore {
    state: Mutex<PlansState>,
    scope: ViewScope,
}

impl PlansStore {
    pub fn new(scope: ViewScope) -> Self {
        Self {
            state: Mutex::new(PlansState::default()),
            scope,
        }
    }

    /// Fetch plan summaries. Without `force`, a list that already loaded
    /// once is left alone.
    pub async fn list(&self, gateway: &dyn Gateway, force: bool) -> Result<(), DiscoveryError> {
        {
            let mut state = lock(&self.state);
            if state.loaded_once && !force {
                return Ok(());
            }
            state.loading = true;
            state.list_error = None;
        }

        let result = gateway.request(ApiRequest::get("/precall-plans")).await;

        let mut state = lock(&self.state);
        state.loading = false;
        if !self.scope.is_current() {
            return Ok(());
        }
        match result {
            Ok(value) => {
                state.summaries = decode_list::<PlanSummary>(value, "plans");
                state.loaded_once = true;
                tracing::debug!("Loaded {} pre-call plans", state.summaries.len());
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to load pre-call plans: {}", e);
                state.summaries.clear();
                state.list_error = Some(PLANS_LOAD_FAILED.to_string());
                Err(e.into())
            }
        }
    }

    /// Generate and save a plan from `form`. The result becomes the active
    /// plan and the summary list is refreshed.
    pub async fn create(
        &self,
        gateway: &dyn Gateway,
        form: &PrecallForm,
    ) -> Result<PrecallResult, DiscoveryError> {
        let body = serde_json::to_value(form.payload())?;
        {
            let mut state = lock(&self.state);
            state.creating = true;
            state.error = None;
            state.saved_message = None;
        }
        tracing::info!("Generating pre-call prep for {:?}", form.client_name);

        let result = gateway
            .request(ApiRequest::post_json("/precall-prep", body))
            .await
            .map_err(DiscoveryError::from)
            .and_then(|value| {
                serde_json::from_value::<PrecallResult>(value).map_err(DiscoveryError::from)
            });

        let created = {
            let mut state = lock(&self.state);
            state.creating = false;
            match result {
                Ok(created) => {
                    let created = created.normalized();
                    if self.scope.is_current() {
                        state.active = Some(created.clone());
                        state.saved_message = Some(PLAN_SAVED.to_string());
                    }
                    created
                }
                Err(e) => {
                    tracing::error!("Pre-call prep failed: {}", e);
                    if self.scope.is_current() {
                        state.error = Some(PLAN_CREATE_FAILED.to_string());
                    }
                    return Err(e);
                }
            }
        };

        if let Err(e) = self.list(gateway, true).await {
            tracing::warn!("Plan list refresh after save failed: {}", e);
        }
        Ok(created)
    }

    /// Load a saved plan and make it the active result, checklist reset.
    pub async fn load_detail(
        &self,
        gateway: &dyn Gateway,
        plan_id: &str,
    ) -> Result<PlanDetail, DiscoveryError> {
        {
            let mut state = lock(&self.state);
            state.error = None;
            state.saved_message = None;
        }

        let result = gateway
            .request(ApiRequest::get(format!("/precall-plans/{}", plan_id)))
            .await
            .map_err(DiscoveryError::from)
            .and_then(|value| serde_json::from_value::<PlanDetail>(value).map_err(DiscoveryError::from));

        let mut state = lock(&self.state);
        match result {
            Ok(detail) => {
                if self.scope.is_current() {
                    state.active = Some(detail.to_result());
                }
                tracing::info!("Loaded pre-call plan {}", plan_id);
                Ok(detail)
            }
            Err(e) => {
                tracing::error!("Failed to load pre-call plan {}: {}", plan_id, e);
                if self.scope.is_current() {
                    state.error = Some(PLAN_LOAD_FAILED.to_string());
                }
                Err(e)
            }
        }
    }

    /// Delete a saved plan. Returns true when it was the active plan.
    pub async fn delete(&self, gateway: &dyn Gateway, plan_id: &str) -> Result<bool, DiscoveryError> {
        let result = gateway
            .request(ApiRequest::delete(format!("/precall-plans/{}", plan_id)))
            .await;

        let mut state = lock(&self.state);
        match result {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                tracing::info!("Pre-call plan {} was already gone on the server", plan_id);
            }
            Err(e) => {
                tracing::error!("Failed to delete pre-call plan {}: {}", plan_id, e);
                if self.scope.is_current() {
                    state.error = Some(PLAN_DELETE_FAILED.to_string());
                }
                return Err(e.into());
            }
        }

        if !self.scope.is_current() {
            return Ok(false);
        }
        state.summaries.retain(|plan| plan.id != plan_id);
        let was_active = state
            .active
            .as_ref()
            .is_some_and(|active| active.plan_id.as_deref() == Some(plan_id));
        if was_active {
            state.active = None;
        }
        Ok(was_active)
    }

    /// Flip one checklist item of the active plan. Local only.
    pub fn toggle_question(&self, question_id: &str) -> bool {
        let mut state = lock(&self.state);
        let Some(active) = state.active.as_mut() else {
            return false;
        };
        match active
            .question_checklist
            .iter_mut()
            .find(|question| question.id == question_id)
        {
            Some(question) => {
                question.checked = !question.checked;
                true
            }
            None => false,
        }
    }

    /// Self-reported coverage for `plan_id`, when the active result is that
    /// plan and has a checklist.
    pub fn coverage_for(&self, plan_id: &str) -> Option<Vec<CoverageAnswer>> {
        let state = lock(&self.state);
        let active = state.active.as_ref()?;
        if active.plan_id.as_deref() != Some(plan_id) || active.question_checklist.is_empty() {
            return None;
        }
        Some(
            active
                .question_checklist
                .iter()
                .map(|question| CoverageAnswer {
                    id: question.id.clone(),
                    asked: question.checked,
                })
                .collect(),
        )
    }

    pub fn snapshot(&self) -> PlansSnapshot {
        let state = lock(&self.state);
        PlansSnapshot {
            summaries: state.summaries.clone(),
            loading: state.loading,
            list_error: state.list_error.clone(),
            active: state.active.clone(),
            creating: state.creating,
            error: state.error.clone(),
            saved_message: state.saved_message.clone(),
        }
    }
}
