// controller.rs - Owns the stores, the poll loop and the idle timer for one Discovery view

use crate::coaching::{CoachingPanel, CoachingView};
use crate::config::ClientConfig;
use crate::error::DiscoveryError;
use crate::gateway::{Gateway, HttpGateway};
use crate::host::{Confirmer, Navigator};
use crate::idle::{Activity, IdleTimeout};
use crate::model::{AiCoverageQuestion, PostCallCoaching, PrecallForm, PrecallResult, Theme, UserSettings};
use crate::poller::{PollDecision, PollHandle, PollScheduler, TickFuture};
use crate::stores::jobs::CONFIRM_DELETE_JOB;
use crate::stores::{
    lock, JobsSnapshot, JobsStore, PlansSnapshot, PlansStore, RecordingFile, RefreshOutcome,
    SettingsSnapshot, SettingsStore, SettingsVisit, ViewScope,
};
use std::sync::{Arc, Mutex, Weak};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Tab {
    #[default]
    Precall,
    Calls,
    Postcall,
    Settings,
}

struct Inner {
    config: ClientConfig,
    gateway: Arc<dyn Gateway>,
    confirmer: Arc<dyn Confirmer>,
    scope: ViewScope,
    jobs: JobsStore,
    plans: PlansStore,
    settings: SettingsStore,
    coaching: CoachingPanel,
    idle: IdleTimeout,
    scheduler: PollScheduler,
    poll: Mutex<Option<PollHandle>>,
    tab: Mutex<Tab>,
    settings_visit: Mutex<Option<SettingsVisit>>,
    chosen_file: Mutex<Option<RecordingFile>>,
    form: Mutex<PrecallForm>,
}

impl Inner {
    async fn refresh_jobs(self: &Arc<Self>) -> RefreshOutcome {
        let outcome = self.jobs.refresh(self.gateway.as_ref()).await;
        if outcome.discarded {
            return outcome;
        }
        if outcome.any_completed() {
            self.idle.arm();
        }
        self.after_jobs_change();
        outcome
    }

    fn after_jobs_change(self: &Arc<Self>) {
        self.coaching.sync_job(self.jobs.selected_id().as_deref());
        self.sync_polling();
    }

    /// Start the poll loop when there is active work, stop it otherwise.
    fn sync_polling(self: &Arc<Self>) {
        let mut poll = lock(&self.poll);
        if !self.scope.is_current() || !self.jobs.has_active() {
            if let Some(handle) = poll.take() {
                tracing::info!("No active jobs, polling stopped");
                handle.stop();
            }
            return;
        }
        if poll.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        tracing::info!("Active jobs present, polling every {:?}", self.scheduler.interval());
        let weak = Arc::downgrade(self);
        *poll = Some(self.scheduler.start(move || Inner::poll_tick(weak.clone())));
    }

    fn poll_tick(weak: Weak<Inner>) -> TickFuture {
        Box::pin(async move {
            let Some(inner) = weak.upgrade() else {
                return PollDecision::Stop;
            };
            inner.refresh_jobs().await;
            if inner.scope.is_current() && inner.jobs.has_active() {
                PollDecision::Continue
            } else {
                PollDecision::Stop
            }
        })
    }
}

/// Entry point for a host shell. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct DiscoveryController {
    inner: Arc<Inner>,
}

impl DiscoveryController {
    pub fn new(
        config: ClientConfig,
        gateway: Arc<dyn Gateway>,
        navigator: Arc<dyn Navigator>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        let scope = ViewScope::new();
        tracing::info!("Discovery controller using {} gateway", gateway.name());
        let inner = Inner {
            jobs: JobsStore::new(scope.clone()),
            plans: PlansStore::new(scope.clone()),
            settings: SettingsStore::new(scope.clone(), config.theme_cache()),
            coaching: CoachingPanel::new(scope.clone()),
            idle: IdleTimeout::new(config.idle_timeout, navigator),
            scheduler: PollScheduler::new(config.poll_interval),
            poll: Mutex::new(None),
            tab: Mutex::new(Tab::default()),
            settings_visit: Mutex::new(None),
            chosen_file: Mutex::new(None),
            form: Mutex::new(PrecallForm::default()),
            config,
            gateway,
            confirmer,
            scope,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Build with the HTTP gateway from environment configuration.
    pub fn from_env(
        navigator: Arc<dyn Navigator>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Result<Self, DiscoveryError> {
        let config = ClientConfig::from_env();
        let gateway = HttpGateway::new(&config)?;
        Ok(Self::new(config, Arc::new(gateway), navigator, confirmer))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    // ---- lifecycle ----

    pub async fn mount(&self) {
        tracing::info!("Discovery view mounted");
        self.inner.scope.mount();
        self.inner.jobs.clear_status();
        lock(&self.inner.chosen_file).take();
        let tab = *lock(&self.inner.tab);
        tokio::join!(self.inner.refresh_jobs(), self.activate_tab(tab));
    }

    pub fn unmount(&self) {
        tracing::info!("Discovery view unmounted");
        self.inner.scope.unmount();
        if let Some(handle) = lock(&self.inner.poll).take() {
            handle.stop();
        }
        self.inner.idle.shutdown();
        lock(&self.inner.settings_visit).take();
        self.inner.settings.end_visit();
    }

    pub async fn activate_tab(&self, tab: Tab) {
        let previous = std::mem::replace(&mut *lock(&self.inner.tab), tab);
        if previous == Tab::Settings && tab != Tab::Settings {
            lock(&self.inner.settings_visit).take();
            self.inner.settings.end_visit();
        }

        match tab {
            Tab::Precall => {
                let _ = self.inner.plans.list(self.inner.gateway.as_ref(), false).await;
            }
            Tab::Settings => {
                let visit = self.inner.settings.begin_visit();
                *lock(&self.inner.settings_visit) = Some(visit);
                let _ = self.inner.settings.load(self.inner.gateway.as_ref(), visit).await;
            }
            Tab::Calls | Tab::Postcall => {}
        }
    }

    pub async fn refresh_jobs(&self) -> RefreshOutcome {
        self.inner.refresh_jobs().await
    }

    // ---- calls ----

    pub fn choose_file(&self, file: Option<RecordingFile>) {
        *lock(&self.inner.chosen_file) = file;
        self.inner.jobs.clear_status();
    }

    /// Upload the chosen recording and refresh the list. The file stays
    /// chosen when the upload fails so it can be retried.
    pub async fn upload(&self) -> Result<Option<String>, DiscoveryError> {
        let file = lock(&self.inner.chosen_file).clone();
        let job_id = self.inner.jobs.upload(self.inner.gateway.as_ref(), file).await?;
        lock(&self.inner.chosen_file).take();
        self.inner.refresh_jobs().await;
        Ok(job_id)
    }

    /// Delete a call after confirmation. Returns false when the user declined.
    pub async fn delete_job(&self, job_id: &str) -> Result<bool, DiscoveryError> {
        if !self.inner.confirmer.confirm(CONFIRM_DELETE_JOB) {
            return Ok(false);
        }
        self.inner.jobs.delete(self.inner.gateway.as_ref(), job_id).await?;
        self.inner.after_jobs_change();
        Ok(true)
    }

    pub fn select_job(&self, job_id: &str) -> bool {
        let selected = self.inner.jobs.select(job_id);
        if selected {
            self.inner.coaching.sync_job(Some(job_id));
        }
        selected
    }

    pub fn close_job(&self) {
        self.inner.jobs.close_selection();
        self.inner.coaching.sync_job(None);
    }

    // ---- pre-call ----

    pub fn update_form(&self, edit: impl FnOnce(&mut PrecallForm)) {
        let mut form = lock(&self.inner.form);
        edit(&mut form);
    }

    pub async fn submit_precall(&self) -> Result<PrecallResult, DiscoveryError> {
        let form = lock(&self.inner.form).clone();
        self.inner.plans.create(self.inner.gateway.as_ref(), &form).await
    }

    /// Load a saved plan into the pre-call panel and prefill the form.
    pub async fn load_plan(&self, plan_id: &str) -> Result<(), DiscoveryError> {
        let detail = self
            .inner
            .plans
            .load_detail(self.inner.gateway.as_ref(), plan_id)
            .await?;
        if self.inner.scope.is_current() {
            lock(&self.inner.form).prefill_from(&detail);
        }
        Ok(())
    }

    /// Delete a saved plan. Unlike calls, plans are removed without asking.
    pub async fn delete_plan(&self, plan_id: &str) -> Result<(), DiscoveryError> {
        self.inner.plans.delete(self.inner.gateway.as_ref(), plan_id).await?;
        if self.inner.coaching.key().plan_id.as_deref() == Some(plan_id) {
            self.inner.coaching.select_plan(None);
        }
        Ok(())
    }

    pub fn toggle_question(&self, question_id: &str) -> bool {
        self.inner.plans.toggle_question(question_id)
    }

    // ---- post-call ----

    pub fn select_coaching_plan(&self, plan_id: Option<&str>) {
        self.inner.coaching.select_plan(plan_id);
    }

    pub async fn generate_coaching(&self) -> Result<Option<PostCallCoaching>, DiscoveryError> {
        self.inner
            .coaching
            .sync_job(self.inner.jobs.selected_id().as_deref());
        let coverage = self
            .inner
            .coaching
            .key()
            .plan_id
            .and_then(|plan_id| self.inner.plans.coverage_for(&plan_id));
        self.inner
            .coaching
            .generate(self.inner.gateway.as_ref(), coverage)
            .await
    }

    pub async fn run_ai_coverage(&self) -> Result<Vec<AiCoverageQuestion>, DiscoveryError> {
        self.inner
            .coaching
            .sync_job(self.inner.jobs.selected_id().as_deref());
        self.inner.coaching.run_coverage(self.inner.gateway.as_ref()).await
    }

    pub fn close_coverage(&self) {
        self.inner.coaching.close_coverage();
    }

    // ---- settings ----

    pub fn update_settings(&self, edit: impl FnOnce(&mut UserSettings)) {
        self.inner.settings.update(edit);
    }

    pub async fn save_settings(&self) -> Result<(), DiscoveryError> {
        self.inner.settings.save(self.inner.gateway.as_ref()).await
    }

    pub fn record_activity(&self, activity: Activity) {
        self.inner.idle.record(activity);
    }

    // ---- snapshots ----

    pub fn tab(&self) -> Tab {
        *lock(&self.inner.tab)
    }

    pub fn jobs(&self) -> JobsSnapshot {
        self.inner.jobs.snapshot()
    }

    pub fn plans(&self) -> PlansSnapshot {
        self.inner.plans.snapshot()
    }

    pub fn settings(&self) -> SettingsSnapshot {
        self.inner.settings.snapshot()
    }

    pub fn theme(&self) -> Theme {
        self.inner.settings.theme()
    }

    pub fn form(&self) -> PrecallForm {
        lock(&self.inner.form).clone()
    }

    pub fn chosen_file_name(&self) -> Option<String> {
        lock(&self.inner.chosen_file)
            .as_ref()
            .map(|file| file.file_name.clone())
    }

    /// Coaching panel for the current selection. A stale key is cleared
    /// before the view is returned.
    pub fn coaching(&self) -> CoachingView {
        self.inner
            .coaching
            .sync_job(self.inner.jobs.selected_id().as_deref());
        self.inner.coaching.view()
    }

    pub fn is_polling(&self) -> bool {
        lock(&self.inner.poll)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn is_idle_armed(&self) -> bool {
        self.inner.idle.is_armed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::ScriptedGateway;
    use crate::gateway::Method;
    use crate::host::{AutoConfirm, LogNavigator};
    use serde_json::json;

    struct Decline;

    impl Confirmer for Decline {
        fn confirm(&self, _message: &str) -> bool {
            false
        }
    }

    fn config() -> ClientConfig {
        ClientConfig {
            theme_cache_path: None,
            ..ClientConfig::default()
        }
    }

    fn controller(gateway: Arc<ScriptedGateway>, confirmer: Arc<dyn Confirmer>) -> DiscoveryController {
        DiscoveryController::new(config(), gateway, Arc::new(LogNavigator), confirmer)
    }

    #[tokio::test]
    async fn mount_loads_jobs_and_recent_plans() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway
            .reply(Method::Get, "/jobs", Ok(json!({ "jobs": [] })))
            .reply(Method::Get, "/precall-plans", Ok(json!([{ "id": "p1" }])));
        let controller = controller(gateway.clone(), Arc::new(AutoConfirm));

        controller.mount().await;
        assert_eq!(controller.tab(), Tab::Precall);
        assert_eq!(controller.plans().summaries.len(), 1);
        assert_eq!(controller.jobs().status_line(), crate::stores::jobs::STATUS_IDLE);
        assert!(!controller.is_polling());
        assert_eq!(gateway.count(Method::Get, "/jobs"), 1);
    }

    #[tokio::test]
    async fn declined_delete_sends_nothing() {
        let gateway = Arc::new(ScriptedGateway::new());
        let controller = controller(gateway.clone(), Arc::new(Decline));

        assert!(!controller.delete_job("j1").await.unwrap());
        assert!(gateway.requests().is_empty());
    }

    #[tokio::test]
    async fn plan_delete_does_not_ask_for_confirmation() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.reply(Method::Delete, "/precall-plans/p1", Ok(json!(null)));
        let controller = controller(gateway.clone(), Arc::new(Decline));

        controller.delete_plan("p1").await.unwrap();
        assert_eq!(gateway.count(Method::Delete, "/precall-plans/p1"), 1);
    }

    #[tokio::test]
    async fn leaving_settings_invalidates_the_visit() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway
            .reply(Method::Get, "/settings", Ok(json!({ "theme": "light" })))
            .reply(Method::Get, "/precall-plans", Ok(json!([])));
        let controller = controller(gateway.clone(), Arc::new(AutoConfirm));

        controller.activate_tab(Tab::Settings).await;
        assert_eq!(controller.theme(), Theme::Light);

        controller.activate_tab(Tab::Calls).await;
        assert_eq!(controller.tab(), Tab::Calls);
        assert!(!controller.settings().loading);
    }

    #[tokio::test]
    async fn loading_a_plan_prefills_the_form() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.reply(
            Method::Get,
            "/precall-plans/p1",
            Ok(json!({ "id": "p1", "clientName": "Dana", "offerName": "Audit", "checklist": [] })),
        );
        let controller = controller(gateway, Arc::new(AutoConfirm));

        controller.load_plan("p1").await.unwrap();
        let form = controller.form();
        assert_eq!(form.client_name, "Dana");
        assert_eq!(form.offer_name, "Audit");
        assert_eq!(form.meeting_goal, crate::model::DEFAULT_MEETING_GOAL);
    }

    #[tokio::test]
    async fn deleting_linked_plan_unlinks_coaching() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.reply(Method::Delete, "/precall-plans/p1", Ok(json!(null)));
        let controller = controller(gateway, Arc::new(AutoConfirm));
        controller.select_coaching_plan(Some("p1"));

        controller.delete_plan("p1").await.unwrap();
        assert_eq!(controller.coaching().key.plan_id, None);
    }

    #[tokio::test]
    async fn upload_without_chosen_file_is_rejected_locally() {
        let gateway = Arc::new(ScriptedGateway::new());
        let controller = controller(gateway.clone(), Arc::new(AutoConfirm));

        assert!(controller.upload().await.unwrap_err().is_user_input());
        assert!(gateway.requests().is_empty());
    }
}
