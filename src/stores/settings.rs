// stores/settings.rs - Per-user preferences, fetched on each settings visit

use super::{lock, ViewScope};
use crate::config::ThemeCache;
use crate::error::DiscoveryError;
use crate::gateway::{ApiRequest, Gateway};
use crate::model::{Theme, UserSettings};
use std::sync::Mutex;

pub const SETTINGS_LOAD_FAILED: &str = "Could not load settings. Please try again.";
pub const SETTINGS_SAVED: &str = "Settings saved.";
pub const SETTINGS_SAVE_FAILED: &str = "Could not save settings. Please try again.";

/// Identifies one visit to the settings tab. A load started during a visit
/// that has since ended is not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsVisit(u64);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsSnapshot {
    pub settings: UserSettings,
    pub loading: bool,
    pub saving: bool,
    pub error: Option<String>,
    pub saved_message: Option<String>,
}

#[derive(Debug, Default)]
struct SettingsState {
    settings: UserSettings,
    generation: u64,
    visiting: bool,
    loading: bool,
    saving: bool,
    error: Option<String>,
    saved_message: Option<String>,
}

pub struct SettingsStore {
    state: Mutex<SettingsState>,
    scope: ViewScope,
    cache: Option<ThemeCache>,
}

impl SettingsStore {
    pub fn new(scope: ViewScope, cache: Option<ThemeCache>) -> Self {
        let mut settings = UserSettings::default();
        if let Some(theme) = cache.as_ref().and_then(ThemeCache::load) {
            tracing::debug!("Using cached theme {:?}", theme);
            settings.theme = theme;
        }
        Self {
            state: Mutex::new(SettingsState {
                settings,
                ..SettingsState::default()
            }),
            scope,
            cache,
        }
    }

    pub fn begin_visit(&self) -> SettingsVisit {
        let mut state = lock(&self.state);
        state.generation += 1;
        state.visiting = true;
        state.error = None;
        state.saved_message = None;
        SettingsVisit(state.generation)
    }

    pub fn end_visit(&self) {
        let mut state = lock(&self.state);
        state.generation += 1;
        state.visiting = false;
        state.loading = false;
    }

    fn is_current(&self, state: &SettingsState, visit: SettingsVisit) -> bool {
        self.scope.is_current() && state.visiting && state.generation == visit.0
    }

    /// Fetch settings for `visit`. Stale visits are dropped silently.
    pub async fn load(&self, gateway: &dyn Gateway, visit: SettingsVisit) -> Result<(), DiscoveryError> {
        {
            let mut state = lock(&self.state);
            if !self.is_current(&state, visit) {
                return Ok(());
            }
            state.loading = true;
            state.error = None;
        }

        let result = gateway.request(ApiRequest::get("/settings")).await;

        let mut state = lock(&self.state);
        if !self.is_current(&state, visit) {
            tracing::debug!("Discarding settings load from an earlier visit");
            return Ok(());
        }
        state.loading = false;
        match result {
            Ok(value) => {
                state.settings = UserSettings::from_value(&value);
                tracing::debug!("Loaded settings: {:?}", state.settings);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to load settings: {}", e);
                state.error = Some(SETTINGS_LOAD_FAILED.to_string());
                Err(e.into())
            }
        }
    }

    /// Edit the local copy. Nothing is sent until `save`.
    pub fn update(&self, edit: impl FnOnce(&mut UserSettings)) {
        let mut state = lock(&self.state);
        edit(&mut state.settings);
        state.saved_message = None;
    }

    /// Send the whole settings object and remember the theme locally.
    pub async fn save(&self, gateway: &dyn Gateway) -> Result<(), DiscoveryError> {
        let settings = {
            let mut state = lock(&self.state);
            state.saving = true;
            state.error = None;
            state.saved_message = None;
            state.settings.clone()
        };
        let body = serde_json::to_value(&settings)?;

        let result = gateway.request(ApiRequest::post_json("/settings", body)).await;

        {
            let mut state = lock(&self.state);
            state.saving = false;
            match result {
                Ok(_) => {
                    if self.scope.is_current() {
                        state.saved_message = Some(SETTINGS_SAVED.to_string());
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to save settings: {}", e);
                    if self.scope.is_current() {
                        state.error = Some(SETTINGS_SAVE_FAILED.to_string());
                    }
                    return Err(e.into());
                }
            }
        }

        tracing::info!("Settings saved (theme {:?})", settings.theme);
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(settings.theme) {
                tracing::warn!("Failed to cache theme: {}", e);
            }
        }
        Ok(())
    }

    pub fn theme(&self) -> Theme {
        lock(&self.state).settings.theme
    }

    pub fn snapshot(&self) -> SettingsSnapshot {
        let state = lock(&self.state);
        SettingsSnapshot {
            settings: state.settings.clone(),
            loading: state.loading,
            saving: state.saving,
            error: state.error.clone(),
            saved_message: state.saved_message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::ScriptedGateway;
    use crate::gateway::{GatewayError, Method};
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_coerces_loose_values() {
        let gateway = ScriptedGateway::new();
        gateway.reply(
            Method::Get,
            "/settings",
            Ok(json!({ "autoPrecallEmail": 0, "autoPostcallCoachingEmail": "yes", "theme": "light" })),
        );
        let store = SettingsStore::new(ViewScope::new(), None);

        let visit = store.begin_visit();
        store.load(&gateway, visit).await.unwrap();
        let settings = store.snapshot().settings;
        assert!(!settings.auto_precall_email);
        assert!(settings.auto_postcall_coaching_email);
        assert_eq!(settings.theme, Theme::Light);
    }

    #[tokio::test]
    async fn stale_visit_is_not_applied() {
        let gateway = ScriptedGateway::new();
        gateway.reply(Method::Get, "/settings", Ok(json!({ "theme": "light" })));
        let store = SettingsStore::new(ViewScope::new(), None);

        let visit = store.begin_visit();
        store.end_visit();
        store.load(&gateway, visit).await.unwrap();
        assert_eq!(store.theme(), Theme::Dark);
        assert!(gateway.requests().is_empty());

        let old = store.begin_visit();
        let current = store.begin_visit();
        store.load(&gateway, old).await.unwrap();
        assert_eq!(store.theme(), Theme::Dark);
        store.load(&gateway, current).await.unwrap();
        assert_eq!(store.theme(), Theme::Light);
    }

    #[tokio::test]
    async fn load_failure_sets_error() {
        let gateway = ScriptedGateway::new();
        gateway.reply(Method::Get, "/settings", Err(GatewayError::HttpError { status: 503 }));
        let store = SettingsStore::new(ViewScope::new(), None);

        let visit = store.begin_visit();
        assert!(store.load(&gateway, visit).await.is_err());
        let snapshot = store.snapshot();
        assert_eq!(snapshot.error.as_deref(), Some(SETTINGS_LOAD_FAILED));
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn save_posts_whole_object_and_caches_theme() {
        let dir = TempDir::new().unwrap();
        let cache = ThemeCache::new(dir.path().join("discovery").join("theme.json"));
        let gateway = ScriptedGateway::new();
        gateway.reply(Method::Post, "/settings", Ok(json!({ "ok": true })));
        let store = SettingsStore::new(ViewScope::new(), Some(cache.clone()));

        store.update(|settings| settings.theme = Theme::Light);
        store.save(&gateway).await.unwrap();

        assert_eq!(store.snapshot().saved_message.as_deref(), Some(SETTINGS_SAVED));
        assert_eq!(
            gateway.requests()[0].json_body().cloned().unwrap(),
            json!({ "autoPrecallEmail": true, "autoPostcallCoachingEmail": false, "theme": "light" })
        );
        assert_eq!(cache.load(), Some(Theme::Light));

        let reopened = SettingsStore::new(ViewScope::new(), Some(cache));
        assert_eq!(reopened.theme(), Theme::Light);
    }

    #[tokio::test]
    async fn save_failure_sets_error_and_skips_cache() {
        let dir = TempDir::new().unwrap();
        let cache = ThemeCache::new(dir.path().join("theme.json"));
        let gateway = ScriptedGateway::new();
        gateway.reply(
            Method::Post,
            "/settings",
            Err(GatewayError::NetworkError("timed out".into())),
        );
        let store = SettingsStore::new(ViewScope::new(), Some(cache.clone()));

        store.update(|settings| settings.theme = Theme::Light);
        assert!(store.save(&gateway).await.is_err());
        let snapshot = store.snapshot();
        assert_eq!(snapshot.error.as_deref(), Some(SETTINGS_SAVE_FAILED));
        assert!(!snapshot.saving);
        assert_eq!(cache.load(), None);
    }
}
