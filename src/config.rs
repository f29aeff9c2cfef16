use crate::error::DiscoveryError;
use crate::model::Theme;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CACHE_DIR: &str = "discovery";
const THEME_FILE: &str = "theme.json";

pub const DEFAULT_API_BASE_URL: &str = "/api";
pub const DEFAULT_API_ORIGIN: &str = "http://localhost";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 180_000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const ENV_API_BASE_URL: &str = "DISCOVERY_API_BASE_URL";
pub const ENV_API_ORIGIN: &str = "DISCOVERY_API_ORIGIN";
pub const ENV_POLL_INTERVAL_MS: &str = "DISCOVERY_POLL_INTERVAL_MS";
pub const ENV_IDLE_TIMEOUT_MS: &str = "DISCOVERY_IDLE_TIMEOUT_MS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "DISCOVERY_REQUEST_TIMEOUT_SECS";
pub const ENV_THEME_CACHE: &str = "DISCOVERY_THEME_CACHE";

/// Runtime settings for the Discovery client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base every API path is resolved against, e.g. `/api` or `https://host/api`.
    pub api_base_url: String,
    /// Origin prepended to a relative base before a request is issued.
    pub api_origin: String,
    pub poll_interval: Duration,
    pub idle_timeout: Duration,
    pub request_timeout: Duration,
    pub theme_cache_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_origin: DEFAULT_API_ORIGIN.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            idle_timeout: Duration::from_millis(DEFAULT_IDLE_TIMEOUT_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            theme_cache_path: default_theme_cache_path(),
        }
    }
}

impl ClientConfig {
    /// Build from the process environment, loading a `.env` file first if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Missing or invalid values fall back
    /// to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_base_url = lookup(ENV_API_BASE_URL)
            .map(|value| normalize_base_url(&value))
            .unwrap_or(defaults.api_base_url);
        let api_origin = lookup(ENV_API_ORIGIN)
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.api_origin);

        let poll_interval = parse_u64(&lookup, ENV_POLL_INTERVAL_MS)
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_interval);
        let idle_timeout = parse_u64(&lookup, ENV_IDLE_TIMEOUT_MS)
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.idle_timeout);
        let request_timeout = parse_u64(&lookup, ENV_REQUEST_TIMEOUT_SECS)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let theme_cache_path = lookup(ENV_THEME_CACHE)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .or(defaults.theme_cache_path);

        tracing::info!(
            "Discovery client configured: base={}, poll={}ms, idle={}ms",
            api_base_url,
            poll_interval.as_millis(),
            idle_timeout.as_millis()
        );

        Self {
            api_base_url,
            api_origin,
            poll_interval,
            idle_timeout,
            request_timeout,
            theme_cache_path,
        }
    }

    pub fn theme_cache(&self) -> Option<ThemeCache> {
        self.theme_cache_path.clone().map(ThemeCache::new)
    }
}

pub fn normalize_base_url(input: &str) -> String {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_API_BASE_URL.to_string()
    } else {
        trimmed.to_string()
    }
}

fn parse_u64<F>(lookup: &F, key: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring invalid {}='{}': {}", key, raw, e);
            None
        }
    }
}

fn default_theme_cache_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join(CACHE_DIR).join(THEME_FILE))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedTheme {
    theme: Theme,
}

/// Local-only copy of the theme preference, read by the next session before
/// the settings fetch completes.
#[derive(Debug, Clone)]
pub struct ThemeCache {
    path: PathBuf,
}

impl ThemeCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the cached theme. A corrupt file is backed up and ignored.
    pub fn load(&self) -> Option<Theme> {
        let raw = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<CachedTheme>(&raw) {
            Ok(cached) => Some(cached.theme),
            Err(e) => {
                tracing::warn!("Theme cache at {} is corrupt: {}", self.path.display(), e);
                let backup = self.path.with_extension("json.bak");
                let _ = fs::copy(&self.path, backup);
                None
            }
        }
    }

    pub fn store(&self, theme: Theme) -> Result<(), DiscoveryError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| {
                DiscoveryError::Cache(format!("Failed to create cache dir: {}", e))
            })?;
        }
        let json = serde_json::to_string_pretty(&CachedTheme { theme })
            .map_err(|e| DiscoveryError::Cache(format!("Failed to serialize theme: {}", e)))?;
        fs::write(&self.path, json)
            .map_err(|e| DiscoveryError::Cache(format!("Failed to save theme: {}", e)))
    }
}
