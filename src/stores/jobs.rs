// stores/jobs.rs - Uploaded calls: refresh, upload, delete, selection reconciliation

use super::{lock, ViewScope};
use crate::decode::decode_list;
use crate::error::DiscoveryError;
use crate::gateway::{ApiRequest, FilePart, Gateway, GatewayError};
use crate::model::{sort_newest_first, Job};
use crate::selection::JobSelection;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

pub const STATUS_IDLE: &str = "Idle - waiting for a recording.";
pub const STATUS_UPLOADING: &str = "Uploading file - please wait...";
pub const STATUS_UPLOADED: &str = "File uploaded successfully. Analysis has started...";
pub const STATUS_UPLOAD_FAILED: &str =
    "There was a problem starting the analysis. Please try again.";
pub const STATUS_ANALYSIS_COMPLETE: &str =
    "Analysis complete. Call summary is ready - click \"View details\" in Recent Calls.";
pub const STATUS_CALL_DELETED: &str = "Call deleted.";
pub const STATUS_DELETE_FAILED: &str = "Error deleting call. Please try again.";
pub const JOBS_LOAD_FAILED: &str = "Failed to load calls";
pub const CONFIRM_DELETE_JOB: &str = "Delete this call and all its analysis/coaching?";

/// How long a deleted id is filtered out of refresh results.
pub const DELETE_TOMBSTONE_TTL: Duration = Duration::from_secs(10);

const UPLOAD_FIELD: &str = "file";

/// A recording picked by the user, ready to upload.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

impl RecordingFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = guess_audio_mime(&file_name).map(str::to_owned);
        Self {
            file_name,
            bytes,
            mime,
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "recording".to_string());
        Ok(Self::new(file_name, bytes))
    }

    fn into_part(self) -> FilePart {
        FilePart {
            field: UPLOAD_FIELD.to_string(),
            file_name: self.file_name,
            bytes: self.bytes,
            mime: self.mime,
        }
    }
}

fn guess_audio_mime(file_name: &str) -> Option<&'static str> {
    let extension = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "mp3" => Some("audio/mpeg"),
        "wav" => Some("audio/wav"),
        "m4a" => Some("audio/mp4"),
        "mp4" => Some("video/mp4"),
        "ogg" => Some("audio/ogg"),
        "webm" => Some("audio/webm"),
        _ => None,
    }
}

/// What a refresh changed, for the controller to react to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// The tracked upload reached `done` during this refresh.
    pub completed_upload: bool,
    /// Ids seen active in the previous list and `done` now.
    pub newly_done: Vec<String>,
    pub selection_changed: bool,
    /// The result was dropped because the view is gone.
    pub discarded: bool,
}

impl RefreshOutcome {
    pub fn any_completed(&self) -> bool {
        self.completed_upload || !self.newly_done.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobsSnapshot {
    pub jobs: Vec<Job>,
    pub error: Option<String>,
    pub loading: bool,
    pub uploading: bool,
    pub status_message: String,
    pub selected: Option<Job>,
    pub tracked_upload: Option<String>,
}

impl JobsSnapshot {
    pub fn latest(&self) -> Option<&Job> {
        self.jobs.first()
    }

    pub fn previous(&self) -> &[Job] {
        self.jobs.get(1..).unwrap_or(&[])
    }

    /// Upload status for display; idle when nothing has happened yet.
    pub fn status_line(&self) -> &str {
        if self.status_message.is_empty() {
            STATUS_IDLE
        } else {
            &self.status_message
        }
    }
}

#[derive(Debug, Default)]
struct JobsState {
    jobs: Vec<Job>,
    error: Option<String>,
    in_flight: u32,
    uploading: bool,
    status_message: String,
    selection: JobSelection,
    tracked_upload: Option<String>,
    tombstones: HashMap<String, Instant>,
}

impl JobsState {
    fn apply_refresh(&mut self, mut jobs: Vec<Job>, now: Instant) -> RefreshOutcome {
        self.tombstones
            .retain(|_, deleted_at| now.duration_since(*deleted_at) < DELETE_TOMBSTONE_TTL);
        if !self.tombstones.is_empty() {
            jobs.retain(|job| {
                let keep = !self.tombstones.contains_key(&job.id);
                if !keep {
                    tracing::debug!("Ignoring recently deleted job {} in refresh", job.id);
                }
                keep
            });
        }
        sort_newest_first(&mut jobs);

        let newly_done = jobs
            .iter()
            .filter(|job| job.is_done())
            .filter(|job| {
                self.jobs
                    .iter()
                    .any(|previous| previous.id == job.id && previous.is_active())
            })
            .map(|job| job.id.clone())
            .collect();

        self.jobs = jobs;
        self.error = None;
        let selection_changed = self.selection.reconcile(&self.jobs);

        let mut completed_upload = false;
        if let Some(tracked_id) = self.tracked_upload.clone() {
            match self.jobs.iter().find(|job| job.id == tracked_id) {
                Some(job) if job.is_done() => {
                    tracing::info!("Tracked upload {} finished analysis", tracked_id);
                    self.status_message = STATUS_ANALYSIS_COMPLETE.to_string();
                    self.tracked_upload = None;
                    completed_upload = true;
                }
                Some(_) => {}
                None => {
                    tracing::info!("Tracked upload {} no longer listed", tracked_id);
                    self.tracked_upload = None;
                }
            }
        }

        RefreshOutcome {
            completed_upload,
            newly_done,
            selection_changed,
            discarded: false,
        }
    }

    fn apply_refresh_failure(&mut self) {
        self.jobs.clear();
        self.error = Some(JOBS_LOAD_FAILED.to_string());
    }

    fn remove_job(&mut self, job_id: &str, now: Instant) -> bool {
        self.jobs.retain(|job| job.id != job_id);
        self.tombstones.insert(job_id.to_string(), now);
        if self.tracked_upload.as_deref() == Some(job_id) {
            self.tracked_upload = None;
        }
        self.selection.forget(job_id)
    }
}

/// Canonical list of uploaded calls.
///
/// Every write is either a full replacement (`refresh`) or a filter
/// (`delete`), so overlapping calls converge without a request queue.
pub struct JobsStore {
    state: Mutex<JobsState>,
    scope: ViewScope,
}

impl JobsStore {
    pub fn new(scope: ViewScope) -> Self {
        Self {
            state: Mutex::new(JobsState::default()),
            scope,
        }
    }

    pub async fn refresh(&self, gateway: &dyn Gateway) -> RefreshOutcome {
        lock(&self.state).in_flight += 1;
        let result = gateway.request(ApiRequest::get("/jobs")).await;

        let mut state = lock(&self.state);
        state.in_flight = state.in_flight.saturating_sub(1);
        if !self.scope.is_current() {
            tracing::debug!("Discarding jobs refresh for a closed view");
            return RefreshOutcome {
                discarded: true,
                ..RefreshOutcome::default()
            };
        }

        match result {
            Ok(value) => {
                let jobs = decode_list::<Job>(value, "jobs");
                let outcome = state.apply_refresh(jobs, Instant::now());
                tracing::debug!(
                    "Jobs refreshed: {} listed, {} active",
                    state.jobs.len(),
                    state.jobs.iter().filter(|job| job.is_active()).count()
                );
                outcome
            }
            Err(e) => {
                tracing::warn!("Failed to load jobs: {}", e);
                state.apply_refresh_failure();
                RefreshOutcome::default()
            }
        }
    }

    /// Upload a recording. Returns the server-issued job id, if any.
    pub async fn upload(
        &self,
        gateway: &dyn Gateway,
        file: Option<RecordingFile>,
    ) -> Result<Option<String>, DiscoveryError> {
        let Some(file) = file else {
            self.set_status(STATUS_UPLOAD_FAILED);
            return Err(DiscoveryError::UserInput("Choose a recording to upload first."));
        };

        {
            let mut state = lock(&self.state);
            state.uploading = true;
            state.status_message = STATUS_UPLOADING.to_string();
        }
        tracing::info!("Uploading {} ({} bytes)", file.file_name, file.bytes.len());

        let result = gateway
            .request(ApiRequest::post_file("/process-file", file.into_part()))
            .await;

        let mut state = lock(&self.state);
        state.uploading = false;

        let response = match result {
            Ok(value) => value,
            // A 2xx with an unreadable body still started the analysis.
            Err(GatewayError::DecodeError(e)) => {
                tracing::warn!("Upload response was not JSON: {}", e);
                Value::Null
            }
            Err(e) => {
                tracing::error!("Upload failed: {}", e);
                if self.scope.is_current() {
                    state.status_message = STATUS_UPLOAD_FAILED.to_string();
                }
                return Err(e.into());
            }
        };

        let job_id = response
            .get("jobId")
            .and_then(Value::as_str)
            .map(str::to_owned);

        if self.scope.is_current() {
            tracing::info!("Upload accepted, job id {:?}", job_id);
            state.tracked_upload = job_id.clone();
            state.status_message = STATUS_UPLOADED.to_string();
        }
        Ok(job_id)
    }

    /// Delete a job on the server and drop it locally. Deleting an id the
    /// server no longer knows is treated as success.
    ///
    /// Returns true when the deleted job was the selected one.
    pub async fn delete(&self, gateway: &dyn Gateway, job_id: &str) -> Result<bool, DiscoveryError> {
        let result = gateway
            .request(ApiRequest::delete(format!("/jobs/{}", job_id)))
            .await;

        let mut state = lock(&self.state);
        match result {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                tracing::info!("Job {} was already gone on the server", job_id);
            }
            Err(e) => {
                tracing::error!("Failed to delete job {}: {}", job_id, e);
                if self.scope.is_current() {
                    state.status_message = STATUS_DELETE_FAILED.to_string();
                }
                return Err(e.into());
            }
        }

        if !self.scope.is_current() {
            return Ok(false);
        }
        let was_selected = state.remove_job(job_id, Instant::now());
        state.status_message = STATUS_CALL_DELETED.to_string();
        Ok(was_selected)
    }

    /// Select a listed job. Returns false when the id is not in the list.
    pub fn select(&self, job_id: &str) -> bool {
        let mut state = lock(&self.state);
        match state.jobs.iter().find(|job| job.id == job_id).cloned() {
            Some(job) => {
                state.selection.select(job);
                true
            }
            None => false,
        }
    }

    pub fn close_selection(&self) {
        lock(&self.state).selection.clear();
    }

    pub fn selected_id(&self) -> Option<String> {
        lock(&self.state).selection.selected_id().map(str::to_owned)
    }

    pub fn has_active(&self) -> bool {
        lock(&self.state).jobs.iter().any(Job::is_active)
    }

    pub fn set_status(&self, message: &str) {
        lock(&self.state).status_message = message.to_string();
    }

    pub fn clear_status(&self) {
        lock(&self.state).status_message.clear();
    }

    pub fn snapshot(&self) -> JobsSnapshot {
        let state = lock(&self.state);
        JobsSnapshot {
            jobs: state.jobs.clone(),
            error: state.error.clone(),
            loading: state.in_flight > 0,
            uploading: state.uploading,
            status_message: state.status_message.clone(),
            selected: state.selection.selected().cloned(),
            tracked_upload: state.tracked_upload.clone(),
        }
    }
}
