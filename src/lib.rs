pub mod coaching;
pub mod config;
pub mod controller;
pub mod decode;
pub mod error;
pub mod gateway;
pub mod host;
pub mod idle;
pub mod logging;
pub mod model;
pub mod poller;
pub mod selection;
pub mod stores;

pub use coaching::{CoachingPanel, CoachingView};
pub use config::{ClientConfig, ThemeCache};
pub use controller::{DiscoveryController, Tab};
pub use error::DiscoveryError;
pub use gateway::{ApiRequest, Gateway, GatewayError, HttpGateway, Method, RequestBody};
pub use host::{AutoConfirm, Confirmer, LogNavigator, Navigator};
pub use idle::{Activity, IdleTimeout, LANDING_ROUTE};
pub use poller::{PollDecision, PollHandle, PollScheduler};
pub use stores::{JobsSnapshot, PlansSnapshot, RecordingFile, SettingsSnapshot, ViewScope};

use std::path::PathBuf;
use std::sync::Arc;

fn report(jobs: &JobsSnapshot) {
    tracing::info!("{}", jobs.status_line());
    if let Some(error) = &jobs.error {
        tracing::warn!("{}", error);
    }
    for job in &jobs.jobs {
        tracing::info!("  {} {} [{}]", job.id, job.display_name(), job.status.as_str());
    }
}

/// Headless watcher: optionally uploads `recording`, then follows the job
/// list until nothing is processing or Ctrl-C is pressed.
pub async fn run(recording: Option<PathBuf>) -> Result<(), DiscoveryError> {
    logging::init_logging();

    let controller =
        DiscoveryController::from_env(Arc::new(LogNavigator), Arc::new(AutoConfirm))?;
    controller.mount().await;
    controller.activate_tab(Tab::Calls).await;

    if let Some(path) = recording {
        let file = RecordingFile::from_path(&path).await.map_err(|e| {
            DiscoveryError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        controller.choose_file(Some(file));
        controller.upload().await?;
    }
    report(&controller.jobs());

    let interval = controller.config().poll_interval;
    while controller.is_polling() {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(interval) => report(&controller.jobs()),
        }
    }

    controller.unmount();
    Ok(())
}
