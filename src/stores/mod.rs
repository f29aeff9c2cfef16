// stores/mod.rs - Independently owned pieces of reconciled state

pub mod jobs;
pub mod plans;
pub mod settings;

pub use jobs::{JobsSnapshot, JobsStore, RecordingFile, RefreshOutcome};
pub use plans::{PlansSnapshot, PlansStore};
pub use settings::{SettingsSnapshot, SettingsStore, SettingsVisit};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Liveness of the view a store belongs to. Completions that resolve after
/// the view is torn down are dropped instead of applied.
#[derive(Debug, Clone)]
pub struct ViewScope {
    mounted: Arc<AtomicBool>,
}

impl ViewScope {
    pub fn new() -> Self {
        Self {
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn mount(&self) {
        self.mounted.store(true, Ordering::SeqCst);
    }

    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    pub fn is_current(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

/// Store state is plain data, so a poisoned lock is still usable.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
