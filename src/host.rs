// host.rs - Hooks into the embedding shell (routing, confirmation dialogs)

/// Moves the host to another route.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Asks the user to confirm a destructive action.
pub trait Confirmer: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

/// Confirms everything. For headless hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl Confirmer for AutoConfirm {
    fn confirm(&self, message: &str) -> bool {
        tracing::debug!("Auto-confirming: {}", message);
        true
    }
}

/// Navigator for hosts without routing; only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, route: &str) {
        tracing::info!("Navigate to {}", route);
    }
}
