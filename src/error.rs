// error.rs - Crate-level error type

use crate::gateway::GatewayError;
use thiserror::Error;

/// Errors surfaced by controller and store operations.
///
/// Every variant is recovered by the owning store and translated into a short
/// status line; callers get the error back only so they can react to it.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Rejected before anything was sent to the network.
    #[error("{0}")]
    UserInput(&'static str),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl DiscoveryError {
    pub fn is_user_input(&self) -> bool {
        matches!(self, DiscoveryError::UserInput(_))
    }
}
