//! Coordinator errors

use crate::cluster::FrameworkError;
use crate::config::ConfigError;
use crate::distrib::StoreError;
use crate::scene::SceneError;
use thiserror::Error;

/// Errors surfaced by [`super::FrameCoordinator`]
#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Replication failed
    #[error("Replication error: {0}")]
    Store(#[from] StoreError),

    /// A scene could not be built
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// The framework refused to start; cleanup has already run
    #[error("Cluster framework init failed: {0}")]
    FrameworkInit(#[source] FrameworkError),

    /// The framework failed outside of init
    #[error("Cluster framework error: {0}")]
    Framework(#[from] FrameworkError),
}
