//! Error types for the router module

use thiserror::Error;

use braid_core::CacheRefreshError;

/// Router error types
#[derive(Debug, Error)]
pub enum RouterError {
    /// No region endpoint is available for routing
    #[error("No region available for routing")]
    NoRegionAvailable,

    /// No partition range owns the given hash
    #[error("No partition range owns hash {0}")]
    PartitionNotFound(String),

    /// Routing metadata refresh failed
    #[error("Routing metadata refresh failed: {0}")]
    Refresh(#[from] CacheRefreshError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
