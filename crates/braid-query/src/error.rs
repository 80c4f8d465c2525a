//! Error types for the query merge module

use thiserror::Error;

use braid_core::FetchError;
use braid_router_core::RouterError;

/// Query merge error types
#[derive(Debug, Error)]
pub enum QueryError {
    /// A partition's page fetch kept failing transiently until the
    /// attempt bound was spent
    #[error("Partition {partition_id} exhausted {attempts} fetch attempts: {source}")]
    RetriesExhausted {
        partition_id: String,
        attempts: u32,
        source: FetchError,
    },

    /// A partition's page fetch failed permanently
    #[error("Permanent fetch failure on partition {partition_id}: {source}")]
    PermanentFailure {
        partition_id: String,
        source: FetchError,
    },

    /// Routing metadata could not be resolved or refreshed
    #[error(transparent)]
    Routing(#[from] RouterError),
}
