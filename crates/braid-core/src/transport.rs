//! Transport contract
//!
//! The braid core never touches the wire. Everything it needs from the
//! remote service goes through this narrow contract: issue one paged
//! fetch against a partition, or resolve a collection's partition
//! layout. Implementations wrap whatever protocol the service speaks.

use async_trait::async_trait;
use thiserror::Error;

use braid_types::{Page, RoutingMetadata};

/// Fetch error taxonomy
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Network/timeout/overload-equivalent failure; retryable
    #[error("Transient fetch failure: {0}")]
    Transient(String),

    /// Unrecoverable failure (malformed metadata, partition gone)
    #[error("Permanent fetch failure: {0}")]
    Permanent(String),

    /// The partition map used no longer matches server state
    #[error("Routing metadata is stale: {0}")]
    StaleRouting(String),
}

impl FetchError {
    /// Whether the failure is retryable without refreshing routing
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }
}

/// Paged access to the remote service
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one paged fetch against a partition. `continuation` is the
    /// opaque cursor from the previous page, or `None` for the first.
    async fn fetch_page(
        &self,
        partition_id: &str,
        continuation: Option<&str>,
    ) -> Result<Page, FetchError>;

    /// Resolve a collection's partition layout.
    async fn resolve_routing_metadata(
        &self,
        collection_id: &str,
    ) -> Result<RoutingMetadata, FetchError>;
}
