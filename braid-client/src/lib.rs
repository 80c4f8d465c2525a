//! Braid Client - Query facade
//!
//! Ties the braid layers together for callers:
//! - Resolving a collection's partition layout (memoized, single-flight)
//! - Planning which partitions a query touches (point lookup by
//!   partition key, or full fan-out)
//! - Fanning paginated fetches out across regions and merging the
//!   per-partition streams into one globally ordered sequence

use std::sync::Arc;
use tracing::{debug, info};

use braid_core::{Clock, SystemClock};
use braid_query::QueryContext;
use braid_router_core::{
    target_ranges, RegionRoutedTransport, RoutingResolver, ThompsonSamplingStrategy,
};
use braid_types::PartitionKeyRange;

// Re-exports for consumers of the facade
pub use braid_core::{BanditConfig, ClientConfig, FetchError, RetryConfig, Transport};
pub use braid_query::{FetchExecutionRange, OrderedMergeExecutor, QueryError, QueryTelemetry};
pub use braid_router_core::{RegionEndpoint, RegionStrategy, RouterError};
pub use braid_types::{
    DocumentRef, Page, RoutingMetadata, SortField, SortOrder, SortSpec, SortValue,
};

/// One query's shape: where to look and how to order the results
#[derive(Debug, Clone)]
pub struct QuerySpec {
    /// Collection to query
    pub collection_id: String,

    /// Partition key for a point lookup; `None` scans every partition
    pub partition_key: Option<SortValue>,

    /// Sort specification the per-partition streams are ordered by
    pub sort: SortSpec,
}

impl QuerySpec {
    /// Cross-partition scan
    pub fn scan(collection_id: impl Into<String>, sort: SortSpec) -> Self {
        Self {
            collection_id: collection_id.into(),
            partition_key: None,
            sort,
        }
    }

    /// Restrict to the partition owning a key
    pub fn with_partition_key(mut self, key: SortValue) -> Self {
        self.partition_key = Some(key);
        self
    }
}

/// Client for partitioned, multi-region document queries
pub struct QueryClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    resolver: Arc<RoutingResolver>,
    clock: Arc<dyn Clock>,
}

impl QueryClient {
    /// Create over a single transport endpoint.
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        info!(client_id = %config.client_id, "Creating query client");
        let resolver = Arc::new(RoutingResolver::new(Arc::clone(&transport)));
        Self {
            config,
            transport,
            resolver,
            clock: Arc::new(SystemClock),
        }
    }

    /// Create over per-region endpoints; fetches are spread across them
    /// by a Thompson sampling bandit fed with observed latencies.
    /// Endpoint 0 is the local/default region.
    pub fn with_regions(
        config: ClientConfig,
        endpoints: Vec<RegionEndpoint>,
    ) -> Result<Self, RouterError> {
        let strategy = Arc::new(ThompsonSamplingStrategy::with_config(
            endpoints.len(),
            &config.bandit,
        ));
        let routed: Arc<dyn Transport> = Arc::new(RegionRoutedTransport::new(endpoints, strategy)?);
        Ok(Self::new(config, routed))
    }

    /// Client instance id
    pub fn client_id(&self) -> &str {
        &self.config.client_id
    }

    /// Plan and start a query. The returned executor yields items in
    /// global sort order; grab its telemetry handle before consuming it
    /// as a stream.
    pub async fn query(&self, spec: QuerySpec) -> Result<OrderedMergeExecutor, QueryError> {
        let routing = self
            .resolver
            .resolve(&spec.collection_id)
            .await
            .map_err(QueryError::from)?;

        let targets: Vec<PartitionKeyRange> = target_ranges(&routing, spec.partition_key.as_ref())
            .map_err(QueryError::from)?
            .into_iter()
            .cloned()
            .collect();

        debug!(
            collection_id = %spec.collection_id,
            partition_count = targets.len(),
            point_lookup = spec.partition_key.is_some(),
            "Query planned"
        );

        Ok(OrderedMergeExecutor::new(
            QueryContext {
                transport: Arc::clone(&self.transport),
                resolver: Arc::clone(&self.resolver),
                clock: Arc::clone(&self.clock),
                retry: self.config.retry.clone(),
            },
            routing,
            targets,
            spec.sort,
        ))
    }

    /// Drop a collection's cached partition layout.
    pub fn invalidate_routing(&self, collection_id: &str) {
        self.resolver.invalidate(collection_id);
    }
}
