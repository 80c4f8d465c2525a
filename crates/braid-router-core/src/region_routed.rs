//! Region-routed transport
//!
//! Decorates a set of per-region transports with a selection strategy.
//! Every page fetch is routed to the explored or selected region, and a
//! successful fetch feeds its elapsed time back into the strategy. A
//! failed fetch records no reward, so a degraded region's posterior
//! stops improving and selection drifts away from it.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

use braid_core::{FetchError, Transport};
use braid_types::{Page, RoutingMetadata};

use crate::error::RouterError;
use crate::strategy::{RegionIndex, RegionStrategy};

/// One region's transport endpoint
pub struct RegionEndpoint {
    /// Region name for logging
    pub name: String,

    /// Transport bound to this region's service endpoint
    pub transport: Arc<dyn Transport>,
}

impl RegionEndpoint {
    pub fn new(name: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            name: name.into(),
            transport,
        }
    }
}

/// Transport decorator that picks a region per fetch
pub struct RegionRoutedTransport {
    endpoints: Vec<RegionEndpoint>,
    strategy: Arc<dyn RegionStrategy>,
}

impl RegionRoutedTransport {
    /// Create over a non-empty endpoint list. Endpoint order must match
    /// the strategy's arm order; index 0 is the local/default region.
    pub fn new(
        endpoints: Vec<RegionEndpoint>,
        strategy: Arc<dyn RegionStrategy>,
    ) -> Result<Self, RouterError> {
        if endpoints.is_empty() {
            return Err(RouterError::NoRegionAvailable);
        }
        Ok(Self {
            endpoints,
            strategy,
        })
    }

    fn pick_region(&self) -> RegionIndex {
        let region = if self.strategy.should_explore() {
            let region = self.strategy.arm_to_explore();
            debug!(region = region, "Exploration override");
            region
        } else {
            self.strategy.select()
        };
        // Clamp against a strategy configured with more arms than
        // endpoints.
        region.min(self.endpoints.len() - 1)
    }
}

#[async_trait]
impl Transport for RegionRoutedTransport {
    async fn fetch_page(
        &self,
        partition_id: &str,
        continuation: Option<&str>,
    ) -> Result<Page, FetchError> {
        let region = self.pick_region();
        let endpoint = &self.endpoints[region];
        let started = Instant::now();

        let result = endpoint.transport.fetch_page(partition_id, continuation).await;
        match &result {
            Ok(page) => {
                let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
                self.strategy.record_latency(region, latency_ms);
                trace!(
                    region = %endpoint.name,
                    partition_id = %partition_id,
                    latency_ms = latency_ms,
                    documents = page.items.len(),
                    "Page fetched"
                );
            }
            Err(error) => {
                debug!(
                    region = %endpoint.name,
                    partition_id = %partition_id,
                    error = %error,
                    "Region fetch failed, no reward recorded"
                );
            }
        }
        result
    }

    async fn resolve_routing_metadata(
        &self,
        collection_id: &str,
    ) -> Result<RoutingMetadata, FetchError> {
        // Metadata resolution always targets the default region so its
        // latencies stay out of the page-fetch reward stream.
        self.endpoints[0]
            .transport
            .resolve_routing_metadata(collection_id)
            .await
    }
}
