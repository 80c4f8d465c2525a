//! Routing metadata resolution
//!
//! Memoizes each collection's partition layout behind the single-flight
//! cache. However many fetches fan out concurrently, at most one
//! metadata call per stale collection reaches the transport.

use std::sync::Arc;
use tracing::{debug, warn};

use braid_core::{AsyncCache, Transport};
use braid_types::RoutingMetadata;

use crate::error::RouterError;

/// Cached resolver for collection partition layouts
pub struct RoutingResolver {
    transport: Arc<dyn Transport>,
    cache: AsyncCache<String, Arc<RoutingMetadata>>,
}

impl RoutingResolver {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            cache: AsyncCache::new(),
        }
    }

    /// Resolve a collection's layout, serving from cache when present.
    pub async fn resolve(&self, collection_id: &str) -> Result<Arc<RoutingMetadata>, RouterError> {
        self.get(collection_id, None).await
    }

    /// Resolve a collection's layout after the caller has proven its
    /// snapshot obsolete (e.g. a stale-routing fetch failure). Concurrent
    /// callers holding the same snapshot coalesce onto one refresh.
    pub async fn resolve_obsolete(
        &self,
        collection_id: &str,
        obsolete: &Arc<RoutingMetadata>,
    ) -> Result<Arc<RoutingMetadata>, RouterError> {
        warn!(collection_id = %collection_id, "Routing metadata marked obsolete, refreshing");
        self.get(collection_id, Some(obsolete)).await
    }

    /// Drop a collection's cached layout.
    pub fn invalidate(&self, collection_id: &str) {
        self.cache.invalidate(&collection_id.to_string());
    }

    async fn get(
        &self,
        collection_id: &str,
        obsolete: Option<&Arc<RoutingMetadata>>,
    ) -> Result<Arc<RoutingMetadata>, RouterError> {
        let transport = Arc::clone(&self.transport);
        let refresh_id = collection_id.to_string();
        let metadata = self
            .cache
            .get(collection_id.to_string(), obsolete, move || async move {
                let metadata = transport
                    .resolve_routing_metadata(&refresh_id)
                    .await
                    .map_err(anyhow::Error::from)?;
                metadata.validate()?;
                debug!(
                    collection_id = %refresh_id,
                    range_count = metadata.ranges.len(),
                    "Routing metadata refreshed"
                );
                Ok(Arc::new(metadata))
            })
            .await?;
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use braid_core::FetchError;
    use braid_hash::HashValue;
    use braid_types::{Page, PartitionKeyRange};

    struct CountingTransport {
        resolve_calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for CountingTransport {
        async fn fetch_page(
            &self,
            _partition_id: &str,
            _continuation: Option<&str>,
        ) -> Result<Page, FetchError> {
            unimplemented!("resolver tests never fetch pages")
        }

        async fn resolve_routing_metadata(
            &self,
            collection_id: &str,
        ) -> Result<RoutingMetadata, FetchError> {
            let generation = self.resolve_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            // Each refresh yields a distinguishable layout generation.
            Ok(RoutingMetadata::new(
                collection_id,
                vec![PartitionKeyRange::new(
                    format!("p0-gen{}", generation),
                    HashValue::ZERO,
                    HashValue::MAX,
                )],
            ))
        }
    }

    #[tokio::test]
    async fn test_resolve_is_memoized() {
        let transport = Arc::new(CountingTransport {
            resolve_calls: AtomicUsize::new(0),
        });
        let resolver = RoutingResolver::new(Arc::clone(&transport) as Arc<dyn Transport>);

        let first = resolver.resolve("orders").await.unwrap();
        let second = resolver.resolve("orders").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(transport.resolve_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_obsolete_snapshot_coalesces_to_one_refresh() {
        let transport = Arc::new(CountingTransport {
            resolve_calls: AtomicUsize::new(0),
        });
        let resolver = Arc::new(RoutingResolver::new(
            Arc::clone(&transport) as Arc<dyn Transport>
        ));

        let snapshot = resolver.resolve("orders").await.unwrap();
        assert_eq!(transport.resolve_calls.load(Ordering::SeqCst), 1);

        // Many holders of the same snapshot report it obsolete at once.
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let resolver = Arc::clone(&resolver);
            let snapshot = Arc::clone(&snapshot);
            tasks.push(tokio::spawn(async move {
                resolver.resolve_obsolete("orders", &snapshot).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(transport.resolve_calls.load(Ordering::SeqCst), 2);
    }
}
