//! Globally ordered k-way merge
//!
//! Pull-driven merge over N partition streams. A binary min-heap holds
//! at most one head item per stream; the comparator applies the query's
//! sort specification and breaks cross-partition ties by the owning
//! range's lower bound, which makes the output order deterministic for
//! identical inputs. A stream re-enters the heap only once its next head
//! is buffered, fetching further pages as needed.

use futures::Stream;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::Arc;
use tracing::debug;

use braid_core::{Clock, RetryConfig, Transport};
use braid_hash::HashValue;
use braid_types::{DocumentRef, PartitionKeyRange, RoutingMetadata, SortSpec};
use braid_router_core::RoutingResolver;

use crate::error::QueryError;
use crate::stream::{FetchContext, PartitionStream};
use crate::telemetry::QueryTelemetry;

/// Dependencies a merge executor draws on
pub struct QueryContext {
    pub transport: Arc<dyn Transport>,
    pub resolver: Arc<RoutingResolver>,
    pub clock: Arc<dyn Clock>,
    pub retry: RetryConfig,
}

/// A stream's current head item, keyed for the min-heap
struct HeapEntry {
    item: DocumentRef,
    stream_index: usize,
    range_min: HashValue,
    spec: Arc<SortSpec>,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Sort spec first; ties fall back to the owning range's lower
        // bound ascending. Ranges are disjoint and each stream has at
        // most one entry in the heap, so this is a total order.
        self.spec
            .compare(&self.item, &other.item)
            .then_with(|| self.range_min.cmp(&other.range_min))
    }
}

/// Lazy, forward-only merge of N partition streams
pub struct OrderedMergeExecutor {
    streams: Vec<PartitionStream>,
    heap: BinaryHeap<Reverse<HeapEntry>>,
    spec: Arc<SortSpec>,
    ctx: FetchContext,
    primed: bool,
    finished: bool,
}

impl OrderedMergeExecutor {
    /// Build a merge over the given target ranges. Each range must come
    /// from `routing`, whose collection the fetches run against.
    pub fn new(
        ctx: QueryContext,
        routing: Arc<RoutingMetadata>,
        targets: Vec<PartitionKeyRange>,
        spec: SortSpec,
    ) -> Self {
        debug!(
            collection_id = %routing.collection_id,
            partition_count = targets.len(),
            sort_fields = spec.fields.len(),
            "Ordered merge planned"
        );
        let fetch_ctx = FetchContext::new(
            ctx.transport,
            ctx.resolver,
            ctx.clock,
            ctx.retry,
            routing,
        );
        Self {
            streams: targets.into_iter().map(PartitionStream::new).collect(),
            heap: BinaryHeap::new(),
            spec: Arc::new(spec),
            ctx: fetch_ctx,
            primed: false,
            finished: false,
        }
    }

    /// Handle onto this merge's fetch telemetry; stays readable after
    /// the executor moves into a stream adapter.
    pub fn telemetry(&self) -> QueryTelemetry {
        self.ctx.telemetry.clone()
    }

    /// Pull the next item in global order.
    ///
    /// Returns `Ok(None)` once every partition is exhausted. Any fatal
    /// fetch error ends the sequence: the error is returned once and the
    /// executor yields `Ok(None)` from then on.
    pub async fn try_next(&mut self) -> Result<Option<DocumentRef>, QueryError> {
        if self.finished {
            return Ok(None);
        }

        if !self.primed {
            if let Err(error) = self.prime().await {
                self.finished = true;
                return Err(error);
            }
            self.primed = true;
        }

        let Some(Reverse(entry)) = self.heap.pop() else {
            self.finished = true;
            return Ok(None);
        };

        if let Err(error) = self.push_head(entry.stream_index).await {
            self.finished = true;
            return Err(error);
        }

        Ok(Some(entry.item))
    }

    /// Fetch every stream's first page concurrently, then seed the heap.
    async fn prime(&mut self) -> Result<(), QueryError> {
        let ctx = &self.ctx;
        futures::future::try_join_all(
            self.streams
                .iter_mut()
                .map(|stream| stream.fetch_next_page(ctx)),
        )
        .await?;

        for index in 0..self.streams.len() {
            self.push_head(index).await?;
        }
        Ok(())
    }

    /// Buffer the stream's next head, fetching as needed, and push it
    /// into the heap. Pages may legally be empty while a continuation
    /// remains, so refill until an item shows up or the stream ends.
    async fn push_head(&mut self, index: usize) -> Result<(), QueryError> {
        while !self.streams[index].has_buffered() && self.streams[index].has_more_pages() {
            self.streams[index].fetch_next_page(&self.ctx).await?;
        }

        if let Some(item) = self.streams[index].pop_buffered() {
            let range_min = self.streams[index].range().min_inclusive;
            self.heap.push(Reverse(HeapEntry {
                item,
                stream_index: index,
                range_min,
                spec: Arc::clone(&self.spec),
            }));
        }
        Ok(())
    }

    /// Adapt into a `futures::Stream`. The sequence is forward-only and
    /// cannot be restarted; re-iteration means re-issuing the query.
    pub fn into_stream(self) -> impl Stream<Item = Result<DocumentRef, QueryError>> + Send {
        futures::stream::try_unfold(self, |mut executor| async move {
            match executor.try_next().await? {
                Some(item) => Ok(Some((item, executor))),
                None => Ok(None),
            }
        })
    }
}
