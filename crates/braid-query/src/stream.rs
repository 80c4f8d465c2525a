//! Per-partition page streams
//!
//! A `PartitionStream` drives one partition's continuation-token-driven
//! page source: it buffers the last fetched page's items, tracks the
//! cursor state, and absorbs transient failures up to the configured
//! attempt bound. A stale-routing failure refreshes the shared metadata
//! cache (coalesced across partitions) before the fetch is retried.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use braid_core::{Clock, FetchError, RetryConfig, Transport};
use braid_types::{DocumentRef, Page, PartitionKeyRange, RoutingMetadata};
use braid_router_core::RoutingResolver;

use crate::error::QueryError;
use crate::telemetry::{FetchExecutionRange, QueryTelemetry};

/// Shared dependencies of every partition stream in one merge
pub(crate) struct FetchContext {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) resolver: Arc<RoutingResolver>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) telemetry: QueryTelemetry,
    pub(crate) retry: RetryConfig,
    pub(crate) collection_id: String,
    /// Current metadata snapshot; replaced after a stale-routing refresh
    /// so later refreshes carry the newest obsolescence token.
    routing: Mutex<Arc<RoutingMetadata>>,
}

impl FetchContext {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        resolver: Arc<RoutingResolver>,
        clock: Arc<dyn Clock>,
        retry: RetryConfig,
        routing: Arc<RoutingMetadata>,
    ) -> Self {
        Self {
            transport,
            resolver,
            clock,
            telemetry: QueryTelemetry::new(),
            retry,
            collection_id: routing.collection_id.clone(),
            routing: Mutex::new(routing),
        }
    }

    fn routing_snapshot(&self) -> Arc<RoutingMetadata> {
        Arc::clone(&self.routing.lock())
    }

    fn store_routing(&self, fresh: Arc<RoutingMetadata>) {
        *self.routing.lock() = fresh;
    }
}

/// Cursor state of one partition's paged stream
enum Cursor {
    /// First page not yet requested
    NotStarted,
    /// Opaque token for the next page
    Continuation(String),
    /// The service signalled the end of the stream
    Exhausted,
}

/// One partition's locally sorted, paginated stream
pub(crate) struct PartitionStream {
    range: PartitionKeyRange,
    cursor: Cursor,
    buffer: VecDeque<DocumentRef>,
}

impl PartitionStream {
    pub(crate) fn new(range: PartitionKeyRange) -> Self {
        Self {
            range,
            cursor: Cursor::NotStarted,
            buffer: VecDeque::new(),
        }
    }

    pub(crate) fn range(&self) -> &PartitionKeyRange {
        &self.range
    }

    pub(crate) fn has_buffered(&self) -> bool {
        !self.buffer.is_empty()
    }

    pub(crate) fn has_more_pages(&self) -> bool {
        !matches!(self.cursor, Cursor::Exhausted)
    }

    pub(crate) fn pop_buffered(&mut self) -> Option<DocumentRef> {
        self.buffer.pop_front()
    }

    /// Acquire the next page into the buffer.
    ///
    /// One `FetchExecutionRange` is recorded per call, covering every
    /// attempt the acquisition needed. Transient and stale-routing
    /// failures each consume one attempt; a stale-routing failure also
    /// refreshes the metadata cache before the retry. Exhausting the
    /// attempt bound, or any permanent failure, is fatal to the merge.
    pub(crate) async fn fetch_next_page(&mut self, ctx: &FetchContext) -> Result<(), QueryError> {
        if matches!(self.cursor, Cursor::Exhausted) {
            return Ok(());
        }

        let activity_id = Uuid::new_v4();
        let start_time = ctx.clock.now();
        let mut retry_count = 0u32;
        let max_attempts = ctx.retry.max_attempts.max(1);

        let outcome = loop {
            let continuation = match &self.cursor {
                Cursor::NotStarted => None,
                Cursor::Continuation(token) => Some(token.as_str()),
                Cursor::Exhausted => unreachable!("checked above"),
            };

            match ctx.transport.fetch_page(&self.range.id, continuation).await {
                Ok(page) => break Ok(page),
                Err(error) => {
                    let attempts_spent = retry_count + 1;
                    match error {
                        FetchError::Permanent(_) => {
                            break Err(QueryError::PermanentFailure {
                                partition_id: self.range.id.clone(),
                                source: error,
                            });
                        }
                        _ if attempts_spent >= max_attempts => {
                            break Err(QueryError::RetriesExhausted {
                                partition_id: self.range.id.clone(),
                                attempts: max_attempts,
                                source: error,
                            });
                        }
                        FetchError::Transient(_) => {
                            retry_count += 1;
                            warn!(
                                partition_id = %self.range.id,
                                retry_count = retry_count,
                                "Transient fetch failure, retrying"
                            );
                            tokio::time::sleep(ctx.retry.backoff).await;
                        }
                        FetchError::StaleRouting(_) => {
                            retry_count += 1;
                            // One coalesced refresh before the retry.
                            let snapshot = ctx.routing_snapshot();
                            match ctx
                                .resolver
                                .resolve_obsolete(&ctx.collection_id, &snapshot)
                                .await
                            {
                                Ok(fresh) => ctx.store_routing(fresh),
                                Err(refresh_error) => {
                                    break Err(QueryError::Routing(refresh_error))
                                }
                            }
                        }
                    }
                }
            }
        };

        let end_time = ctx.clock.now();
        match outcome {
            Ok(page) => {
                ctx.telemetry.record(FetchExecutionRange {
                    activity_id,
                    partition_id: self.range.id.clone(),
                    start_time,
                    end_time,
                    document_count: page.items.len(),
                    retry_count,
                });
                self.apply_page(page);
                Ok(())
            }
            Err(error) => {
                ctx.telemetry.record(FetchExecutionRange {
                    activity_id,
                    partition_id: self.range.id.clone(),
                    start_time,
                    end_time,
                    document_count: 0,
                    retry_count,
                });
                Err(error)
            }
        }
    }

    fn apply_page(&mut self, page: Page) {
        self.cursor = match page.next_continuation {
            Some(token) => Cursor::Continuation(token),
            None => Cursor::Exhausted,
        };
        self.buffer.extend(page.items);
    }
}
