//! Braid Query - Ordered Cross-Partition Merge
//!
//! Merges the independently paginated result streams of N partitions
//! into one globally ordered lazy sequence.
//!
//! ```text
//! partition p0: [page][page][page]──┐
//! partition p1: [page][page]────────┼──► min-heap over stream heads ──► ordered items
//! partition p2: [page]──────────────┘         (sort spec, then
//!                                              range lower bound)
//! ```
//!
//! Each partition's own stream is already locally sorted by the query's
//! sort specification; the merge only ever compares stream heads. Page
//! fetches are retried on transient failures, refresh the routing cache
//! on stale-routing failures, and record per-acquisition telemetry.

mod error;
mod merge;
mod stream;
mod telemetry;

pub use error::QueryError;
pub use merge::{OrderedMergeExecutor, QueryContext};
pub use telemetry::{FetchExecutionRange, QueryTelemetry};
