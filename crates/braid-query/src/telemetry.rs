//! Fetch execution telemetry
//!
//! One `FetchExecutionRange` is recorded per page acquisition, retries
//! included, failed acquisitions included. Callers read them through the
//! cloneable `QueryTelemetry` handle, which stays valid after the merge
//! executor has been handed off to a stream adapter.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::SystemTime;
use uuid::Uuid;

use braid_types::PartitionId;

/// Execution record of one page acquisition
#[derive(Debug, Clone, Serialize)]
pub struct FetchExecutionRange {
    /// Correlation id of this acquisition
    pub activity_id: Uuid,

    /// Partition the page was fetched from
    pub partition_id: PartitionId,

    /// Wall-clock start of the acquisition
    pub start_time: SystemTime,

    /// Wall-clock end, after any retries
    pub end_time: SystemTime,

    /// Documents returned (0 for failed acquisitions)
    pub document_count: usize,

    /// Transient failures absorbed during the acquisition
    pub retry_count: u32,
}

/// Shared accumulator of fetch execution records
#[derive(Clone, Default)]
pub struct QueryTelemetry {
    inner: Arc<Mutex<Vec<FetchExecutionRange>>>,
}

impl QueryTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, range: FetchExecutionRange) {
        self.inner.lock().push(range);
    }

    /// Copy of all records so far
    pub fn snapshot(&self) -> Vec<FetchExecutionRange> {
        self.inner.lock().clone()
    }

    /// Total documents fetched across all acquisitions
    pub fn total_documents(&self) -> usize {
        self.inner.lock().iter().map(|r| r.document_count).sum()
    }

    /// Total transient retries across all acquisitions
    pub fn total_retries(&self) -> u32 {
        self.inner.lock().iter().map(|r| r.retry_count).sum()
    }
}
