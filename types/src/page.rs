//! Paged fetch results

use serde::{Deserialize, Serialize};

use crate::document::DocumentRef;

/// Partition identifier (string-based, assigned by the service)
pub type PartitionId = String;

/// One page of a partition's result stream
///
/// Items are locally sorted by the query's sort specification. A `None`
/// continuation signals that the partition's stream is exhausted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Items in this page, locally sorted
    pub items: Vec<DocumentRef>,

    /// Opaque cursor for the next page, or `None` when exhausted
    pub next_continuation: Option<String>,
}

impl Page {
    pub fn new(items: Vec<DocumentRef>, next_continuation: Option<String>) -> Self {
        Self {
            items,
            next_continuation,
        }
    }

    /// Terminal page with no further continuation
    pub fn last(items: Vec<DocumentRef>) -> Self {
        Self::new(items, None)
    }
}
