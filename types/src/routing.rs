//! Partition-range routing metadata
//!
//! The remote service splits each collection's 127-bit hash space into
//! contiguous partition ranges. Routing metadata is the client-side
//! snapshot of that layout: an ordered list of `[min, max)` ranges, each
//! owned by one physical partition.

use braid_hash::HashValue;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::page::PartitionId;

/// Malformed routing metadata
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoutingMetadataError {
    #[error("Routing metadata contains no partition ranges")]
    Empty,

    #[error("Partition range {0} has min >= max")]
    InvertedRange(PartitionId),

    #[error("Partition ranges {0} and {1} are out of order or overlap")]
    Overlap(PartitionId, PartitionId),
}

/// A contiguous sub-interval of the hash space owned by one partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionKeyRange {
    /// Owning partition
    pub id: PartitionId,

    /// Inclusive lower bound
    pub min_inclusive: HashValue,

    /// Exclusive upper bound
    pub max_exclusive: HashValue,
}

impl PartitionKeyRange {
    pub fn new(id: impl Into<PartitionId>, min_inclusive: HashValue, max_exclusive: HashValue) -> Self {
        Self {
            id: id.into(),
            min_inclusive,
            max_exclusive,
        }
    }

    /// Whether a hash falls inside `[min_inclusive, max_exclusive)`
    pub fn contains(&self, hash: HashValue) -> bool {
        self.min_inclusive <= hash && hash < self.max_exclusive
    }
}

/// Client-side snapshot of a collection's partition layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingMetadata {
    /// Collection this layout belongs to
    pub collection_id: String,

    /// Partition ranges, ascending by lower bound
    pub ranges: Vec<PartitionKeyRange>,
}

impl RoutingMetadata {
    pub fn new(collection_id: impl Into<String>, ranges: Vec<PartitionKeyRange>) -> Self {
        Self {
            collection_id: collection_id.into(),
            ranges,
        }
    }

    /// Check structural invariants: at least one range, each range
    /// non-empty, ranges sorted by lower bound without overlap.
    pub fn validate(&self) -> Result<(), RoutingMetadataError> {
        if self.ranges.is_empty() {
            return Err(RoutingMetadataError::Empty);
        }
        for range in &self.ranges {
            if range.min_inclusive >= range.max_exclusive {
                return Err(RoutingMetadataError::InvertedRange(range.id.clone()));
            }
        }
        for pair in self.ranges.windows(2) {
            if pair[0].max_exclusive > pair[1].min_inclusive {
                return Err(RoutingMetadataError::Overlap(
                    pair[0].id.clone(),
                    pair[1].id.clone(),
                ));
            }
        }
        Ok(())
    }

    /// Find the range owning a hash, if any
    pub fn range_containing(&self, hash: HashValue) -> Option<&PartitionKeyRange> {
        self.ranges.iter().find(|range| range.contains(hash))
    }
}
