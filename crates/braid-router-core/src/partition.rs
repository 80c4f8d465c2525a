//! Partition-key hashing and range targeting
//!
//! Maps a logical partition-key value into the 127-bit hash space and
//! resolves which partition ranges a query must touch: the single owning
//! range for a point lookup, or every range for a cross-partition scan.

use blake3::Hasher;
use tracing::trace;

use braid_hash::HashValue;
use braid_types::{PartitionKeyRange, RoutingMetadata, SortValue};

use crate::error::RouterError;

/// Hash a partition-key value into the hash space.
///
/// The digest input is type-tagged so that values of different types
/// never collide structurally (e.g. the string "1" and the number 1).
pub fn hash_partition_key(value: &SortValue) -> HashValue {
    let mut hasher = Hasher::new();
    match value {
        SortValue::Null => {
            hasher.update(&[0x00]);
        }
        SortValue::Bool(b) => {
            hasher.update(&[0x01, *b as u8]);
        }
        SortValue::Number(n) => {
            hasher.update(&[0x02]);
            hasher.update(&n.to_be_bytes());
        }
        SortValue::Text(s) => {
            hasher.update(&[0x03]);
            hasher.update(s.as_bytes());
        }
    }
    let digest = hasher.finalize();
    let mut prefix = [0u8; 16];
    prefix.copy_from_slice(&digest.as_bytes()[..16]);
    HashValue::reduced(u128::from_be_bytes(prefix))
}

/// Resolve the partition ranges a query must scan.
///
/// With a partition key, exactly the range owning its hash; without one,
/// every range in the layout.
pub fn target_ranges<'a>(
    metadata: &'a RoutingMetadata,
    partition_key: Option<&SortValue>,
) -> Result<Vec<&'a PartitionKeyRange>, RouterError> {
    match partition_key {
        Some(value) => {
            let hash = hash_partition_key(value);
            trace!(collection_id = %metadata.collection_id, hash = %hash, "Partition key hashed");
            let range = metadata
                .range_containing(hash)
                .ok_or_else(|| RouterError::PartitionNotFound(hash.to_string()))?;
            Ok(vec![range])
        }
        None => Ok(metadata.ranges.iter().collect()),
    }
}
