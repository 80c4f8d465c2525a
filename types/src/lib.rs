// ========== Core Modules ==========
pub mod document;
pub mod page;
pub mod routing;

// Export commonly used types
pub use document::{DocumentRef, SortField, SortOrder, SortSpec, SortValue};
pub use page::{Page, PartitionId};
pub use routing::{PartitionKeyRange, RoutingMetadata, RoutingMetadataError};

// Re-export the hash-space type from braid-hash
pub use braid_hash::{HashError, HashValue};
