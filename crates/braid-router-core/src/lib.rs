//! Braid Router - Query Routing Module
//!
//! Decides where a query's fetches go: which partitions own the data,
//! and which region serves each fetch.
//!
//! # Architecture
//!
//! ```text
//! Query request
//!     │
//!     ▼
//! ┌─────────────────────────┐
//! │    RoutingResolver      │  Which partitions?
//! │  (hash → range lookup,  │  (metadata memoized behind the
//! │   cached metadata)      │   single-flight cache)
//! └───────────┬─────────────┘
//!             │
//!             ▼
//! ┌─────────────────────────┐
//! │  RegionRoutedTransport  │  Which region?
//! │  (bandit-selected       │  (per-fetch Thompson sampling,
//! │   endpoint per fetch)   │   latency feedback on success)
//! └─────────────────────────┘
//! ```
//!
//! # Region Selection Strategies
//!
//! - **ThompsonSamplingStrategy**: Gamma-posterior bandit over observed
//!   latencies; favors the fastest region while still exploring
//! - **RoundRobinStrategy**: plain rotation, no latency adaptation

// Core modules
mod error;
mod partition;
mod resolver;

// Strategy module (contains all region selection strategies)
mod strategy;

// Region-routed transport decorator
mod region_routed;

// Re-exports: Error types
pub use error::RouterError;

// Re-exports: Partition routing
pub use partition::{hash_partition_key, target_ranges};

// Re-exports: Metadata resolution
pub use resolver::RoutingResolver;

// Re-exports: Strategy traits and implementations
pub use strategy::{RegionIndex, RegionStrategy, RoundRobinStrategy, ThompsonSamplingStrategy};

// Re-exports: Region routing
pub use region_routed::{RegionEndpoint, RegionRoutedTransport};
