//! Braid Core - Shared client infrastructure
//!
//! This crate provides the pieces every other braid layer builds on:
//! client configuration, the clock seam used to timestamp telemetry, the
//! transport contract the routing and merge layers call through, and the
//! single-flight async cache that memoizes routing metadata.

pub mod cache;
pub mod clock;
pub mod config;
pub mod transport;

pub use cache::{AsyncCache, CacheRefreshError};
pub use clock::{Clock, SystemClock};
pub use config::{BanditConfig, ClientConfig, RetryConfig};
pub use transport::{FetchError, Transport};
