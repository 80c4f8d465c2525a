//! Region Selection Strategies
//!
//! This module contains the strategies that pick which region serves an
//! outgoing fetch:
//!
//! - `ThompsonSamplingStrategy`: Gamma-posterior bandit over observed
//!   latencies
//! - `RoundRobinStrategy`: plain rotation, no latency adaptation
//!
//! Arm indices are stable for the lifetime of a strategy; index 0 is the
//! caller's local/default region.

mod round_robin;
mod thompson;

pub use round_robin::RoundRobinStrategy;
pub use thompson::ThompsonSamplingStrategy;

/// Index of a region arm
pub type RegionIndex = usize;

/// Trait for region selection strategies
pub trait RegionStrategy: Send + Sync {
    /// Pick the region for the next request.
    fn select(&self) -> RegionIndex;

    /// Feed back the observed latency of a completed request. Unknown
    /// indices are ignored; this never fails.
    fn record_latency(&self, region: RegionIndex, latency_ms: f64);

    /// Whether the caller should override `select` with an exploration
    /// draw for this request.
    fn should_explore(&self) -> bool {
        false
    }

    /// Pick a region for an exploration request.
    fn arm_to_explore(&self) -> RegionIndex {
        self.select()
    }

    /// Strategy name for logging
    fn name(&self) -> &'static str;
}
