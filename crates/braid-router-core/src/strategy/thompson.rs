//! Thompson Sampling Strategy for Region Selection
//!
//! Online minimization bandit: each region arm keeps a Gamma posterior
//! over its observed latency, and selection draws one sample per arm and
//! takes the argmin. Arms with sustained low latency concentrate their
//! draws near that latency and win most selections, while the posterior
//! spread keeps occasionally sampling the others.
//!
//! The posterior parameters track a bounded window of recent samples:
//! `alpha = prior + sum(window)`, `beta = prior + len(window)`, so
//! `alpha / beta` follows the windowed running mean and old latency
//! history ages out.

use parking_lot::Mutex;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use rand_distr::Gamma;
use std::collections::VecDeque;
use tracing::trace;

use braid_core::BanditConfig;

use super::{RegionIndex, RegionStrategy};

/// Per-region posterior state
struct BanditArm {
    /// Gamma shape parameter
    alpha: f64,
    /// Gamma rate parameter
    beta: f64,
    /// Recent latency samples, oldest first
    window: VecDeque<f64>,
}

impl BanditArm {
    fn with_prior(prior: f64) -> Self {
        Self {
            alpha: prior,
            beta: prior,
            window: VecDeque::new(),
        }
    }
}

/// Gamma-posterior latency bandit over region arms
pub struct ThompsonSamplingStrategy {
    arms: Vec<Mutex<BanditArm>>,
    /// Latency samples retained per arm
    window_capacity: usize,
    /// Probability that a request is diverted to exploration
    exploration_probability: f64,
    /// Categorical exploration weights, local arm first. WeightedIndex
    /// normalizes these at sampling time.
    exploration_weights: Vec<f64>,
}

impl ThompsonSamplingStrategy {
    /// Create a strategy over `region_count` arms with default tuning.
    /// Arm 0 is the local/default region.
    pub fn new(region_count: usize) -> Self {
        Self::with_config(region_count, &BanditConfig::default())
    }

    /// Create with explicit bandit configuration
    pub fn with_config(region_count: usize, config: &BanditConfig) -> Self {
        // The local arm starts with an informative prior favoring it;
        // the rest start uninformative.
        let arms = (0..region_count)
            .map(|index| {
                let prior = if index == 0 { 0.5 } else { 1.0 };
                Mutex::new(BanditArm::with_prior(prior))
            })
            .collect();

        let exploration_weights = if region_count <= 1 {
            vec![1.0]
        } else {
            let local = config.local_region_weight.clamp(0.0, 1.0);
            let remote = (1.0 - local) / (region_count - 1) as f64;
            std::iter::once(local)
                .chain(std::iter::repeat(remote).take(region_count - 1))
                .collect()
        };

        Self {
            arms,
            window_capacity: config.window_capacity.max(1),
            exploration_probability: config.exploration_probability.clamp(0.0, 1.0),
            exploration_weights,
        }
    }

    /// Number of arms
    pub fn region_count(&self) -> usize {
        self.arms.len()
    }

    #[cfg(test)]
    fn arm_parameters(&self, region: RegionIndex) -> (f64, f64) {
        let arm = self.arms[region].lock();
        (arm.alpha, arm.beta)
    }
}

impl RegionStrategy for ThompsonSamplingStrategy {
    fn select(&self) -> RegionIndex {
        let mut rng = rand::thread_rng();
        let mut best = 0;
        let mut best_draw = f64::INFINITY;
        for (index, arm) in self.arms.iter().enumerate() {
            // Snapshot the parameters; sampling happens outside the lock.
            let (alpha, beta) = {
                let arm = arm.lock();
                (arm.alpha, arm.beta)
            };
            // rand_distr parameterizes Gamma by shape and scale; the arm
            // tracks shape and rate.
            let draw = match Gamma::new(alpha, 1.0 / beta) {
                Ok(gamma) => gamma.sample(&mut rng),
                Err(_) => f64::INFINITY,
            };
            if draw < best_draw {
                best_draw = draw;
                best = index;
            }
        }
        trace!(region = best, "Region selected by posterior draw");
        best
    }

    fn record_latency(&self, region: RegionIndex, latency_ms: f64) {
        let Some(arm) = self.arms.get(region) else {
            return;
        };
        let mut arm = arm.lock();
        arm.window.push_back(latency_ms);
        if arm.window.len() > self.window_capacity {
            if let Some(evicted) = arm.window.pop_front() {
                arm.alpha -= evicted;
                arm.beta -= 1.0;
            }
        }
        arm.alpha += latency_ms;
        arm.beta += 1.0;
    }

    fn should_explore(&self) -> bool {
        rand::thread_rng().gen_bool(self.exploration_probability)
    }

    fn arm_to_explore(&self) -> RegionIndex {
        if self.arms.len() <= 1 {
            return 0;
        }
        match WeightedIndex::new(&self.exploration_weights) {
            Ok(categorical) => categorical.sample(&mut rand::thread_rng()),
            Err(_) => 0,
        }
    }

    fn name(&self) -> &'static str {
        "ThompsonSampling"
    }
}
