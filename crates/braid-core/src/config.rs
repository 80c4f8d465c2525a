//! Configuration module for braid clients

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Client instance ID
    pub client_id: String,

    /// Candidate region names; index 0 is the local/default region
    pub regions: Vec<String>,

    /// Page fetch retry configuration
    pub retry: RetryConfig,

    /// Region selection bandit configuration
    pub bandit: BanditConfig,
}

/// Page fetch retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total fetch attempts per page acquisition, first try included
    pub max_attempts: u32,

    /// Delay between attempts
    pub backoff: Duration,
}

/// Region selection bandit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BanditConfig {
    /// Latency samples retained per region arm
    pub window_capacity: usize,

    /// Probability of overriding selection with an exploration draw
    pub exploration_probability: f64,

    /// Categorical weight of the local region during exploration
    pub local_region_weight: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_id: uuid::Uuid::new_v4().to_string(),
            regions: vec!["local".to_string()],
            retry: RetryConfig::default(),
            bandit: BanditConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(100),
        }
    }
}

impl Default for BanditConfig {
    fn default() -> Self {
        Self {
            window_capacity: 10,
            exploration_probability: 0.1,
            local_region_weight: 0.5,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = ClientConfig::default();

        // Client ID
        if let Ok(client_id) = std::env::var("BRAID_CLIENT_ID") {
            config.client_id = client_id;
        }

        // Regions
        if let Ok(regions) = std::env::var("BRAID_REGIONS") {
            let parsed: Vec<String> = regions
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !parsed.is_empty() {
                config.regions = parsed;
            }
        }

        // Retry policy
        if let Ok(attempts) = std::env::var("BRAID_MAX_FETCH_ATTEMPTS") {
            if let Ok(attempts) = attempts.parse() {
                config.retry.max_attempts = attempts;
            }
        }
        if let Ok(backoff_ms) = std::env::var("BRAID_RETRY_BACKOFF_MS") {
            if let Ok(backoff_ms) = backoff_ms.parse() {
                config.retry.backoff = Duration::from_millis(backoff_ms);
            }
        }

        config
    }
}
