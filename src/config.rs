use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for an analysis run
///
/// Every threshold the heuristics use lives here so tests and operators can
/// override them; the defaults are the documented contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Anomaly detection thresholds
    pub anomaly: AnomalyConfig,
    /// Caching advisor thresholds
    pub caching: CachingConfig,
    /// Slow-endpoint severity thresholds
    pub performance: PerformanceConfig,
    /// Maximum length of the top-users ranking
    pub top_user_count: usize,
}

/// Anomaly detection thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyConfig {
    /// A single request is a spike when response_time_ms is strictly
    /// greater than this
    pub spike_threshold_ms: f64,
    /// Status codes at or above this are server errors
    pub server_error_status: u16,
    /// Endpoint error rate (errors / requests) at or above this marks the
    /// endpoint suspicious
    pub endpoint_error_ratio: f64,
    /// Endpoint spike rate (spikes / requests) at or above this marks the
    /// endpoint suspicious
    pub endpoint_spike_ratio: f64,
    /// Minimum requests before an endpoint can be flagged, so low-traffic
    /// endpoints don't false-positive
    pub endpoint_min_requests: u64,
    /// A user is suspicious when their request count exceeds this multiple
    /// of the mean per-user count
    pub user_request_multiplier: f64,
    /// Minimum requests before a user can be flagged
    pub user_min_requests: u64,
}

/// Caching advisor thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachingConfig {
    /// Minimum requests (inclusive) before an endpoint is considered
    pub min_requests: u64,
    /// Minimum GET share of the endpoint's traffic
    pub min_get_ratio: f64,
    /// Endpoint error rate must be strictly below this
    pub max_error_rate: f64,
    /// Assumed cache hit rate used for the requests-saved estimate
    pub assumed_hit_rate: f64,
    /// Assumed response time of a cache hit, in ms
    pub cached_response_time_ms: f64,
}

/// Slow-endpoint severity thresholds, in ms of average response time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    pub medium_ms: f64,
    pub high_ms: f64,
    pub critical_ms: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            anomaly: AnomalyConfig {
                spike_threshold_ms: 1000.0,
                server_error_status: 500,
                endpoint_error_ratio: 0.5,
                endpoint_spike_ratio: 0.5,
                endpoint_min_requests: 10,
                user_request_multiplier: 3.0,
                user_min_requests: 10,
            },
            caching: CachingConfig {
                min_requests: 10,
                min_get_ratio: 0.8,
                max_error_rate: 0.02,
                assumed_hit_rate: 0.7,
                cached_response_time_ms: 5.0,
            },
            performance: PerformanceConfig {
                medium_ms: 500.0,
                high_ms: 1000.0,
                critical_ms: 2000.0,
            },
            top_user_count: 5,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a file
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: AnalysisConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file(&self, path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = AnalysisConfig::default();
        assert_eq!(config.anomaly.spike_threshold_ms, 1000.0);
        assert_eq!(config.anomaly.server_error_status, 500);
        assert_eq!(config.caching.min_get_ratio, 0.8);
        assert_eq!(config.top_user_count, 5);
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = AnalysisConfig::default();
        config.anomaly.spike_threshold_ms = 750.0;
        config.caching.min_requests = 50;
        config.to_file(&path).unwrap();

        let loaded = AnalysisConfig::from_file(&path).unwrap();
        assert_eq!(loaded.anomaly.spike_threshold_ms, 750.0);
        assert_eq!(loaded.caching.min_requests, 50);
        assert_eq!(loaded.performance.critical_ms, 2000.0);
    }
}
