//! Slow-endpoint classification

use std::collections::BTreeMap;

use crate::config::PerformanceConfig;
use crate::models::{EndpointStats, PerformanceIssue, Severity};

/// Classifies endpoints by average response time into severity buckets.
pub struct PerformanceClassifier {
    config: PerformanceConfig,
}

impl PerformanceClassifier {
    pub fn new(config: PerformanceConfig) -> Self {
        PerformanceClassifier { config }
    }

    /// Report endpoints at or above the medium threshold, slowest first
    /// (endpoint name breaks ties).
    pub fn find_issues(
        &self,
        endpoint_stats: &BTreeMap<String, EndpointStats>,
    ) -> Vec<PerformanceIssue> {
        let mut issues: Vec<PerformanceIssue> = endpoint_stats
            .iter()
            .filter_map(|(endpoint, stats)| {
                self.classify(stats.avg_response_time_ms)
                    .map(|severity| PerformanceIssue {
                        endpoint: endpoint.clone(),
                        request_count: stats.request_count,
                        avg_response_time_ms: stats.avg_response_time_ms,
                        severity,
                    })
            })
            .collect();

        issues.sort_by(|a, b| {
            b.avg_response_time_ms
                .total_cmp(&a.avg_response_time_ms)
                .then_with(|| a.endpoint.cmp(&b.endpoint))
        });
        issues
    }

    fn classify(&self, avg_ms: f64) -> Option<Severity> {
        if avg_ms >= self.config.critical_ms {
            Some(Severity::Critical)
        } else if avg_ms >= self.config.high_ms {
            Some(Severity::High)
        } else if avg_ms >= self.config.medium_ms {
            Some(Severity::Medium)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;

    fn stats(count: u64, avg_ms: f64) -> EndpointStats {
        EndpointStats {
            request_count: count,
            avg_response_time_ms: avg_ms,
            min_response_time_ms: avg_ms,
            max_response_time_ms: avg_ms,
            error_count: 0,
            error_rate: 0.0,
            status_codes: BTreeMap::new(),
            methods: BTreeMap::new(),
            avg_response_size_bytes: None,
        }
    }

    fn classifier() -> PerformanceClassifier {
        PerformanceClassifier::new(AnalysisConfig::default().performance)
    }

    #[test]
    fn test_severity_boundaries() {
        let mut map = BTreeMap::new();
        map.insert("/fast".to_string(), stats(10, 499.9));
        map.insert("/medium".to_string(), stats(10, 500.0));
        map.insert("/high".to_string(), stats(10, 1000.0));
        map.insert("/critical".to_string(), stats(10, 2000.0));

        let issues = classifier().find_issues(&map);
        assert_eq!(issues.len(), 3);
        assert_eq!(issues[0].endpoint, "/critical");
        assert_eq!(issues[0].severity, Severity::Critical);
        assert_eq!(issues[1].severity, Severity::High);
        assert_eq!(issues[2].severity, Severity::Medium);
    }

    #[test]
    fn test_sorted_slowest_first_name_breaks_ties() {
        let mut map = BTreeMap::new();
        map.insert("/b".to_string(), stats(10, 800.0));
        map.insert("/a".to_string(), stats(10, 800.0));
        map.insert("/c".to_string(), stats(10, 900.0));

        let order: Vec<String> = classifier()
            .find_issues(&map)
            .into_iter()
            .map(|i| i.endpoint)
            .collect();
        assert_eq!(order, vec!["/c", "/a", "/b"]);
    }

    #[test]
    fn test_fast_endpoints_not_reported() {
        let mut map = BTreeMap::new();
        map.insert("/fast".to_string(), stats(1000, 50.0));
        assert!(classifier().find_issues(&map).is_empty());
    }
}
