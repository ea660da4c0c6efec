//! Caching-opportunity scoring
//!
//! Ranks endpoints whose traffic is read-heavy and low-error as caching
//! candidates, with savings estimates derived from the endpoint's finalized
//! stats and the assumed hit rate.

use std::collections::BTreeMap;

use crate::analysis::aggregator::round2;
use crate::config::CachingConfig;
use crate::models::{CachingRecommendation, CostSavings, EndpointStats};

/// Scores endpoints as caching candidates.
pub struct CachingAdvisor {
    config: CachingConfig,
}

impl CachingAdvisor {
    pub fn new(config: CachingConfig) -> Self {
        CachingAdvisor { config }
    }

    /// Produce recommendations, ranked by estimated requests saved
    /// (endpoint name breaks ties).
    pub fn recommend(
        &self,
        endpoint_stats: &BTreeMap<String, EndpointStats>,
    ) -> Vec<CachingRecommendation> {
        let mut recommendations: Vec<CachingRecommendation> = endpoint_stats
            .iter()
            .filter_map(|(endpoint, stats)| self.evaluate(endpoint, stats))
            .collect();

        recommendations.sort_by(|a, b| {
            b.estimated_requests_saved
                .cmp(&a.estimated_requests_saved)
                .then_with(|| a.endpoint.cmp(&b.endpoint))
        });
        recommendations
    }

    fn evaluate(&self, endpoint: &str, stats: &EndpointStats) -> Option<CachingRecommendation> {
        if stats.request_count < self.config.min_requests {
            return None;
        }

        let get_count = stats.methods.get("GET").copied().unwrap_or(0);
        let get_ratio = get_count as f64 / stats.request_count as f64;
        if get_ratio < self.config.min_get_ratio {
            return None;
        }
        if stats.error_rate >= self.config.max_error_rate {
            return None;
        }

        let estimated_requests_saved =
            (stats.request_count as f64 * self.config.assumed_hit_rate).round() as u64;

        // Improvement against the assumed cached response time; an endpoint
        // already faster than a cache hit gains nothing.
        let avg = stats.avg_response_time_ms;
        let estimated_improvement_percent = if avg > self.config.cached_response_time_ms {
            round2((avg - self.config.cached_response_time_ms) / avg * 100.0)
        } else {
            0.0
        };

        let estimated_bytes_saved = stats
            .avg_response_size_bytes
            .map(|size| (size * estimated_requests_saved as f64).round() as u64);

        Some(CachingRecommendation {
            endpoint: endpoint.to_string(),
            request_count: stats.request_count,
            get_ratio: round2(get_ratio),
            estimated_requests_saved,
            estimated_improvement_percent,
            estimated_bytes_saved,
            cost_savings: cost_savings_bucket(estimated_requests_saved),
        })
    }
}

/// Bucket boundaries: low under 1k requests saved, medium under 10k,
/// high above.
fn cost_savings_bucket(requests_saved: u64) -> CostSavings {
    if requests_saved >= 10_000 {
        CostSavings::High
    } else if requests_saved >= 1_000 {
        CostSavings::Medium
    } else {
        CostSavings::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;

    fn stats(count: u64, get_count: u64, error_count: u64, avg_ms: f64) -> EndpointStats {
        let mut methods = BTreeMap::new();
        if get_count > 0 {
            methods.insert("GET".to_string(), get_count);
        }
        if count > get_count {
            methods.insert("POST".to_string(), count - get_count);
        }
        EndpointStats {
            request_count: count,
            avg_response_time_ms: avg_ms,
            min_response_time_ms: avg_ms,
            max_response_time_ms: avg_ms,
            error_count,
            error_rate: error_count as f64 / count as f64,
            status_codes: BTreeMap::new(),
            methods,
            avg_response_size_bytes: None,
        }
    }

    fn advisor() -> CachingAdvisor {
        CachingAdvisor::new(AnalysisConfig::default().caching)
    }

    fn single(entry: EndpointStats) -> BTreeMap<String, EndpointStats> {
        let mut map = BTreeMap::new();
        map.insert("/api/cached".to_string(), entry);
        map
    }

    #[test]
    fn test_get_heavy_low_error_endpoint_recommended() {
        let recs = advisor().recommend(&single(stats(10, 10, 0, 50.0)));

        assert_eq!(recs.len(), 1);
        let rec = &recs[0];
        assert_eq!(rec.endpoint, "/api/cached");
        assert_eq!(rec.estimated_requests_saved, 7);
        assert!(rec.estimated_requests_saved > 0);
        // (50 - 5) / 50 * 100
        assert_eq!(rec.estimated_improvement_percent, 90.0);
        assert_eq!(rec.cost_savings, CostSavings::Low);
    }

    #[test]
    fn test_below_request_floor_not_recommended() {
        let recs = advisor().recommend(&single(stats(9, 9, 0, 50.0)));
        assert!(recs.is_empty());
    }

    #[test]
    fn test_write_heavy_endpoint_not_recommended() {
        // 50% GET is well under the 80% criterion
        let recs = advisor().recommend(&single(stats(20, 10, 0, 50.0)));
        assert!(recs.is_empty());
    }

    #[test]
    fn test_get_ratio_boundary_inclusive() {
        let recs = advisor().recommend(&single(stats(10, 8, 0, 50.0)));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].get_ratio, 0.8);
    }

    #[test]
    fn test_error_rate_at_limit_excluded() {
        // 1 error in 50 requests = 2%, which must be strictly below the limit
        let recs = advisor().recommend(&single(stats(50, 50, 1, 50.0)));
        assert!(recs.is_empty());
    }

    #[test]
    fn test_fast_endpoint_has_zero_improvement() {
        let recs = advisor().recommend(&single(stats(10, 10, 0, 3.0)));
        assert_eq!(recs[0].estimated_improvement_percent, 0.0);
    }

    #[test]
    fn test_cost_savings_buckets() {
        assert_eq!(cost_savings_bucket(999), CostSavings::Low);
        assert_eq!(cost_savings_bucket(1_000), CostSavings::Medium);
        assert_eq!(cost_savings_bucket(9_999), CostSavings::Medium);
        assert_eq!(cost_savings_bucket(10_000), CostSavings::High);
    }

    #[test]
    fn test_bytes_saved_from_response_sizes() {
        let mut entry = stats(10, 10, 0, 50.0);
        entry.avg_response_size_bytes = Some(2048.0);

        let recs = advisor().recommend(&single(entry));
        assert_eq!(recs[0].estimated_bytes_saved, Some(2048 * 7));
    }

    #[test]
    fn test_ranked_by_requests_saved() {
        let mut map = BTreeMap::new();
        map.insert("/api/small".to_string(), stats(10, 10, 0, 50.0));
        map.insert("/api/big".to_string(), stats(5000, 5000, 0, 50.0));
        map.insert("/api/also-small".to_string(), stats(10, 10, 0, 50.0));

        let recs = advisor().recommend(&map);
        let order: Vec<&str> = recs.iter().map(|r| r.endpoint.as_str()).collect();
        assert_eq!(order, vec!["/api/big", "/api/also-small", "/api/small"]);
        assert_eq!(recs[0].cost_savings, CostSavings::Medium);
    }
}
