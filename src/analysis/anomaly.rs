//! Fixed-threshold anomaly detection
//!
//! Flags individual requests (response-time spikes, server errors) and
//! aggregate behavior (suspicious endpoints and users). All thresholds come
//! from [`AnomalyConfig`]; the same input always yields the same flags in
//! the same order: per-record flags in record order, then endpoints in key
//! order, then users in first-seen order.

use std::collections::HashMap;

use crate::analysis::aggregator::Aggregates;
use crate::config::AnomalyConfig;
use crate::models::{Anomaly, AnomalyKind, LogRecord};

/// Detects anomalies in a validated batch using fixed thresholds.
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        AnomalyDetector { config }
    }

    /// Run all heuristics over the batch and its aggregates.
    pub fn detect(&self, records: &[LogRecord], aggregates: &Aggregates) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();
        let mut spikes_by_endpoint: HashMap<&str, u64> = HashMap::new();

        for (index, record) in records.iter().enumerate() {
            if record.response_time_ms > self.config.spike_threshold_ms {
                *spikes_by_endpoint.entry(record.endpoint.as_str()).or_insert(0) += 1;
                anomalies.push(self.spike_anomaly(index, record));
            }
            if record.status_code >= self.config.server_error_status {
                anomalies.push(self.server_error_anomaly(index, record));
            }
        }

        self.check_endpoints(aggregates, &spikes_by_endpoint, &mut anomalies);
        self.check_users(aggregates, &mut anomalies);

        anomalies
    }

    fn spike_anomaly(&self, index: usize, record: &LogRecord) -> Anomaly {
        Anomaly {
            kind: AnomalyKind::ResponseTimeSpike,
            severity: severity_for_ratio(record.response_time_ms / self.config.spike_threshold_ms),
            endpoint: Some(record.endpoint.clone()),
            user_id: Some(record.user_id.clone()),
            record_index: Some(index),
            timestamp: Some(record.timestamp),
            description: format!(
                "Request to '{}' took {} ms (threshold: {} ms).",
                record.endpoint, record.response_time_ms, self.config.spike_threshold_ms
            ),
        }
    }

    fn server_error_anomaly(&self, index: usize, record: &LogRecord) -> Anomaly {
        Anomaly {
            kind: AnomalyKind::ServerError,
            severity: 8,
            endpoint: Some(record.endpoint.clone()),
            user_id: Some(record.user_id.clone()),
            record_index: Some(index),
            timestamp: Some(record.timestamp),
            description: format!(
                "Request to '{}' returned server error status {}.",
                record.endpoint, record.status_code
            ),
        }
    }

    /// Flag endpoints whose error or spike share of traffic crosses the
    /// configured ratios. The request floor keeps low-traffic endpoints
    /// from tripping on a handful of bad requests.
    fn check_endpoints(
        &self,
        aggregates: &Aggregates,
        spikes_by_endpoint: &HashMap<&str, u64>,
        anomalies: &mut Vec<Anomaly>,
    ) {
        for (endpoint, stats) in &aggregates.endpoint_stats {
            if stats.request_count < self.config.endpoint_min_requests {
                continue;
            }

            let spike_count = spikes_by_endpoint.get(endpoint.as_str()).copied().unwrap_or(0);
            let spike_rate = spike_count as f64 / stats.request_count as f64;

            let error_score = stats.error_rate / self.config.endpoint_error_ratio;
            let spike_score = spike_rate / self.config.endpoint_spike_ratio;
            if error_score < 1.0 && spike_score < 1.0 {
                continue;
            }

            let description = if error_score >= spike_score {
                format!(
                    "Endpoint '{}' has {} errors in {} requests ({:.0}% error rate, threshold: {:.0}%).",
                    endpoint,
                    stats.error_count,
                    stats.request_count,
                    stats.error_rate * 100.0,
                    self.config.endpoint_error_ratio * 100.0
                )
            } else {
                format!(
                    "Endpoint '{}' has {} response-time spikes in {} requests ({:.0}% spike rate, threshold: {:.0}%).",
                    endpoint,
                    spike_count,
                    stats.request_count,
                    spike_rate * 100.0,
                    self.config.endpoint_spike_ratio * 100.0
                )
            };

            anomalies.push(Anomaly {
                kind: AnomalyKind::SuspiciousEndpoint,
                severity: severity_for_ratio(error_score.max(spike_score)),
                endpoint: Some(endpoint.clone()),
                user_id: None,
                record_index: None,
                timestamp: None,
                description,
            });
        }
    }

    /// Flag users whose request count is an outlier against the cohort mean.
    fn check_users(&self, aggregates: &Aggregates, anomalies: &mut Vec<Anomaly>) {
        if aggregates.user_counts.is_empty() {
            return;
        }
        let mean =
            aggregates.summary.total_requests as f64 / aggregates.user_counts.len() as f64;
        let cutoff = mean * self.config.user_request_multiplier;

        for (user, count) in &aggregates.user_counts {
            if *count < self.config.user_min_requests {
                continue;
            }
            if *count as f64 > cutoff {
                anomalies.push(Anomaly {
                    kind: AnomalyKind::SuspiciousUser,
                    severity: severity_for_ratio(*count as f64 / cutoff),
                    endpoint: None,
                    user_id: Some(user.clone()),
                    record_index: None,
                    timestamp: None,
                    description: format!(
                        "User '{}' made {} requests, more than {:.1}x the per-user mean of {:.1}.",
                        user, count, self.config.user_request_multiplier, mean
                    ),
                });
            }
        }
    }
}

/// Map how far past a threshold something landed onto the 7-10 scale.
fn severity_for_ratio(ratio: f64) -> u8 {
    if ratio > 5.0 {
        10
    } else if ratio > 3.0 {
        9
    } else if ratio > 2.0 {
        8
    } else {
        7
    }
}
