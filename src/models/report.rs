use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Finalized statistics for a single endpoint.
///
/// Built during the aggregation pass and frozen at finalization; the
/// request count always equals the sum of the status-code histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointStats {
    pub request_count: u64,
    /// Mean response time in ms, rounded to two decimals.
    pub avg_response_time_ms: f64,
    pub min_response_time_ms: f64,
    pub max_response_time_ms: f64,
    /// Responses with status code >= 400.
    pub error_count: u64,
    /// error_count / request_count, as a fraction.
    pub error_rate: f64,
    pub status_codes: BTreeMap<u16, u64>,
    pub methods: BTreeMap<String, u64>,
    /// Mean response body size over records that carried the optional
    /// size field; absent when none did.
    pub avg_response_size_bytes: Option<f64>,
}

/// First and last timestamp observed in the batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Batch-wide counters.
///
/// "Error" throughout the report means status code >= 400; status codes
/// >= 500 are additionally surfaced as `server_error` anomalies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_requests: u64,
    pub total_errors: u64,
    /// total_errors / total_requests, 0.0 for an empty batch.
    pub error_rate: f64,
    /// Batch-wide mean response time in ms, rounded to two decimals.
    pub avg_response_time_ms: f64,
    pub time_range: Option<TimeRange>,
}

impl Default for Summary {
    fn default() -> Self {
        Summary {
            total_requests: 0,
            total_errors: 0,
            error_rate: 0.0,
            avg_response_time_ms: 0.0,
            time_range: None,
        }
    }
}

/// One entry of the most-active-users ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopUser {
    pub user_id: String,
    pub request_count: u64,
}

/// Classification of a flagged event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    ResponseTimeSpike,
    ServerError,
    SuspiciousEndpoint,
    SuspiciousUser,
}

/// A flagged record or aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    /// 7-10 scale; higher means further past the threshold.
    pub severity: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Index of the offending record in the validated batch, for
    /// per-record flags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub description: String,
}

/// Severity bucket for slow endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

/// An endpoint whose average response time crossed the slow threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceIssue {
    pub endpoint: String,
    pub request_count: u64,
    pub avg_response_time_ms: f64,
    pub severity: Severity,
}

/// Qualitative cost-savings bucket, from estimated requests saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostSavings {
    Low,
    Medium,
    High,
}

/// A caching candidate: read-heavy, low-error endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachingRecommendation {
    pub endpoint: String,
    pub request_count: u64,
    /// Share of the endpoint's traffic that is GET, as a fraction.
    pub get_ratio: f64,
    pub estimated_requests_saved: u64,
    /// (avg - cached) / avg x 100, against the assumed cached response time.
    pub estimated_improvement_percent: f64,
    /// Response bytes a cache would absorb; absent when the batch carried
    /// no response sizes for this endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_bytes_saved: Option<u64>,
    pub cost_savings: CostSavings,
}

/// Complete output of one analysis run.
///
/// Mappings are BTreeMaps so serializing the same input twice produces
/// byte-identical output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: Summary,
    pub endpoint_stats: BTreeMap<String, EndpointStats>,
    /// Request count per UTC hour of day (0-23); only observed hours appear.
    pub hourly_distribution: BTreeMap<u8, u64>,
    pub top_users: Vec<TopUser>,
    pub performance_issues: Vec<PerformanceIssue>,
    pub anomalies: Vec<Anomaly>,
    pub caching_recommendations: Vec<CachingRecommendation>,
    /// Malformed records skipped by the validator.
    pub skipped_records: u64,
}

impl AnalysisResult {
    /// The zero-valued result returned for an empty (or fully skipped) batch.
    pub fn empty(skipped_records: u64) -> Self {
        AnalysisResult {
            summary: Summary::default(),
            endpoint_stats: BTreeMap::new(),
            hourly_distribution: BTreeMap::new(),
            top_users: Vec::new(),
            performance_issues: Vec::new(),
            anomalies: Vec::new(),
            caching_recommendations: Vec::new(),
            skipped_records,
        }
    }
}
