//! The analysis pipeline
//!
//! Validate, aggregate in one pass, then layer the anomaly detector, the
//! caching advisor and the slow-endpoint classifier over the aggregates.
//! Pure computation: every call builds its own accumulators, so concurrent
//! callers on separate inputs need no coordination.

pub mod aggregator;
pub mod anomaly;
pub mod caching;
pub mod performance;

pub use aggregator::{Accumulator, Aggregates, ERROR_STATUS};
pub use anomaly::AnomalyDetector;
pub use caching::CachingAdvisor;
pub use performance::PerformanceClassifier;

use serde_json::Value;

use crate::config::AnalysisConfig;
use crate::models::{AnalysisResult, LogRecord};
use crate::validate;

/// Runs the full pipeline with a fixed configuration.
pub struct Analyzer {
    config: AnalysisConfig,
}

impl Analyzer {
    /// Analyzer with the documented default thresholds.
    pub fn new() -> Self {
        Analyzer {
            config: AnalysisConfig::default(),
        }
    }

    pub fn with_config(config: AnalysisConfig) -> Self {
        Analyzer { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze a batch of raw JSON records.
    ///
    /// Malformed records are skipped and counted (see [`crate::validate`]);
    /// an empty or fully skipped batch yields the zero-valued result.
    pub fn analyze(&self, logs: &[Value]) -> AnalysisResult {
        let batch = validate::validate_batch(logs);
        let mut result = self.analyze_validated(&batch.records);
        result.skipped_records = batch.skipped.len() as u64;
        result
    }

    /// Analyze records that were already validated.
    pub fn analyze_validated(&self, records: &[LogRecord]) -> AnalysisResult {
        if records.is_empty() {
            return AnalysisResult::empty(0);
        }

        let mut accumulator = Accumulator::new();
        for record in records {
            accumulator.observe(record);
        }
        let aggregates = accumulator.finalize(self.config.top_user_count);

        let anomalies =
            AnomalyDetector::new(self.config.anomaly.clone()).detect(records, &aggregates);
        let caching_recommendations =
            CachingAdvisor::new(self.config.caching.clone()).recommend(&aggregates.endpoint_stats);
        let performance_issues = PerformanceClassifier::new(self.config.performance.clone())
            .find_issues(&aggregates.endpoint_stats);

        AnalysisResult {
            summary: aggregates.summary,
            endpoint_stats: aggregates.endpoint_stats,
            hourly_distribution: aggregates.hourly_distribution,
            top_users: aggregates.top_users,
            performance_issues,
            anomalies,
            caching_recommendations,
            skipped_records: 0,
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Analyze a batch with the default configuration.
pub fn analyze(logs: &[Value]) -> AnalysisResult {
    Analyzer::new().analyze(logs)
}
