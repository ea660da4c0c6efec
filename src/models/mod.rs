pub mod record;
pub mod report;

pub use record::LogRecord;
pub use report::{
    AnalysisResult, Anomaly, AnomalyKind, CachingRecommendation, CostSavings, EndpointStats,
    PerformanceIssue, Severity, Summary, TimeRange, TopUser,
};
