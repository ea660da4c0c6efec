pub mod analysis;
pub mod config;
pub mod input;
pub mod models;
pub mod output;
pub mod validate;

// Re-export commonly used types
pub use analysis::{analyze, Analyzer};
pub use config::AnalysisConfig;
pub use models::{
    AnalysisResult, Anomaly, AnomalyKind, CachingRecommendation, EndpointStats, LogRecord, Summary,
};
pub use validate::{RecordError, ValidatedBatch};
