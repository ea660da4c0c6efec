use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single validated API request-log record.
///
/// Instances are produced by the validator; the timestamp is normalized to
/// UTC and the method is uppercased, so downstream stages never re-check
/// field shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub endpoint: String,
    pub method: String,
    pub response_time_ms: f64,
    pub status_code: u16,
    pub user_id: String,
    pub request_size_bytes: Option<u64>,
    pub response_size_bytes: Option<u64>,
}
