//! Record validation and normalization
//!
//! Turns raw JSON values into typed [`LogRecord`]s. The batch contract is
//! skip-and-count: malformed records are dropped, logged at debug level,
//! and the skip count is surfaced in the analysis result.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::LogRecord;

/// Standard HTTP verbs accepted for the `method` field (case-insensitive).
pub const HTTP_METHODS: &[&str] = &[
    "GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS", "CONNECT", "TRACE",
];

/// Why a single record failed validation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("record {index}: not a JSON object")]
    NotAnObject { index: usize },

    #[error("record {index}: missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("record {index}: field '{field}' is invalid: {reason}")]
    InvalidField {
        index: usize,
        field: &'static str,
        reason: String,
    },

    #[error("record {index}: timestamp '{value}' is not a valid RFC 3339 instant")]
    BadTimestamp { index: usize, value: String },
}

/// A validated batch: the surviving records plus the per-record failures.
#[derive(Debug, Clone)]
pub struct ValidatedBatch {
    pub records: Vec<LogRecord>,
    pub skipped: Vec<RecordError>,
}

/// Validate a whole batch, skipping and counting malformed records.
pub fn validate_batch(logs: &[Value]) -> ValidatedBatch {
    let mut records = Vec::with_capacity(logs.len());
    let mut skipped = Vec::new();

    for (index, raw) in logs.iter().enumerate() {
        match validate_record(index, raw) {
            Ok(record) => records.push(record),
            Err(e) => {
                log::debug!("skipping malformed record: {}", e);
                skipped.push(e);
            }
        }
    }

    ValidatedBatch { records, skipped }
}

/// Validate one raw record.
///
/// Timestamps are parsed as RFC 3339 and normalized to UTC; the method is
/// uppercased. The optional size fields must be non-negative integers when
/// present and non-null.
pub fn validate_record(index: usize, raw: &Value) -> Result<LogRecord, RecordError> {
    let obj = raw
        .as_object()
        .ok_or(RecordError::NotAnObject { index })?;

    let timestamp = parse_timestamp(index, require_str(index, obj, "timestamp")?)?;
    let endpoint = require_str(index, obj, "endpoint")?.to_string();
    let method = parse_method(index, require_str(index, obj, "method")?)?;
    let response_time_ms = require_non_negative(index, obj, "response_time_ms")?;
    let status_code = parse_status_code(index, obj)?;
    let user_id = require_str(index, obj, "user_id")?.to_string();
    let request_size_bytes = optional_size(index, obj, "request_size_bytes")?;
    let response_size_bytes = optional_size(index, obj, "response_size_bytes")?;

    Ok(LogRecord {
        timestamp,
        endpoint,
        method,
        response_time_ms,
        status_code,
        user_id,
        request_size_bytes,
        response_size_bytes,
    })
}

fn require_str<'a>(
    index: usize,
    obj: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, RecordError> {
    let value = obj
        .get(field)
        .ok_or(RecordError::MissingField { index, field })?;
    let s = value.as_str().ok_or_else(|| RecordError::InvalidField {
        index,
        field,
        reason: "expected a string".to_string(),
    })?;
    if s.is_empty() {
        return Err(RecordError::InvalidField {
            index,
            field,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(s)
}

fn require_non_negative(
    index: usize,
    obj: &Map<String, Value>,
    field: &'static str,
) -> Result<f64, RecordError> {
    let value = obj
        .get(field)
        .ok_or(RecordError::MissingField { index, field })?;
    let n = value.as_f64().ok_or_else(|| RecordError::InvalidField {
        index,
        field,
        reason: "expected a number".to_string(),
    })?;
    if !n.is_finite() || n < 0.0 {
        return Err(RecordError::InvalidField {
            index,
            field,
            reason: format!("must be a non-negative number, got {}", n),
        });
    }
    Ok(n)
}

fn parse_timestamp(index: usize, value: &str) -> Result<DateTime<Utc>, RecordError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| RecordError::BadTimestamp {
            index,
            value: value.to_string(),
        })
}

fn parse_method(index: usize, value: &str) -> Result<String, RecordError> {
    let method = value.to_uppercase();
    if !HTTP_METHODS.contains(&method.as_str()) {
        return Err(RecordError::InvalidField {
            index,
            field: "method",
            reason: format!("'{}' is not a standard HTTP verb", value),
        });
    }
    Ok(method)
}

fn parse_status_code(index: usize, obj: &Map<String, Value>) -> Result<u16, RecordError> {
    let value = obj.get("status_code").ok_or(RecordError::MissingField {
        index,
        field: "status_code",
    })?;
    let code = value.as_i64().ok_or_else(|| RecordError::InvalidField {
        index,
        field: "status_code",
        reason: "expected an integer".to_string(),
    })?;
    if !(100..=599).contains(&code) {
        return Err(RecordError::InvalidField {
            index,
            field: "status_code",
            reason: format!("{} is not a plausible HTTP status code", code),
        });
    }
    Ok(code as u16)
}

fn optional_size(
    index: usize,
    obj: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<u64>, RecordError> {
    match obj.get(field) {
        None => Ok(None),
        Some(Value::Null) => Ok(None),
        Some(value) => {
            let n = value.as_u64().ok_or_else(|| RecordError::InvalidField {
                index,
                field,
                reason: "expected a non-negative integer".to_string(),
            })?;
            Ok(Some(n))
        }
    }
}
