//! Single-pass aggregation
//!
//! One [`Accumulator`] is updated once per record; every reported view
//! (endpoint stats, summary, hourly histogram, top users) is derived from it
//! at finalization. Auxiliary memory is bounded by the number of distinct
//! endpoints and users, not by record count.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Timelike, Utc};

use crate::models::{EndpointStats, LogRecord, Summary, TimeRange, TopUser};

/// Status codes at or above this count as errors in every reported rate.
pub const ERROR_STATUS: u16 = 400;

/// Round to two decimals, the precision of all reported averages.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug)]
struct EndpointEntry {
    request_count: u64,
    response_time_sum: f64,
    min_response_time_ms: f64,
    max_response_time_ms: f64,
    error_count: u64,
    status_codes: BTreeMap<u16, u64>,
    methods: BTreeMap<String, u64>,
    response_size_sum: u64,
    response_size_count: u64,
}

impl EndpointEntry {
    fn new() -> Self {
        EndpointEntry {
            request_count: 0,
            response_time_sum: 0.0,
            min_response_time_ms: f64::INFINITY,
            max_response_time_ms: 0.0,
            error_count: 0,
            status_codes: BTreeMap::new(),
            methods: BTreeMap::new(),
            response_size_sum: 0,
            response_size_count: 0,
        }
    }

    fn observe(&mut self, record: &LogRecord) {
        self.request_count += 1;
        self.response_time_sum += record.response_time_ms;
        self.min_response_time_ms = self.min_response_time_ms.min(record.response_time_ms);
        self.max_response_time_ms = self.max_response_time_ms.max(record.response_time_ms);
        if record.status_code >= ERROR_STATUS {
            self.error_count += 1;
        }
        *self.status_codes.entry(record.status_code).or_insert(0) += 1;
        *self.methods.entry(record.method.clone()).or_insert(0) += 1;
        if let Some(size) = record.response_size_bytes {
            self.response_size_sum += size;
            self.response_size_count += 1;
        }
    }

    fn finalize(self) -> EndpointStats {
        // request_count >= 1: entries only exist once a record was observed
        let count = self.request_count as f64;
        let avg_response_size_bytes = if self.response_size_count > 0 {
            Some(round2(
                self.response_size_sum as f64 / self.response_size_count as f64,
            ))
        } else {
            None
        };

        EndpointStats {
            request_count: self.request_count,
            avg_response_time_ms: round2(self.response_time_sum / count),
            min_response_time_ms: self.min_response_time_ms,
            max_response_time_ms: self.max_response_time_ms,
            error_count: self.error_count,
            error_rate: self.error_count as f64 / count,
            status_codes: self.status_codes,
            methods: self.methods,
            avg_response_size_bytes,
        }
    }
}

#[derive(Debug)]
struct UserEntry {
    request_count: u64,
    first_seen: usize,
}

/// Everything derived from one aggregation pass.
#[derive(Debug)]
pub struct Aggregates {
    pub endpoint_stats: BTreeMap<String, EndpointStats>,
    pub summary: Summary,
    pub hourly_distribution: BTreeMap<u8, u64>,
    pub top_users: Vec<TopUser>,
    /// Full per-user counts in first-seen order; the anomaly detector needs
    /// the whole cohort, not just the top of the ranking.
    pub user_counts: Vec<(String, u64)>,
}

/// Accumulator for the single aggregation pass.
#[derive(Debug)]
pub struct Accumulator {
    endpoints: BTreeMap<String, EndpointEntry>,
    users: HashMap<String, UserEntry>,
    hourly: BTreeMap<u8, u64>,
    total_requests: u64,
    total_errors: u64,
    response_time_sum: f64,
    min_timestamp: Option<DateTime<Utc>>,
    max_timestamp: Option<DateTime<Utc>>,
}

impl Accumulator {
    pub fn new() -> Self {
        Accumulator {
            endpoints: BTreeMap::new(),
            users: HashMap::new(),
            hourly: BTreeMap::new(),
            total_requests: 0,
            total_errors: 0,
            response_time_sum: 0.0,
            min_timestamp: None,
            max_timestamp: None,
        }
    }

    /// Fold one record into the accumulator.
    pub fn observe(&mut self, record: &LogRecord) {
        self.total_requests += 1;
        if record.status_code >= ERROR_STATUS {
            self.total_errors += 1;
        }
        self.response_time_sum += record.response_time_ms;

        self.min_timestamp = Some(match self.min_timestamp {
            Some(ts) => ts.min(record.timestamp),
            None => record.timestamp,
        });
        self.max_timestamp = Some(match self.max_timestamp {
            Some(ts) => ts.max(record.timestamp),
            None => record.timestamp,
        });

        self.endpoints
            .entry(record.endpoint.clone())
            .or_insert_with(EndpointEntry::new)
            .observe(record);

        let next_index = self.users.len();
        self.users
            .entry(record.user_id.clone())
            .or_insert_with(|| UserEntry {
                request_count: 0,
                first_seen: next_index,
            })
            .request_count += 1;

        // Hour is taken in UTC so the bucket is independent of the
        // offset the record was logged with.
        *self
            .hourly
            .entry(record.timestamp.hour() as u8)
            .or_insert(0) += 1;
    }

    /// Derive every reported view and consume the accumulator.
    pub fn finalize(self, top_user_count: usize) -> Aggregates {
        let endpoint_stats: BTreeMap<String, EndpointStats> = self
            .endpoints
            .into_iter()
            .map(|(endpoint, entry)| (endpoint, entry.finalize()))
            .collect();

        let summary = Summary {
            total_requests: self.total_requests,
            total_errors: self.total_errors,
            error_rate: if self.total_requests > 0 {
                self.total_errors as f64 / self.total_requests as f64
            } else {
                0.0
            },
            avg_response_time_ms: if self.total_requests > 0 {
                round2(self.response_time_sum / self.total_requests as f64)
            } else {
                0.0
            },
            time_range: match (self.min_timestamp, self.max_timestamp) {
                (Some(start), Some(end)) => Some(TimeRange { start, end }),
                _ => None,
            },
        };

        let mut user_counts: Vec<(String, u64, usize)> = self
            .users
            .into_iter()
            .map(|(user, entry)| (user, entry.request_count, entry.first_seen))
            .collect();
        user_counts.sort_by_key(|&(_, _, first_seen)| first_seen);

        let mut ranked: Vec<(String, u64)> = user_counts
            .iter()
            .map(|(user, count, _)| (user.clone(), *count))
            .collect();
        // Stable sort keeps first-seen order among equal counts.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        let top_users = ranked
            .into_iter()
            .take(top_user_count)
            .map(|(user_id, request_count)| TopUser {
                user_id,
                request_count,
            })
            .collect();

        Aggregates {
            endpoint_stats,
            summary,
            hourly_distribution: self.hourly,
            top_users,
            user_counts: user_counts
                .into_iter()
                .map(|(user, count, _)| (user, count))
                .collect(),
        }
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn create_record(
        endpoint: &str,
        method: &str,
        status: u16,
        response_time: f64,
        user: &str,
        hour: u32,
    ) -> LogRecord {
        LogRecord {
            timestamp: Utc.with_ymd_and_hms(2025, 1, 15, hour, 0, 0).unwrap(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
            response_time_ms: response_time,
            status_code: status,
            user_id: user.to_string(),
            request_size_bytes: None,
            response_size_bytes: None,
        }
    }

    fn aggregate(records: &[LogRecord]) -> Aggregates {
        let mut acc = Accumulator::new();
        for record in records {
            acc.observe(record);
        }
        acc.finalize(5)
    }

    #[test]
    fn test_empty_accumulator() {
        let aggregates = Accumulator::new().finalize(5);

        assert_eq!(aggregates.summary, Summary::default());
        assert!(aggregates.endpoint_stats.is_empty());
        assert!(aggregates.hourly_distribution.is_empty());
        assert!(aggregates.top_users.is_empty());
    }

    #[test]
    fn test_global_counters() {
        let records = vec![
            create_record("/api/users", "GET", 200, 100.0, "u1", 10),
            create_record("/api/users", "GET", 404, 50.0, "u2", 10),
            create_record("/api/orders", "POST", 500, 300.0, "u1", 11),
        ];
        let aggregates = aggregate(&records);

        assert_eq!(aggregates.summary.total_requests, 3);
        assert_eq!(aggregates.summary.total_errors, 2);
        assert_eq!(aggregates.summary.error_rate, 2.0 / 3.0);
        assert_eq!(aggregates.summary.avg_response_time_ms, 150.0);

        let range = aggregates.summary.time_range.unwrap();
        assert_eq!(range.start.hour(), 10);
        assert_eq!(range.end.hour(), 11);
    }

    #[test]
    fn test_endpoint_stats() {
        let records = vec![
            create_record("/api/users", "GET", 200, 100.0, "u1", 10),
            create_record("/api/users", "POST", 201, 200.0, "u1", 10),
            create_record("/api/users", "GET", 404, 300.0, "u2", 10),
        ];
        let aggregates = aggregate(&records);

        let stats = &aggregates.endpoint_stats["/api/users"];
        assert_eq!(stats.request_count, 3);
        assert_eq!(stats.avg_response_time_ms, 200.0);
        assert_eq!(stats.min_response_time_ms, 100.0);
        assert_eq!(stats.max_response_time_ms, 300.0);
        assert_eq!(stats.error_count, 1);
        assert_eq!(stats.methods["GET"], 2);
        assert_eq!(stats.methods["POST"], 1);
    }

    #[test]
    fn test_request_count_equals_status_histogram_sum() {
        let records = vec![
            create_record("/api/users", "GET", 200, 100.0, "u1", 10),
            create_record("/api/users", "GET", 200, 100.0, "u1", 10),
            create_record("/api/users", "GET", 404, 100.0, "u1", 10),
            create_record("/api/users", "GET", 500, 100.0, "u1", 10),
        ];
        let aggregates = aggregate(&records);

        let stats = &aggregates.endpoint_stats["/api/users"];
        let histogram_sum: u64 = stats.status_codes.values().sum();
        assert_eq!(stats.request_count, histogram_sum);
        assert_eq!(stats.status_codes[&200], 2);
    }

    #[test]
    fn test_avg_is_rounded_to_two_decimals() {
        let records = vec![
            create_record("/api/users", "GET", 200, 100.0, "u1", 10),
            create_record("/api/users", "GET", 200, 100.0, "u1", 10),
            create_record("/api/users", "GET", 200, 101.0, "u1", 10),
        ];
        let aggregates = aggregate(&records);

        // 301 / 3 = 100.333...
        assert_eq!(
            aggregates.endpoint_stats["/api/users"].avg_response_time_ms,
            100.33
        );
    }

    #[test]
    fn test_hourly_distribution_only_observed_hours() {
        let records = vec![
            create_record("/a", "GET", 200, 1.0, "u1", 9),
            create_record("/a", "GET", 200, 1.0, "u1", 9),
            create_record("/a", "GET", 200, 1.0, "u1", 23),
        ];
        let aggregates = aggregate(&records);

        assert_eq!(aggregates.hourly_distribution.len(), 2);
        assert_eq!(aggregates.hourly_distribution[&9], 2);
        assert_eq!(aggregates.hourly_distribution[&23], 1);
    }

    #[test]
    fn test_top_users_sorted_with_first_seen_tiebreak() {
        let mut records = Vec::new();
        // bob appears first but alice ends up with more requests;
        // carol ties with bob and must rank after him.
        records.push(create_record("/a", "GET", 200, 1.0, "bob", 10));
        records.push(create_record("/a", "GET", 200, 1.0, "alice", 10));
        records.push(create_record("/a", "GET", 200, 1.0, "carol", 10));
        records.push(create_record("/a", "GET", 200, 1.0, "alice", 10));

        let aggregates = aggregate(&records);
        let names: Vec<&str> = aggregates
            .top_users
            .iter()
            .map(|u| u.user_id.as_str())
            .collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn test_top_users_truncated_to_limit() {
        let mut records = Vec::new();
        for i in 0..8 {
            records.push(create_record("/a", "GET", 200, 1.0, &format!("u{}", i), 10));
        }

        let aggregates = aggregate(&records);
        assert_eq!(aggregates.top_users.len(), 5);
        assert_eq!(aggregates.user_counts.len(), 8);
    }

    #[test]
    fn test_response_size_average() {
        let mut with_size = create_record("/a", "GET", 200, 1.0, "u1", 10);
        with_size.response_size_bytes = Some(1000);
        let mut with_other_size = create_record("/a", "GET", 200, 1.0, "u1", 10);
        with_other_size.response_size_bytes = Some(2000);
        let without_size = create_record("/a", "GET", 200, 1.0, "u1", 10);

        let aggregates = aggregate(&[with_size, with_other_size, without_size]);
        let stats = &aggregates.endpoint_stats["/a"];
        // Averaged over the two records that carried a size.
        assert_eq!(stats.avg_response_size_bytes, Some(1500.0));

        let bare = aggregate(&[create_record("/b", "GET", 200, 1.0, "u1", 10)]);
        assert_eq!(bare.endpoint_stats["/b"].avg_response_size_bytes, None);
    }
}
