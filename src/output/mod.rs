use crate::models::{AnalysisResult, Anomaly};
use std::fmt::Write as FmtWrite;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Output handler for analysis reports
pub struct OutputHandler {
    format: OutputFormat,
    writer: Option<Box<dyn Write + Send>>,
}

#[derive(Debug, Clone)]
pub enum OutputFormat {
    Json,
    Console,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "console" => OutputFormat::Console,
            "json" => OutputFormat::Json,
            _ => OutputFormat::Json, // Default
        }
    }
}

impl OutputHandler {
    /// Create a new output handler; without a file path the report goes
    /// to stdout.
    pub fn new(format: OutputFormat, file_path: Option<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        let writer: Option<Box<dyn Write + Send>> = match file_path {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(path)?;
                Some(Box::new(BufWriter::new(file)))
            }
            None => None,
        };

        Ok(OutputHandler { format, writer })
    }

    /// Write a complete analysis report
    pub fn write_report(&mut self, result: &AnalysisResult) -> Result<(), Box<dyn std::error::Error>> {
        match &self.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(result)?;
                self.write_output(&format!("{}\n", json))?;
            }
            OutputFormat::Console => {
                let rendered = render_console(result)?;
                self.write_output(&rendered)?;
            }
        }
        Ok(())
    }

    fn write_output(&mut self, data: &str) -> Result<(), Box<dyn std::error::Error>> {
        match &mut self.writer {
            Some(writer) => {
                writer.write_all(data.as_bytes())?;
                writer.flush()?;
            }
            None => {
                print!("{}", data);
                std::io::stdout().flush()?;
            }
        }
        Ok(())
    }
}

fn render_console(result: &AnalysisResult) -> Result<String, std::fmt::Error> {
    let mut out = String::new();

    writeln!(out, "=== Summary ===")?;
    writeln!(out, "Total requests:    {}", result.summary.total_requests)?;
    writeln!(
        out,
        "Errors (>= 400):   {} ({:.2}%)",
        result.summary.total_errors,
        result.summary.error_rate * 100.0
    )?;
    writeln!(
        out,
        "Avg response time: {} ms",
        result.summary.avg_response_time_ms
    )?;
    if let Some(range) = &result.summary.time_range {
        writeln!(
            out,
            "Time range:        {} .. {}",
            range.start.to_rfc3339(),
            range.end.to_rfc3339()
        )?;
    }
    if result.skipped_records > 0 {
        writeln!(out, "Skipped records:   {}", result.skipped_records)?;
    }

    if !result.endpoint_stats.is_empty() {
        writeln!(out, "\n=== Endpoints ===")?;
        for (endpoint, stats) in &result.endpoint_stats {
            writeln!(
                out,
                "  {}: {} requests, avg {} ms, {} errors",
                endpoint, stats.request_count, stats.avg_response_time_ms, stats.error_count
            )?;
        }
    }

    if !result.top_users.is_empty() {
        writeln!(out, "\n=== Top users ===")?;
        for user in &result.top_users {
            writeln!(out, "  {}: {} requests", user.user_id, user.request_count)?;
        }
    }

    if !result.performance_issues.is_empty() {
        writeln!(out, "\n=== Performance issues ===")?;
        for issue in &result.performance_issues {
            writeln!(
                out,
                "  [{:?}] {}: avg {} ms over {} requests",
                issue.severity, issue.endpoint, issue.avg_response_time_ms, issue.request_count
            )?;
        }
    }

    if !result.anomalies.is_empty() {
        writeln!(out, "\n=== Anomalies ===")?;
        for anomaly in &result.anomalies {
            writeln!(out, "  {}", render_anomaly(anomaly))?;
        }
    }

    if !result.caching_recommendations.is_empty() {
        writeln!(out, "\n=== Caching recommendations ===")?;
        for rec in &result.caching_recommendations {
            writeln!(
                out,
                "  {}: ~{} requests saved, ~{:.0}% faster, cost savings: {:?}",
                rec.endpoint,
                rec.estimated_requests_saved,
                rec.estimated_improvement_percent,
                rec.cost_savings
            )?;
        }
    }

    Ok(out)
}

fn render_anomaly(anomaly: &Anomaly) -> String {
    format!(
        "[{:?}] (severity {}) {}",
        anomaly.kind, anomaly.severity, anomaly.description
    )
}
