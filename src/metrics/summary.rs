//! Immutable run statistics and the latency math behind them

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Aggregate statistics for one run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub average_response_time: f64,
    pub min_response_time: f64,
    pub max_response_time: f64,
    pub requests_per_second: f64,
    pub percentile_95: f64,
    pub percentile_99: f64,
    pub status_codes: BTreeMap<u16, u64>,
    pub error_messages: BTreeMap<String, u64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Elapsed run time in seconds
    pub duration: f64,
}

impl RunSummary {
    /// Percentage of requests that succeeded (0.0 to 100.0)
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.successful_requests as f64 / self.total_requests as f64 * 100.0
    }

    /// Fraction of requests that failed; 0 when nothing ran
    pub fn failure_ratio(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.failed_requests as f64 / self.total_requests as f64
    }

    /// Whether the failure percentage is strictly above `max_percent`
    pub fn exceeds_failure_rate(&self, max_percent: f64) -> bool {
        self.failure_ratio() * 100.0 > max_percent
    }
}

/// Ceiling-ranked percentile over an ascending slice; 0 when empty
pub fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = ((pct / 100.0) * sorted.len() as f64).ceil() as usize;
    let index = rank.saturating_sub(1).min(sorted.len() - 1);
    sorted[index]
}

/// Arithmetic mean; 0 when empty
pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
