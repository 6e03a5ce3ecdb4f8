//! Streaming aggregation of request outcomes across all virtual users

use crate::metrics::summary::{RunSummary, average, percentile};
use crate::outcome::RequestOutcome;

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tokio::time::Instant;

/// A point on both the monotonic and the wall clock
#[derive(Debug, Clone, Copy)]
struct Timestamp {
    instant: Instant,
    wall: DateTime<Utc>,
}

impl Timestamp {
    fn now() -> Self {
        Self {
            instant: Instant::now(),
            wall: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
struct AggregateState {
    total: u64,
    successful: u64,
    failed: u64,
    /// Strictly positive latencies only, in arrival order
    latencies_ms: Vec<f64>,
    status_codes: BTreeMap<u16, u64>,
    error_messages: BTreeMap<String, u64>,
    started: Option<Timestamp>,
    stopped: Option<Timestamp>,
}

impl AggregateState {
    fn fold(&mut self, outcome: RequestOutcome) {
        self.total += 1;
        if outcome.success {
            self.successful += 1;
        } else {
            self.failed += 1;
            if let Some(error) = outcome.error {
                *self.error_messages.entry(error).or_insert(0) += 1;
            }
        }

        if let Some(status) = outcome.status_code {
            *self.status_codes.entry(status).or_insert(0) += 1;
        }

        if outcome.latency_ms > 0.0 {
            self.latencies_ms.push(outcome.latency_ms);
        }
    }
}

/// Thread-safe accumulator shared by every user task of a run
#[derive(Debug, Default)]
pub struct MetricsAggregator {
    completed: AtomicU64,
    state: RwLock<AggregateState>,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all accumulated data and start the run clock
    pub async fn start(&self) {
        let mut state = self.state.write().await;
        *state = AggregateState {
            started: Some(Timestamp::now()),
            ..Default::default()
        };
        self.completed.store(0, Ordering::Release);
    }

    /// Stop the run clock; recorded outcomes are kept
    pub async fn stop(&self) {
        self.state.write().await.stopped = Some(Timestamp::now());
    }

    /// Fold one outcome into the running statistics
    pub async fn record(&self, outcome: RequestOutcome) {
        let mut state = self.state.write().await;
        state.fold(outcome);
        self.completed.store(state.total, Ordering::Release);
    }

    /// Number of outcomes recorded so far
    pub fn completed_count(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    /// Completed requests per second since `start`
    pub async fn current_throughput(&self) -> f64 {
        let completed = self.completed_count();
        let started = self.state.read().await.started;
        match started {
            Some(started) if completed > 0 => {
                let elapsed = started.instant.elapsed().as_secs_f64();
                if elapsed > 0.0 {
                    completed as f64 / elapsed
                } else {
                    0.0
                }
            }
            _ => 0.0,
        }
    }

    /// Compute a summary from everything recorded so far
    pub async fn summarize(&self) -> RunSummary {
        let state = self.state.read().await;
        let now = Timestamp::now();
        let start = state.started.unwrap_or(now);
        let end = state.stopped.unwrap_or(now);
        let duration = end
            .instant
            .saturating_duration_since(start.instant)
            .as_secs_f64();

        let mut sorted = state.latencies_ms.clone();
        sorted.sort_by(f64::total_cmp);

        RunSummary {
            total_requests: state.total,
            successful_requests: state.successful,
            failed_requests: state.failed,
            average_response_time: average(&sorted),
            min_response_time: sorted.first().copied().unwrap_or(0.0),
            max_response_time: sorted.last().copied().unwrap_or(0.0),
            requests_per_second: if duration > 0.0 {
                state.total as f64 / duration
            } else {
                0.0
            },
            percentile_95: percentile(&sorted, 95.0),
            percentile_99: percentile(&sorted, 99.0),
            status_codes: state.status_codes.clone(),
            error_messages: state.error_messages.clone(),
            start_time: start.wall,
            end_time: end.wall,
            duration,
        }
    }

    /// Return to the pre-`start` condition
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        *state = AggregateState::default();
        self.completed.store(0, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::UserId;
    use crate::errors::RequestFailure;
    use std::sync::Arc;
    use std::time::Duration;

    fn ok(latency_ms: f64) -> RequestOutcome {
        RequestOutcome::success(UserId(0), 200, latency_ms)
    }

    fn failed(label: &str, latency_ms: f64) -> RequestOutcome {
        RequestOutcome::failure(
            UserId(0),
            &RequestFailure::Transport(label.to_string()),
            latency_ms,
        )
    }

    #[tokio::test]
    async fn test_three_successes_summary() {
        let metrics = MetricsAggregator::new();
        metrics.start().await;
        for latency in [10.0, 20.0, 30.0] {
            metrics.record(ok(latency)).await;
        }
        metrics.stop().await;

        let summary = metrics.summarize().await;
        assert_eq!(summary.total_requests, 3);
        assert_eq!(summary.successful_requests, 3);
        assert_eq!(summary.failed_requests, 0);
        assert_eq!(summary.average_response_time, 20.0);
        assert_eq!(summary.min_response_time, 10.0);
        assert_eq!(summary.max_response_time, 30.0);
        assert_eq!(summary.percentile_95, 30.0);
        assert_eq!(summary.percentile_99, 30.0);
    }

    #[tokio::test]
    async fn test_status_and_error_histograms() {
        let metrics = MetricsAggregator::new();
        metrics.start().await;
        metrics.record(ok(15.0)).await;
        metrics.record(failed("HTTP 500", 25.0)).await;
        metrics.stop().await;

        let summary = metrics.summarize().await;
        assert_eq!(summary.status_codes, BTreeMap::from([(200, 1)]));
        assert_eq!(
            summary.error_messages,
            BTreeMap::from([("HTTP 500".to_string(), 1)])
        );
        assert_eq!(summary.failed_requests, 1);
        assert_eq!(
            summary.successful_requests + summary.failed_requests,
            summary.total_requests
        );
    }

    #[tokio::test]
    async fn test_protocol_failure_counts_status_and_label() {
        let metrics = MetricsAggregator::new();
        metrics.start().await;
        metrics
            .record(RequestOutcome::failure(
                UserId(1),
                &RequestFailure::Protocol(503),
                4.0,
            ))
            .await;

        let summary = metrics.summarize().await;
        assert_eq!(summary.status_codes, BTreeMap::from([(503, 1)]));
        assert_eq!(
            summary.error_messages,
            BTreeMap::from([("HTTP 503".to_string(), 1)])
        );
    }

    #[tokio::test]
    async fn test_zero_latency_counted_but_not_sampled() {
        let metrics = MetricsAggregator::new();
        metrics.start().await;
        metrics.record(failed("connection refused", 0.0)).await;
        metrics.record(ok(40.0)).await;

        let summary = metrics.summarize().await;
        assert_eq!(summary.total_requests, 2);
        assert_eq!(summary.min_response_time, 40.0);
        assert_eq!(summary.average_response_time, 40.0);
        assert_eq!(summary.percentile_95, 40.0);
    }

    #[tokio::test]
    async fn test_empty_summary_is_zeroed() {
        let metrics = MetricsAggregator::new();
        metrics.start().await;
        metrics.stop().await;

        let summary = metrics.summarize().await;
        assert_eq!(summary.total_requests, 0);
        assert_eq!(summary.average_response_time, 0.0);
        assert_eq!(summary.min_response_time, 0.0);
        assert_eq!(summary.max_response_time, 0.0);
        assert_eq!(summary.percentile_95, 0.0);
        assert_eq!(summary.percentile_99, 0.0);
        assert!(summary.status_codes.is_empty());
        assert!(summary.error_messages.is_empty());
    }

    #[tokio::test]
    async fn test_percentiles_ordered_and_bounded() {
        let metrics = MetricsAggregator::new();
        metrics.start().await;
        for i in 0..257u32 {
            metrics.record(ok(f64::from((i * 37) % 101 + 1))).await;
        }

        let summary = metrics.summarize().await;
        assert!(summary.percentile_95 <= summary.percentile_99);
        assert!(summary.min_response_time <= summary.percentile_95);
        assert!(summary.percentile_99 <= summary.max_response_time);
    }

    #[tokio::test]
    async fn test_percentiles_independent_of_arrival_order() {
        let latencies: Vec<f64> = (1..=50).map(|i| f64::from(i * 3 % 47 + 1)).collect();

        let forward = MetricsAggregator::new();
        forward.start().await;
        for &latency in &latencies {
            forward.record(ok(latency)).await;
        }

        let reversed = MetricsAggregator::new();
        reversed.start().await;
        for &latency in latencies.iter().rev() {
            reversed.record(ok(latency)).await;
        }

        let a = forward.summarize().await;
        let b = reversed.summarize().await;
        assert_eq!(a.percentile_95, b.percentile_95);
        assert_eq!(a.percentile_99, b.percentile_99);
        assert_eq!(a.average_response_time, b.average_response_time);
    }

    #[tokio::test]
    async fn test_throughput_zero_before_outcomes() {
        let metrics = MetricsAggregator::new();
        assert_eq!(metrics.current_throughput().await, 0.0);

        metrics.start().await;
        assert_eq!(metrics.current_throughput().await, 0.0);

        metrics.record(ok(5.0)).await;
        assert!(metrics.current_throughput().await >= 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throughput_uses_elapsed_time() {
        let metrics = MetricsAggregator::new();
        metrics.start().await;
        for _ in 0..10 {
            metrics.record(ok(1.0)).await;
        }
        tokio::time::advance(Duration::from_secs(2)).await;

        let throughput = metrics.current_throughput().await;
        assert!((throughput - 5.0).abs() < 1e-6, "got {}", throughput);
    }

    #[tokio::test(start_paused = true)]
    async fn test_summary_duration_and_rps() {
        let metrics = MetricsAggregator::new();
        metrics.start().await;
        for _ in 0..8 {
            metrics.record(ok(3.0)).await;
        }
        tokio::time::advance(Duration::from_secs(4)).await;
        metrics.stop().await;

        let summary = metrics.summarize().await;
        assert!((summary.duration - 4.0).abs() < 1e-6);
        assert!((summary.requests_per_second - 2.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_start_discards_previous_data() {
        let metrics = MetricsAggregator::new();
        metrics.start().await;
        metrics.record(ok(5.0)).await;
        assert_eq!(metrics.completed_count(), 1);

        metrics.start().await;
        assert_eq!(metrics.completed_count(), 0);
        assert_eq!(metrics.summarize().await.total_requests, 0);
    }

    #[tokio::test]
    async fn test_reset_clears_state() {
        let metrics = MetricsAggregator::new();
        metrics.start().await;
        metrics.record(ok(5.0)).await;
        metrics.reset().await;

        assert_eq!(metrics.completed_count(), 0);
        assert_eq!(metrics.current_throughput().await, 0.0);
        let summary = metrics.summarize().await;
        assert_eq!(summary.total_requests, 0);
        assert_eq!(summary.duration, 0.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_recording_loses_nothing() {
        let metrics = Arc::new(MetricsAggregator::new());
        metrics.start().await;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                tokio::spawn(async move {
                    for i in 0..250 {
                        metrics.record(ok(f64::from(i % 10 + 1))).await;
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(metrics.completed_count(), 2_000);
        assert_eq!(metrics.summarize().await.total_requests, 2_000);
    }
}
