//! A single virtual user's request loop

use crate::client::{ProgressCallback, ProgressUpdate, RequestExecutor, RequestSpec};
use crate::common::UserId;
use crate::constants::DEBUG_LOG_INTERVAL;
use crate::metrics::MetricsAggregator;
use crate::outcome::RequestOutcome;

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One simulated client issuing its requests strictly in sequence
pub struct VirtualUser {
    pub(crate) user_id: UserId,
    pub(crate) request: Arc<RequestSpec>,
    pub(crate) requests: u32,
    pub(crate) delay: Duration,
    pub(crate) total_planned: u64,
    pub(crate) executor: Arc<dyn RequestExecutor>,
    pub(crate) metrics: Arc<MetricsAggregator>,
    pub(crate) cancel: CancellationToken,
    pub(crate) progress: Option<ProgressCallback>,
}

impl VirtualUser {
    /// Run the request loop; returns how many requests were issued
    pub async fn run(self) -> u32 {
        debug!("User {} starting", self.user_id);
        let mut issued = 0u32;

        for iteration in 0..self.requests {
            if self.cancel.is_cancelled() {
                debug!(
                    "User {} observed cancellation after {} requests",
                    self.user_id, issued
                );
                break;
            }

            let dispatched_at = Instant::now();
            let result = self.executor.execute(&self.request, &self.cancel).await;
            let outcome = RequestOutcome::from_result(self.user_id, result, dispatched_at.elapsed());

            if let Some(error) = &outcome.error {
                debug!("User {} request failed: {}", self.user_id, error);
            }

            self.metrics.record(outcome).await;
            issued += 1;
            self.report_progress().await;

            if issued % DEBUG_LOG_INTERVAL == 0 {
                debug!("User {} issued {} requests", self.user_id, issued);
            }

            let is_last = iteration + 1 == self.requests;
            if !self.delay.is_zero() && !is_last {
                tokio::select! {
                    _ = sleep(self.delay) => {}
                    _ = self.cancel.cancelled() => {}
                }
            }
        }

        debug!("User {} finished with {} requests", self.user_id, issued);
        issued
    }

    async fn report_progress(&self) {
        if let Some(callback) = &self.progress {
            callback(ProgressUpdate {
                completed: self.metrics.completed_count(),
                total: self.total_planned,
                throughput: self.metrics.current_throughput().await,
            });
        }
    }
}
