//! Run orchestration: launching virtual users and coordinating cancellation

use crate::client::user::VirtualUser;
use crate::client::{ProgressCallback, ProgressUpdate, RequestExecutor, RequestSpec};
use crate::common::UserId;
use crate::config::RunConfiguration;
use crate::config::validation::validate_run;
use crate::errors::{Result, StressError};
use crate::metrics::{MetricsAggregator, RunSummary};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
}

/// Drives a full load run against one endpoint
pub struct LoadOrchestrator {
    config: Arc<RunConfiguration>,
    executor: Arc<dyn RequestExecutor>,
    metrics: Arc<MetricsAggregator>,
    status: watch::Sender<RunStatus>,
    cancel: Mutex<CancellationToken>,
    /// Bumped on every run so a stale run never transitions a newer one
    generation: AtomicU64,
    progress: Option<ProgressCallback>,
}

/// Tears down a run whose future was dropped before it finished
struct RunGuard<'a> {
    orchestrator: &'a LoadOrchestrator,
    generation: u64,
    cancel: CancellationToken,
    armed: bool,
}

impl RunGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.cancel.cancel();
        if self
            .orchestrator
            .finish(self.generation, RunStatus::Cancelled)
        {
            warn!("Run abandoned before completion, stopping users");
        }
    }
}

impl LoadOrchestrator {
    /// Create an orchestrator, rejecting invalid configurations up front
    pub fn new(config: RunConfiguration, executor: Arc<dyn RequestExecutor>) -> Result<Self> {
        validate_run(&config)?;
        Ok(Self {
            config: Arc::new(config),
            executor,
            metrics: Arc::new(MetricsAggregator::new()),
            status: watch::Sender::new(RunStatus::Idle),
            cancel: Mutex::new(CancellationToken::new()),
            generation: AtomicU64::new(0),
            progress: None,
        })
    }

    /// Register the progress sink. Invoked concurrently from every user task.
    pub fn on_progress<F>(&mut self, callback: F)
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
    }

    pub fn config(&self) -> &RunConfiguration {
        &self.config
    }

    pub fn metrics(&self) -> Arc<MetricsAggregator> {
        Arc::clone(&self.metrics)
    }

    pub fn status(&self) -> RunStatus {
        *self.status.borrow()
    }

    /// Watch status transitions
    pub fn subscribe_status(&self) -> watch::Receiver<RunStatus> {
        self.status.subscribe()
    }

    /// Request cooperative cancellation of the current run. No-op unless running.
    pub fn cancel(&self) {
        let cancelled = self.status.send_if_modified(|status| {
            if *status != RunStatus::Running {
                return false;
            }
            *status = RunStatus::Cancelled;
            self.cancel_token().cancel();
            true
        });

        if cancelled {
            warn!(
                "Run cancelled after {} of {} requests",
                self.metrics.completed_count(),
                self.config.total_requests()
            );
        }
    }

    /// Execute the run and return its summary.
    ///
    /// Dropping the returned future before it resolves cancels the run: users
    /// stop at their next check and the status becomes `Cancelled`.
    pub async fn run(&self) -> Result<RunSummary> {
        let cancel = CancellationToken::new();
        let mut generation = 0;
        let began = self.status.send_if_modified(|status| {
            if *status == RunStatus::Running {
                return false;
            }
            *status = RunStatus::Running;
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *self.cancel_token() = cancel.clone();
            true
        });
        if !began {
            return Err(StressError::execution("A run is already in progress"));
        }

        let guard = RunGuard {
            orchestrator: self,
            generation,
            cancel: cancel.clone(),
            armed: true,
        };

        self.metrics.reset().await;
        self.metrics.start().await;

        info!(
            "Starting run: {} users x {} requests against {}",
            self.config.concurrent_users, self.config.requests_per_user, self.config.url
        );

        let handles = self.launch_users(&cancel).await;
        let issued = self.wait_for_users(handles).await;

        self.metrics.stop().await;
        guard.disarm();

        if self.finish(generation, RunStatus::Completed) {
            info!("Run completed with {} requests", issued);
        } else {
            info!("Run stopped early with {} requests", issued);
        }

        Ok(self.metrics.summarize().await)
    }

    /// Leave `Running` for `to`, only if `generation` is still the current run
    fn finish(&self, generation: u64, to: RunStatus) -> bool {
        self.status.send_if_modified(|status| {
            if *status != RunStatus::Running
                || self.generation.load(Ordering::SeqCst) != generation
            {
                return false;
            }
            *status = to;
            true
        })
    }

    /// Launch users in sequence, spacing them by the ramp-up stagger interval
    async fn launch_users(&self, cancel: &CancellationToken) -> Vec<JoinHandle<u32>> {
        let users = self.config.concurrent_users;
        let stagger = self.config.stagger_interval();
        let request = Arc::new(RequestSpec::from_config(&self.config));
        let mut handles = Vec::with_capacity(users as usize);

        for index in 0..users {
            if cancel.is_cancelled() {
                warn!("Stopped launching users after {} of {}", index, users);
                break;
            }

            let user = VirtualUser {
                user_id: UserId::from(index),
                request: Arc::clone(&request),
                requests: self.config.requests_per_user,
                delay: self.config.request_delay,
                total_planned: self.config.total_requests(),
                executor: Arc::clone(&self.executor),
                metrics: Arc::clone(&self.metrics),
                cancel: cancel.clone(),
                progress: self.progress.clone(),
            };
            handles.push(tokio::spawn(user.run()));

            if !stagger.is_zero() && index + 1 < users {
                tokio::select! {
                    _ = sleep(stagger) => {}
                    _ = cancel.cancelled() => {}
                }
            }
        }

        handles
    }

    /// Wait for every launched user; returns the number of requests issued
    async fn wait_for_users(&self, handles: Vec<JoinHandle<u32>>) -> u64 {
        info!("Waiting for {} users to finish...", handles.len());

        let mut issued = 0u64;
        for result in futures_util::future::join_all(handles).await {
            match result {
                Ok(count) => issued += u64::from(count),
                Err(e) => error!("User task failed: {}", e),
            }
        }
        issued
    }

    fn cancel_token(&self) -> MutexGuard<'_, CancellationToken> {
        self.cancel.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
