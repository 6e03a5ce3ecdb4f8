//! Stampede: concurrent HTTP load generation with streaming latency statistics
//!
//! A run launches `concurrent_users` virtual users, optionally staggered over a
//! ramp-up window, each issuing `requests_per_user` requests in sequence. Every
//! outcome is folded into a shared [`metrics::MetricsAggregator`], and the run
//! returns an immutable [`metrics::RunSummary`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use stampede::client::{HttpExecutor, LoadOrchestrator};
//! use stampede::config::{RunConfiguration, RunOptions};
//!
//! # async fn demo() -> stampede::errors::Result<()> {
//! let config = RunConfiguration::from_options(RunOptions {
//!     concurrent_users: 5,
//!     requests_per_user: 10,
//!     ..RunOptions::new("https://httpbin.org/get")
//! })?;
//! let orchestrator = LoadOrchestrator::new(config, Arc::new(HttpExecutor::new()?))?;
//! let summary = orchestrator.run().await?;
//! println!("{}", summary);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod common;
pub mod config;
pub mod constants;
pub mod errors;
pub mod metrics;
pub mod outcome;
