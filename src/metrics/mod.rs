//! Metrics collection and reporting for the Stampede load generator
//!
//! This module provides:
//! - Streaming aggregation of request outcomes across all users
//! - Immutable run summaries with percentile latency
//! - Text and JSON report rendering

pub mod aggregate;
pub mod reporting;
pub mod summary;

// Re-export public types for easier access
pub use aggregate::MetricsAggregator;
pub use summary::RunSummary;
