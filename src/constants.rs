//! Application-wide constants and configuration values

// Virtual user limits
pub const MAX_USERS_LIMIT: u32 = 10_000;

// Exit code policy
pub const DEFAULT_MAX_FAILURE_RATE_PERCENT: f64 = 10.0;

// Logging cadence
pub const DEBUG_LOG_INTERVAL: u32 = 100;

// Report layout
pub const REPORT_RULE: &str =
    "================================================================================";
