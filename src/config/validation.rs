//! Configuration validation logic

use super::{Config, RunConfiguration};
use crate::constants::MAX_USERS_LIMIT;
use crate::errors::{Result, StressError};
use url::Url;

/// Validate the full binary configuration
pub fn validate(config: &Config) -> Result<()> {
    validate_run(&config.run)?;
    validate_output(config)?;
    Ok(())
}

/// Validate a run configuration before any user is launched
pub fn validate_run(config: &RunConfiguration) -> Result<()> {
    validate_target(config)?;
    validate_load_shape(config)?;
    validate_timing(config)?;
    validate_headers(config)?;
    Ok(())
}

/// Validate target URL
fn validate_target(config: &RunConfiguration) -> Result<()> {
    let url = Url::parse(&config.url).map_err(|e| {
        StressError::config(format!("Invalid target URL '{}': {}", config.url, e))
    })?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(StressError::config(format!(
            "Invalid URL scheme '{}'. Only 'http' and 'https' are supported",
            scheme
        ))),
    }
}

/// Validate user and request counts
fn validate_load_shape(config: &RunConfiguration) -> Result<()> {
    if config.concurrent_users == 0 {
        return Err(StressError::config(
            "Number of concurrent users must be greater than 0",
        ));
    }

    if config.concurrent_users > MAX_USERS_LIMIT {
        return Err(StressError::config(format!(
            "Number of concurrent users cannot exceed {}",
            MAX_USERS_LIMIT
        )));
    }

    if config.requests_per_user == 0 {
        return Err(StressError::config(
            "Number of requests per user must be greater than 0",
        ));
    }

    Ok(())
}

/// Validate timeout
fn validate_timing(config: &RunConfiguration) -> Result<()> {
    if config.timeout.is_zero() {
        return Err(StressError::config("Timeout must be greater than 0"));
    }
    Ok(())
}

/// Validate custom headers
fn validate_headers(config: &RunConfiguration) -> Result<()> {
    for (name, _) in &config.headers {
        if name.trim().is_empty() {
            return Err(StressError::config("Header name cannot be empty"));
        }
    }
    Ok(())
}

/// Validate output configuration
fn validate_output(config: &Config) -> Result<()> {
    let rate = config.output.max_failure_rate;
    if !rate.is_finite() || !(0.0..=100.0).contains(&rate) {
        return Err(StressError::config(format!(
            "Maximum failure rate must be between 0 and 100 percent, got {}",
            rate
        )));
    }
    Ok(())
}
