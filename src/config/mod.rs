//! Configuration management for the Stampede load generator
//!
//! This module provides a layered approach to configuration:
//! - Core structures and enums
//! - CLI argument parsing
//! - Default filling for partially specified runs
//! - Configuration validation

pub mod defaults;
pub mod parser;
pub mod validation;

pub use defaults::{Defaults, RunOptions};

use crate::constants::REPORT_RULE;
use crate::errors::Result;
use std::time::Duration;

/// HTTP method used by every virtual user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }

    /// Whether a configured body is transmitted with this method
    pub fn allows_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body sent with POST/PUT/PATCH requests
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Sent verbatim
    Text(String),
    /// Serialized and sent as `application/json`
    Json(serde_json::Value),
}

impl RequestBody {
    /// Serialize the body into the bytes sent on the wire
    pub fn to_payload(&self) -> Result<String> {
        match self {
            RequestBody::Text(text) => Ok(text.clone()),
            RequestBody::Json(value) => Ok(serde_json::to_string(value)?),
        }
    }

    /// Content type implied by the body kind, if any
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            RequestBody::Text(_) => None,
            RequestBody::Json(_) => Some("application/json"),
        }
    }
}

/// Immutable description of one load run
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfiguration {
    pub url: String,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub concurrent_users: u32,
    pub requests_per_user: u32,
    pub ramp_up: Duration,
    pub request_delay: Duration,
    pub timeout: Duration,
}

impl RunConfiguration {
    /// Fill defaults for a partially specified run and validate the result
    pub fn from_options(options: RunOptions) -> Result<Self> {
        let config = options.with_defaults();
        validation::validate_run(&config)?;
        Ok(config)
    }

    /// Number of requests the run plans to issue
    pub fn total_requests(&self) -> u64 {
        u64::from(self.concurrent_users) * u64::from(self.requests_per_user)
    }

    /// Spacing between successive user launches during ramp-up
    pub fn stagger_interval(&self) -> Duration {
        if self.ramp_up.is_zero() || self.concurrent_users == 0 {
            Duration::ZERO
        } else {
            self.ramp_up / self.concurrent_users
        }
    }

    /// Body to transmit, taking the method into account
    pub fn effective_body(&self) -> Option<&RequestBody> {
        self.body.as_ref().filter(|_| self.method.allows_body())
    }

    /// Render the configuration banner printed before a run
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str(REPORT_RULE);
        out.push('\n');
        out.push_str("                           STRESS TEST CONFIGURATION\n");
        out.push_str(REPORT_RULE);
        out.push('\n');
        out.push_str(&format!("URL:                  {}\n", self.url));
        out.push_str(&format!("Method:               {}\n", self.method));
        out.push_str(&format!("Concurrent Users:     {}\n", self.concurrent_users));
        out.push_str(&format!("Requests per User:    {}\n", self.requests_per_user));
        out.push_str(&format!("Total Requests:       {}\n", self.total_requests()));
        out.push_str(&format!("Timeout:              {}ms\n", self.timeout.as_millis()));
        out.push_str(&format!(
            "Ramp Up Time:         {}s\n",
            self.ramp_up.as_secs_f64()
        ));
        out.push_str(&format!(
            "Request Delay:        {}ms\n",
            self.request_delay.as_millis()
        ));
        if !self.headers.is_empty() {
            out.push_str(&format!("Custom Headers:       {}\n", self.headers.len()));
            for (name, value) in &self.headers {
                out.push_str(&format!("                      {}: {}\n", name, value));
            }
        }
        out.push_str(REPORT_RULE);
        out.push('\n');
        out
    }
}

/// Report rendering format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Output configuration for the command-line surface
#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub quiet: bool,
    pub verbose: bool,
    pub format: OutputFormat,
    /// Failure percentage above which the process exits non-zero
    pub max_failure_rate: f64,
}

/// Main configuration structure for the binary
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub run: RunConfiguration,
    pub output: OutputConfig,
}

impl Config {
    /// Parse and validate configuration from command line arguments
    pub fn from_args() -> Result<Self> {
        let raw_config = parser::RawConfig::parse_from_args()?;
        let config = raw_config.try_into()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("{}", self.run.summary());
    }
}
