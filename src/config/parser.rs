//! Command-line argument parsing for Stampede configuration

use clap::{Parser, ValueEnum};
use std::time::Duration;

use super::{Config, HttpMethod, OutputConfig, OutputFormat, RequestBody, RunOptions};
use crate::constants::DEFAULT_MAX_FAILURE_RATE_PERCENT;
use crate::errors::{ErrorContext, Result, StressError};

/// HTTP method for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HttpMethodArg {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

/// Report format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    /// Human-readable report
    Text,
    /// Pretty-printed JSON summary
    Json,
}

/// Raw configuration from command line arguments
#[derive(Parser, Debug, Clone)]
#[command(
    name = "stampede",
    version,
    about = "Generates concurrent HTTP load against a single endpoint and reports latency, throughput and errors",
    long_about = None
)]
pub struct RawConfig {
    /// Target URL
    #[arg(
        short = 'u',
        long = "url",
        value_name = "URL",
        help = "Target URL to test (http or https)"
    )]
    pub url: String,

    /// Number of concurrent virtual users
    #[arg(
        short = 'c',
        long = "concurrent",
        value_name = "COUNT",
        default_value = "10",
        help = "Number of concurrent users"
    )]
    pub concurrent: u32,

    /// Requests issued by each user
    #[arg(
        short = 'n',
        long = "requests",
        value_name = "COUNT",
        default_value = "10",
        help = "Number of requests per user"
    )]
    pub requests: u32,

    /// HTTP method
    #[arg(
        short = 'm',
        long = "method",
        value_enum,
        default_value = "get",
        help = "HTTP method"
    )]
    pub method: HttpMethodArg,

    /// Custom headers
    #[arg(
        short = 'H',
        long = "header",
        value_name = "HEADER",
        action = clap::ArgAction::Append,
        help = "Custom header in 'Key: Value' format (can be used multiple times)"
    )]
    pub headers: Vec<String>,

    /// Request body
    #[arg(
        short = 'd',
        long = "data",
        value_name = "BODY",
        help = "Request body data (sent with POST, PUT and PATCH)"
    )]
    pub data: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(
        short = 't',
        long = "timeout",
        value_name = "MS",
        default_value = "30000",
        help = "Request timeout in milliseconds"
    )]
    pub timeout: u64,

    /// Ramp-up window in seconds
    #[arg(
        short = 'r',
        long = "ramp-up",
        value_name = "SECONDS",
        default_value = "0",
        help = "Spread user start times over this many seconds"
    )]
    pub ramp_up: f64,

    /// Pause between requests of the same user
    #[arg(
        long = "delay",
        value_name = "MS",
        default_value = "0",
        help = "Delay between requests per user in milliseconds"
    )]
    pub delay: u64,

    /// Suppress the live progress line
    #[arg(short = 'q', long = "quiet", help = "Suppress progress output")]
    pub quiet: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose", help = "Enable verbose logging")]
    pub verbose: bool,

    /// Report format
    #[arg(
        long = "output",
        value_enum,
        default_value = "text",
        help = "Report format"
    )]
    pub output: OutputFormatArg,

    /// Failure threshold for the exit code
    #[arg(
        long = "max-failure-rate",
        value_name = "PERCENT",
        default_value_t = DEFAULT_MAX_FAILURE_RATE_PERCENT,
        help = "Exit with status 1 when more than this percentage of requests fail"
    )]
    pub max_failure_rate: f64,
}

impl RawConfig {
    /// Parse from command line arguments
    pub fn parse_from_args() -> Result<Self> {
        Ok(Self::parse())
    }

    /// Split a `Key: Value` header argument
    pub fn parse_header(header: &str) -> Result<(String, String)> {
        let (key, value) = header.split_once(':').with_config_context(&format!(
            "Invalid header format '{}'. Use 'Key: Value' format",
            header
        ))?;
        Ok((key.trim().to_string(), value.trim().to_string()))
    }

    /// Convert a seconds value into a duration, rejecting negative and non-finite input
    fn parse_ramp_up(seconds: f64) -> Result<Duration> {
        Duration::try_from_secs_f64(seconds)
            .with_config_context(&format!("Invalid ramp-up time '{}'", seconds))
    }
}

impl From<HttpMethodArg> for HttpMethod {
    fn from(arg: HttpMethodArg) -> Self {
        match arg {
            HttpMethodArg::Get => HttpMethod::Get,
            HttpMethodArg::Post => HttpMethod::Post,
            HttpMethodArg::Put => HttpMethod::Put,
            HttpMethodArg::Delete => HttpMethod::Delete,
            HttpMethodArg::Patch => HttpMethod::Patch,
        }
    }
}

impl TryFrom<RawConfig> for Config {
    type Error = StressError;

    fn try_from(raw: RawConfig) -> Result<Self> {
        let headers = raw
            .headers
            .iter()
            .map(|header| RawConfig::parse_header(header))
            .collect::<Result<Vec<_>>>()?;

        let options = RunOptions {
            url: raw.url,
            concurrent_users: raw.concurrent,
            requests_per_user: raw.requests,
            method: Some(raw.method.into()),
            headers,
            body: raw.data.map(RequestBody::Text),
            ramp_up: Some(RawConfig::parse_ramp_up(raw.ramp_up)?),
            request_delay: Some(Duration::from_millis(raw.delay)),
            timeout: Some(Duration::from_millis(raw.timeout)),
        };

        Ok(Config {
            run: options.with_defaults(),
            output: OutputConfig {
                quiet: raw.quiet,
                verbose: raw.verbose,
                format: match raw.output {
                    OutputFormatArg::Text => OutputFormat::Text,
                    OutputFormatArg::Json => OutputFormat::Json,
                },
                max_failure_rate: raw.max_failure_rate,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config> {
        let mut argv = vec!["stampede"];
        argv.extend_from_slice(args);
        let raw = RawConfig::try_parse_from(argv)
            .map_err(|e| StressError::config(e.to_string()))?;
        Config::try_from(raw)
    }

    #[test]
    fn test_minimal_arguments_use_defaults() {
        let config = parse(&["-u", "http://localhost:8080"]).unwrap();
        assert_eq!(config.run.url, "http://localhost:8080");
        assert_eq!(config.run.concurrent_users, 10);
        assert_eq!(config.run.requests_per_user, 10);
        assert_eq!(config.run.method, HttpMethod::Get);
        assert_eq!(config.run.timeout, Duration::from_millis(30_000));
        assert_eq!(config.run.ramp_up, Duration::ZERO);
        assert_eq!(config.run.request_delay, Duration::ZERO);
        assert!(!config.output.quiet);
        assert_eq!(config.output.format, OutputFormat::Text);
        assert_eq!(config.output.max_failure_rate, 10.0);
    }

    #[test]
    fn test_full_arguments() {
        let config = parse(&[
            "-u",
            "https://example.com/post",
            "-c",
            "4",
            "-n",
            "20",
            "-m",
            "post",
            "-H",
            "Content-Type: application/json",
            "-H",
            "Authorization: Bearer a:b",
            "-d",
            r#"{"name":"test"}"#,
            "-t",
            "15000",
            "-r",
            "2.5",
            "--delay",
            "100",
            "-q",
            "--output",
            "json",
            "--max-failure-rate",
            "5",
        ])
        .unwrap();

        assert_eq!(config.run.concurrent_users, 4);
        assert_eq!(config.run.requests_per_user, 20);
        assert_eq!(config.run.method, HttpMethod::Post);
        assert_eq!(
            config.run.headers,
            vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Authorization".to_string(), "Bearer a:b".to_string()),
            ]
        );
        assert_eq!(
            config.run.body,
            Some(RequestBody::Text(r#"{"name":"test"}"#.to_string()))
        );
        assert_eq!(config.run.timeout, Duration::from_millis(15_000));
        assert_eq!(config.run.ramp_up, Duration::from_millis(2_500));
        assert_eq!(config.run.request_delay, Duration::from_millis(100));
        assert!(config.output.quiet);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.output.max_failure_rate, 5.0);
    }

    #[test]
    fn test_url_is_required() {
        assert!(parse(&["-c", "2"]).is_err());
    }

    #[test]
    fn test_malformed_header_rejected() {
        assert!(parse(&["-u", "http://localhost", "-H", "NoColonHere"]).is_err());
    }

    #[test]
    fn test_negative_ramp_up_rejected() {
        assert!(parse(&["-u", "http://localhost", "--ramp-up=-1"]).is_err());
    }

    #[test]
    fn test_parse_header_trims() {
        let (key, value) = RawConfig::parse_header("  X-Trace :  abc ").unwrap();
        assert_eq!(key, "X-Trace");
        assert_eq!(value, "abc");
    }
}
