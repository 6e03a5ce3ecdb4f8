//! Default values and default filling for partially specified runs

use super::{HttpMethod, RequestBody, RunConfiguration};
use std::time::Duration;

/// Default configuration values
pub struct Defaults;

impl Defaults {
    pub const METHOD: HttpMethod = HttpMethod::Get;
    pub const TIMEOUT_MS: u64 = 30_000;
    pub const RAMP_UP_SECONDS: f64 = 0.0;
    pub const REQUEST_DELAY_MS: u64 = 0;
    pub const CONCURRENT_USERS: u32 = 10;
    pub const REQUESTS_PER_USER: u32 = 10;
}

/// A run description where only the target and load shape are mandatory
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub url: String,
    pub concurrent_users: u32,
    pub requests_per_user: u32,
    pub method: Option<HttpMethod>,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub ramp_up: Option<Duration>,
    pub request_delay: Option<Duration>,
    pub timeout: Option<Duration>,
}

impl RunOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            concurrent_users: Defaults::CONCURRENT_USERS,
            requests_per_user: Defaults::REQUESTS_PER_USER,
            method: None,
            headers: Vec::new(),
            body: None,
            ramp_up: None,
            request_delay: None,
            timeout: None,
        }
    }

    /// Replace every omitted field with its default. Does not validate.
    pub fn with_defaults(self) -> RunConfiguration {
        RunConfiguration {
            url: self.url,
            method: self.method.unwrap_or(Defaults::METHOD),
            headers: self.headers,
            body: self.body,
            concurrent_users: self.concurrent_users,
            requests_per_user: self.requests_per_user,
            ramp_up: self
                .ramp_up
                .unwrap_or(Duration::from_secs_f64(Defaults::RAMP_UP_SECONDS)),
            request_delay: self
                .request_delay
                .unwrap_or(Duration::from_millis(Defaults::REQUEST_DELAY_MS)),
            timeout: self
                .timeout
                .unwrap_or(Duration::from_millis(Defaults::TIMEOUT_MS)),
        }
    }
}
