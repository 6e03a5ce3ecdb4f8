//! Load generation: request execution, virtual users and run orchestration
//!
//! - [`RequestExecutor`] is the seam between the orchestrator and the transport
//! - [`HttpExecutor`] performs real HTTP exchanges with reqwest
//! - [`user::VirtualUser`] runs one user's sequential request loop
//! - [`LoadOrchestrator`] launches users, tracks run status and collects results

pub mod http;
pub mod manager;
pub mod user;

// Re-export public types for easier access
pub use http::HttpExecutor;
pub use manager::{LoadOrchestrator, RunStatus};

use crate::config::{HttpMethod, RequestBody, RunConfiguration};
use crate::errors::RequestFailure;
use crate::outcome::HttpResponse;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Everything an executor needs to issue one request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub url: String,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    /// Already filtered by method: only POST/PUT/PATCH carry a body
    pub body: Option<RequestBody>,
    pub timeout: Duration,
}

impl RequestSpec {
    pub fn from_config(config: &RunConfiguration) -> Self {
        Self {
            url: config.url.clone(),
            method: config.method,
            headers: config.headers.clone(),
            body: config.effective_body().cloned(),
            timeout: config.timeout,
        }
    }

    /// Whether the caller already supplied a header with this name
    pub fn has_header(&self, name: &str) -> bool {
        self.headers
            .iter()
            .any(|(key, _)| key.eq_ignore_ascii_case(name))
    }
}

/// Performs a single request/response exchange.
///
/// Implementations must enforce `request.timeout` and should abort promptly
/// once `cancel` fires. Every failure is reported through [`RequestFailure`];
/// nothing here is allowed to abort the run.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(
        &self,
        request: &RequestSpec,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, RequestFailure>;
}

/// Snapshot delivered to the progress sink after every recorded outcome
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    pub completed: u64,
    pub total: u64,
    pub throughput: f64,
}

impl ProgressUpdate {
    /// Whole-number completion percentage
    pub fn percent(&self) -> u64 {
        if self.total == 0 {
            return 0;
        }
        self.completed * 100 / self.total
    }
}

/// Progress sink shared by every user task
pub type ProgressCallback = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;
