//! HTTP request executor backed by reqwest

use crate::client::{RequestExecutor, RequestSpec};
use crate::config::HttpMethod;
use crate::errors::{ErrorContext, RequestFailure, Result};
use crate::outcome::HttpResponse;

use async_trait::async_trait;
use std::error::Error as _;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Executor sharing one pooled reqwest client across every virtual user
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    http_client: reqwest::Client,
}

impl HttpExecutor {
    pub fn new() -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("stampede/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_transport_context("Failed to create HTTP client")?;
        Ok(Self { http_client })
    }

    /// Use a preconfigured client (proxies, TLS settings, ...)
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    fn build_http_request(
        &self,
        request: &RequestSpec,
    ) -> std::result::Result<reqwest::RequestBuilder, RequestFailure> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
        };

        let mut builder = self.http_client.request(method, &request.url);

        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }

        if let Some(body) = &request.body {
            let payload = body
                .to_payload()
                .map_err(|e| RequestFailure::Transport(e.to_string()))?;
            if let Some(content_type) = body.content_type()
                && !request.has_header("content-type")
            {
                builder = builder.header(reqwest::header::CONTENT_TYPE, content_type);
            }
            builder = builder.body(payload);
        }

        Ok(builder)
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    /// A request completes once its body has been read in full, so measured
    /// latency covers the whole download. A body that fails to arrive (reset,
    /// truncated) is a transport failure even when the status line was fine.
    async fn execute(
        &self,
        request: &RequestSpec,
        cancel: &CancellationToken,
    ) -> std::result::Result<HttpResponse, RequestFailure> {
        let builder = self.build_http_request(request)?;

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            // Drained bodies keep the pooled connection reusable
            response.bytes().await?;
            Ok::<_, reqwest::Error>(status)
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RequestFailure::Cancelled),
            result = timeout(request.timeout, exchange) => match result {
                Ok(Ok(status)) => Ok(HttpResponse::from_status(status)),
                Ok(Err(e)) if e.is_timeout() => Err(RequestFailure::Timeout(request.timeout)),
                Ok(Err(e)) => {
                    warn!("Request to {} failed: {}", request.url, e);
                    Err(RequestFailure::Transport(transport_label(&e)))
                }
                Err(_) => Err(RequestFailure::Timeout(request.timeout)),
            },
        }
    }
}

/// Top-level reqwest message plus its innermost cause
fn transport_label(error: &reqwest::Error) -> String {
    let mut root = error.source();
    while let Some(next) = root.and_then(|e| e.source()) {
        root = Some(next);
    }
    match root {
        Some(cause) => format!("{}: {}", error, cause),
        None => error.to_string(),
    }
}
