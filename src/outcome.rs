//! Per-request outcome records handed from virtual users to the aggregator

use crate::common::UserId;
use crate::errors::RequestFailure;

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Completed HTTP exchange as reported by a request executor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub ok: bool,
}

impl HttpResponse {
    /// Build a response whose `ok` flag follows the 2xx convention
    pub fn from_status(status: u16) -> Self {
        Self {
            status,
            ok: (200..300).contains(&status),
        }
    }
}

/// Result of one request attempt
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOutcome {
    pub user_id: u32,
    pub success: bool,
    pub status_code: Option<u16>,
    pub latency_ms: f64,
    pub completed_at: DateTime<Utc>,
    pub error: Option<String>,
}

impl RequestOutcome {
    /// Fold an executor result and its measured latency into an outcome
    pub fn from_result(
        user_id: UserId,
        result: Result<HttpResponse, RequestFailure>,
        latency: Duration,
    ) -> Self {
        let latency_ms = latency.as_nanos() as f64 / 1_000_000.0;
        match result {
            Ok(response) if response.ok => Self::success(user_id, response.status, latency_ms),
            Ok(response) => Self::failure(
                user_id,
                &RequestFailure::Protocol(response.status),
                latency_ms,
            ),
            Err(failure) => Self::failure(user_id, &failure, latency_ms),
        }
    }

    pub fn success(user_id: UserId, status: u16, latency_ms: f64) -> Self {
        Self {
            user_id: user_id.get(),
            success: true,
            status_code: Some(status),
            latency_ms: latency_ms.max(0.0),
            completed_at: Utc::now(),
            error: None,
        }
    }

    pub fn failure(user_id: UserId, failure: &RequestFailure, latency_ms: f64) -> Self {
        Self {
            user_id: user_id.get(),
            success: false,
            status_code: failure.status_code(),
            latency_ms: latency_ms.max(0.0),
            completed_at: Utc::now(),
            error: Some(failure.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_response_becomes_success() {
        let outcome = RequestOutcome::from_result(
            UserId(3),
            Ok(HttpResponse::from_status(204)),
            Duration::from_millis(12),
        );
        assert!(outcome.success);
        assert_eq!(outcome.status_code, Some(204));
        assert_eq!(outcome.error, None);
        assert_eq!(outcome.user_id, 3);
        assert_eq!(outcome.latency_ms, 12.0);
    }

    #[test]
    fn test_error_status_becomes_protocol_failure() {
        let outcome = RequestOutcome::from_result(
            UserId(0),
            Ok(HttpResponse::from_status(503)),
            Duration::from_millis(5),
        );
        assert!(!outcome.success);
        assert_eq!(outcome.status_code, Some(503));
        assert_eq!(outcome.error.as_deref(), Some("HTTP 503"));
    }

    #[test]
    fn test_timeout_has_no_status() {
        let outcome = RequestOutcome::from_result(
            UserId(0),
            Err(RequestFailure::Timeout(Duration::from_millis(250))),
            Duration::from_millis(250),
        );
        assert!(!outcome.success);
        assert_eq!(outcome.status_code, None);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Request timed out after 250ms")
        );
    }

    #[test]
    fn test_redirect_status_is_not_ok() {
        assert!(!HttpResponse::from_status(301).ok);
        assert!(HttpResponse::from_status(200).ok);
    }
}
