//! Loopback health probe.
//!
//! # Responsibilities
//! - Issue GET /health against the service's own listener
//! - Propagate the caller's trace context
//! - Bound the whole exchange (connect, headers, body) by one timeout

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde_json::Value;
use tokio::time;

use crate::observability::tracing::{TraceContext, TRACEPARENT};

/// Header marking requests issued by the probe itself.
pub const PROBE_HEADER: &str = "x-observability-probe";
pub const PROBE_HEADER_VALUE: &str = "internal";

/// Largest health document accepted.
const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("health probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("health endpoint responded with status {0}")]
    Status(StatusCode),

    #[error("health endpoint unreachable")]
    Connect(#[source] hyper_util::client::legacy::Error),

    #[error("failed to read health response body")]
    Body(#[source] axum::Error),

    #[error("health response is not valid JSON")]
    Parse(#[source] serde_json::Error),

    #[error("failed to build health request")]
    Request(#[source] axum::http::Error),
}

impl ProbeError {
    /// Stable name used as `error_name` in log records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "ProbeTimeout",
            Self::Status(_) => "ProbeStatus",
            Self::Connect(_) => "ProbeConnect",
            Self::Body(_) => "ProbeBody",
            Self::Parse(_) => "ProbeParse",
            Self::Request(_) => "ProbeRequest",
        }
    }
}

pub struct HealthProbe {
    client: Client<HttpConnector, Body>,
    target: SocketAddr,
    timeout: Duration,
}

impl HealthProbe {
    pub fn new(target: SocketAddr, timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            client,
            target,
            timeout,
        }
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Fetch and parse the health document.
    pub async fn fetch(&self, trace: Option<&TraceContext>) -> Result<Value, ProbeError> {
        let mut builder = Request::builder()
            .method("GET")
            .uri(format!("http://{}/health", self.target))
            .header(header::ACCEPT, "application/json")
            .header(PROBE_HEADER, PROBE_HEADER_VALUE);
        if let Some(trace) = trace {
            builder = builder.header(TRACEPARENT, trace.to_traceparent());
        }
        let request = builder.body(Body::empty()).map_err(ProbeError::Request)?;

        match time::timeout(self.timeout, self.exchange(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        }
    }

    async fn exchange(&self, request: Request<Body>) -> Result<Value, ProbeError> {
        let response: hyper::Response<hyper::body::Incoming> = self
            .client
            .request(request)
            .await
            .map_err(ProbeError::Connect)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status));
        }

        let bytes = axum::body::to_bytes(Body::new(response.into_body()), MAX_BODY_BYTES)
            .await
            .map_err(ProbeError::Body)?;

        serde_json::from_slice(&bytes).map_err(ProbeError::Parse)
    }
}
