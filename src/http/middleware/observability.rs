//! Request observation middleware.
//!
//! Wraps every request, including fallbacks and framework rejections
//! (400, 404, 405, 413). Each request produces exactly one metrics update
//! and one `http_request_completed` log record, whether it finishes
//! normally or its future is dropped early.

use std::net::SocketAddr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::observability::route::normalize_path;
use crate::observability::tracing::TraceContext;
use crate::observability::{Observability, RequestObservation};

const UNKNOWN: &str = "unknown";

/// Scrapes are counted but never start or continue a trace.
const METRICS_PATH: &str = "/metrics";

/// Completion hook for one request.
///
/// Calling [`complete`](Self::complete) records the response status.
/// Dropping the guard without completing it records the request as
/// abandoned. Either way the observation is written exactly once.
pub struct InFlightRequest {
    observability: Observability,
    started: Instant,
    method: String,
    path: String,
    remote_address: String,
    user_agent: String,
    trace: Option<TraceContext>,
    finished: bool,
}

impl InFlightRequest {
    pub fn start(observability: Observability, request: &Request, trace: Option<TraceContext>) -> Self {
        let remote_address = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| UNKNOWN.to_string());
        let user_agent = request
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string();

        Self {
            observability,
            started: Instant::now(),
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            remote_address,
            user_agent,
            trace,
            finished: false,
        }
    }

    pub fn trace(&self) -> Option<&TraceContext> {
        self.trace.as_ref()
    }

    pub fn complete(mut self, status_code: u16) {
        self.finish(Some(status_code));
    }

    fn finish(&mut self, status_code: Option<u16>) {
        if self.finished {
            return;
        }
        self.finished = true;

        let observation = RequestObservation {
            method: std::mem::take(&mut self.method),
            route: normalize_path(Some(&self.path)),
            status_code,
            duration_seconds: self.started.elapsed().as_secs_f64(),
            remote_address: std::mem::take(&mut self.remote_address),
            user_agent: std::mem::take(&mut self.user_agent),
            trace: self.trace.take(),
        };

        let observability = &self.observability;
        if catch_unwind(AssertUnwindSafe(|| observability.record(&observation))).is_err() {
            tracing::error!(
                method = %observation.method,
                route = %observation.route,
                "Failed to record request observation"
            );
        }
    }
}

impl Drop for InFlightRequest {
    fn drop(&mut self) {
        self.finish(None);
    }
}

/// Axum middleware entry point.
pub async fn observe_request(
    State(observability): State<Observability>,
    mut request: Request,
    next: Next,
) -> Response {
    let trace = if request.uri().path() == METRICS_PATH {
        None
    } else {
        observability.tracer.current(request.headers())
    };
    if let Some(trace) = &trace {
        request.extensions_mut().insert(trace.clone());
    }

    let guard = InFlightRequest::start(observability, &request, trace);
    let response = next.run(request).await;
    guard.complete(response.status().as_u16());
    response
}
