//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every request (http::middleware::observability):
//!     → tracing.rs (trace context captured once at start)
//!     → route.rs (path → route label at completion)
//!     → metrics.rs (counters, histogram)
//!     → logging.rs (one http_request_completed record)
//!
//! Consumers:
//!     → stdout (line-delimited JSON application log)
//!     → GET /metrics (Prometheus scrape)
//!     → stderr (diagnostic channel via the tracing crate)
//! ```
//!
//! # Design Decisions
//! - One registry and one logger per process, injected through state
//! - Trace context is an explicit value, never ambient state
//! - Observation failures are isolated from the response path

#[cfg(test)]
pub(crate) mod exposition;
pub mod logging;
pub mod metrics;
pub mod process;
pub mod route;
pub mod tracing;

use std::sync::Arc;

use serde_json::{json, Value};

use self::logging::{LogLevel, StructuredLogger};
use self::metrics::MetricsRegistry;
use self::tracing::{TraceContext, TraceContextProvider};

/// Event name for the per-request log record.
pub const HTTP_REQUEST_COMPLETED: &str = "http_request_completed";

/// Handles shared by every request-handling task.
#[derive(Clone)]
pub struct Observability {
    pub metrics: Arc<MetricsRegistry>,
    pub logger: Arc<StructuredLogger>,
    pub tracer: Arc<dyn TraceContextProvider>,
}

/// Everything measured about one finished request.
#[derive(Debug, Clone)]
pub struct RequestObservation {
    pub method: String,
    pub route: String,
    /// `None` when the request was abandoned before a response existed.
    pub status_code: Option<u16>,
    pub duration_seconds: f64,
    pub remote_address: String,
    pub user_agent: String,
    pub trace: Option<TraceContext>,
}

impl RequestObservation {
    pub fn level(&self) -> LogLevel {
        LogLevel::for_status(self.status_code.unwrap_or(0))
    }

    /// Duration in milliseconds rounded to two decimals.
    pub fn duration_ms(&self) -> f64 {
        (self.duration_seconds * 1000.0 * 100.0).round() / 100.0
    }

    pub fn log_fields(&self) -> Value {
        let mut fields = json!({
            "method": self.method,
            "route": self.route,
            "status_code": self.status_code.unwrap_or(0),
            "duration_ms": self.duration_ms(),
            "remote_address": self.remote_address,
            "user_agent": self.user_agent,
        });
        if self.status_code.is_none() {
            fields["client_aborted"] = Value::Bool(true);
        }
        fields
    }
}

impl Observability {
    /// Feed one observation into metrics, then the log.
    pub fn record(&self, observation: &RequestObservation) {
        self.metrics.record_request(
            &observation.method,
            &observation.route,
            observation.status_code,
            observation.duration_seconds,
        );
        self.logger.log(
            observation.level(),
            HTTP_REQUEST_COMPLETED,
            observation.log_fields(),
            observation.trace.as_ref(),
        );
    }
}
