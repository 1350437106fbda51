//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define the RED metrics for every HTTP request
//! - Track the current task count
//! - Render a Prometheus text snapshot for `/metrics`
//!
//! # Metrics
//! - `taskflow_http_requests_total` (counter): requests by method, route, status_code
//! - `taskflow_http_errors_total` (counter): same labels, status >= 400 only
//! - `taskflow_http_request_duration_seconds` (histogram): latency distribution
//! - `taskflow_tasks_total` (gauge): tasks currently stored
//! - `taskflow_process_*` (gauges): baseline process state
//!
//! # Design Decisions
//! - The recorder is owned by the registry, never installed globally; every
//!   update runs under `metrics::with_local_recorder`
//! - Counter updates are atomic inside the exporter's storage
//! - Reset swaps in a fresh recorder so writers never block on it
//! - Exporter upkeep runs inline every `UPKEEP_INTERVAL` requests, with
//!   no background task
//! - Error counters are registered at zero alongside request counters so
//!   every observed label set appears in both families

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

use crate::observability::process::ProcessCollector;

pub const REQUESTS_TOTAL: &str = "taskflow_http_requests_total";
pub const ERRORS_TOTAL: &str = "taskflow_http_errors_total";
pub const REQUEST_DURATION_SECONDS: &str = "taskflow_http_request_duration_seconds";
pub const TASKS_TOTAL: &str = "taskflow_tasks_total";

/// Histogram bucket upper bounds in seconds; `+Inf` is implicit.
pub const DURATION_BUCKETS: [f64; 10] = [0.01, 0.03, 0.05, 0.1, 0.2, 0.3, 0.5, 1.0, 2.0, 5.0];

/// Recorded requests between two exporter upkeep passes.
pub const UPKEEP_INTERVAL: u64 = 1024;

/// Content type of the text exposition format.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("failed to build metrics recorder")]
    Build(#[from] BuildError),

    #[error("metrics exporter panicked while rendering")]
    Render,
}

/// Rendered registry state.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub content_type: &'static str,
    pub payload: String,
}

/// Label set shared by the three request families.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLabels {
    pub method: String,
    pub route: String,
    pub status_code: String,
}

impl RequestLabels {
    /// Sanitize raw values into safe label values.
    pub fn new(method: &str, route: &str, status_code: Option<u16>) -> Self {
        let method = if method.trim().is_empty() {
            "UNKNOWN".to_string()
        } else {
            method.to_ascii_uppercase()
        };
        let route = if route.is_empty() {
            "unknown".to_string()
        } else {
            route.to_string()
        };
        let status_code = match status_code {
            Some(code) if code > 0 => code.to_string(),
            _ => "0".to_string(),
        };
        Self { method, route, status_code }
    }
}

struct RecorderSlot {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
}

impl RecorderSlot {
    fn build() -> Result<Self, MetricsError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
                &DURATION_BUCKETS,
            )?
            .build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            describe_counter!(REQUESTS_TOTAL, "Total number of HTTP requests handled by the backend");
            describe_counter!(ERRORS_TOTAL, "Total number of HTTP requests that returned 4xx or 5xx status codes");
            describe_histogram!(REQUEST_DURATION_SECONDS, "HTTP request duration in seconds");
            describe_gauge!(TASKS_TOTAL, "Current number of tasks stored in memory");
            ProcessCollector::describe();
        });

        Ok(Self { recorder, handle })
    }
}

/// Process-wide metrics state, shared by every request.
pub struct MetricsRegistry {
    slot: ArcSwap<RecorderSlot>,
    process: ProcessCollector,
    recorded: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self, MetricsError> {
        Ok(Self {
            slot: ArcSwap::from_pointee(RecorderSlot::build()?),
            process: ProcessCollector::new(),
            recorded: AtomicU64::new(0),
        })
    }

    /// Record one completed HTTP request.
    ///
    /// Never fails: malformed inputs degrade to safe label values and a
    /// negative or non-finite duration is recorded as zero.
    pub fn record_request(&self, method: &str, route: &str, status_code: Option<u16>, duration_seconds: f64) {
        let labels = RequestLabels::new(method, route, status_code);
        let duration = if duration_seconds.is_finite() && duration_seconds > 0.0 {
            duration_seconds
        } else {
            0.0
        };
        let is_error = status_code.is_some_and(|code| code >= 400);

        let slot = self.slot.load();
        metrics::with_local_recorder(&slot.recorder, || {
            counter!(REQUESTS_TOTAL,
                "method" => labels.method.clone(),
                "route" => labels.route.clone(),
                "status_code" => labels.status_code.clone()
            )
            .increment(1);

            histogram!(REQUEST_DURATION_SECONDS,
                "method" => labels.method.clone(),
                "route" => labels.route.clone(),
                "status_code" => labels.status_code.clone()
            )
            .record(duration);

            let errors = counter!(ERRORS_TOTAL,
                "method" => labels.method.clone(),
                "route" => labels.route.clone(),
                "status_code" => labels.status_code.clone()
            );
            if is_error {
                errors.increment(1);
            }
        });

        // Histogram samples stay buffered until rendered or upkept; no
        // scraper means no render, so drain them on a request count.
        if self.upkeep_due() {
            slot.handle.run_upkeep();
        }
    }

    fn upkeep_due(&self) -> bool {
        (self.recorded.fetch_add(1, Ordering::Relaxed) + 1) % UPKEEP_INTERVAL == 0
    }

    /// Set the current task count.
    pub fn set_entity_count(&self, count: usize) {
        let slot = self.slot.load();
        metrics::with_local_recorder(&slot.recorder, || {
            gauge!(TASKS_TOTAL).set(count as f64);
        });
    }

    /// Render every family in the Prometheus text format.
    pub fn snapshot(&self) -> Result<MetricsSnapshot, MetricsError> {
        let slot = self.slot.load();
        metrics::with_local_recorder(&slot.recorder, || self.process.collect());

        let payload = panic::catch_unwind(AssertUnwindSafe(|| slot.handle.render()))
            .map_err(|_| MetricsError::Render)?;

        Ok(MetricsSnapshot {
            content_type: PROMETHEUS_CONTENT_TYPE,
            payload,
        })
    }

    /// Drop all samples. Test and administrative use only.
    pub fn reset(&self) -> Result<(), MetricsError> {
        self.slot.store(Arc::new(RecorderSlot::build()?));
        Ok(())
    }
}
