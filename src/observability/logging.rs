//! Structured logging.
//!
//! # Responsibilities
//! - Write application events as line-delimited JSON records
//! - Stamp every record with timestamp, level, and service name
//! - Attach `trace_id`/`span_id` when a trace context is active
//! - Initialize the diagnostic channel (`tracing` on stderr)
//!
//! # Design Decisions
//! - One call produces one complete, flushed line; the sink lock is
//!   held for the whole write so concurrent records never interleave
//! - Reserved keys cannot be overridden by caller fields
//! - Sink failures go to the diagnostic channel, never to the caller

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::observability::tracing::TraceContext;

/// Keys owned by the logger.
pub const RESERVED_KEYS: [&str; 6] = ["timestamp", "level", "service", "message", "trace_id", "span_id"];

/// Severity of an application event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Level for a completed HTTP request: 5xx error, 4xx warn, else info.
    pub fn for_status(status_code: u16) -> Self {
        match status_code {
            500..=u16::MAX => LogLevel::Error,
            400..=499 => LogLevel::Warn,
            _ => LogLevel::Info,
        }
    }
}

/// Line-delimited JSON event logger.
pub struct StructuredLogger {
    service: String,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl StructuredLogger {
    /// Logger writing to the process's standard output.
    pub fn stdout(service: impl Into<String>) -> Self {
        Self::with_sink(service, io::stdout())
    }

    /// Logger writing to an arbitrary sink.
    pub fn with_sink(service: impl Into<String>, sink: impl Write + Send + 'static) -> Self {
        Self {
            service: service.into(),
            sink: Mutex::new(Box::new(sink)),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn info(&self, event: &str, fields: Value, trace: Option<&TraceContext>) {
        self.log(LogLevel::Info, event, fields, trace);
    }

    pub fn warn(&self, event: &str, fields: Value, trace: Option<&TraceContext>) {
        self.log(LogLevel::Warn, event, fields, trace);
    }

    pub fn error(&self, event: &str, fields: Value, trace: Option<&TraceContext>) {
        self.log(LogLevel::Error, event, fields, trace);
    }

    /// Emit one record.
    ///
    /// `fields` is normally a JSON object whose entries are merged after the
    /// fixed keys; `null` adds nothing and any other value lands under
    /// `detail`.
    pub fn log(&self, level: LogLevel, event: &str, fields: Value, trace: Option<&TraceContext>) {
        let record = self.build_record(level, event, fields, trace);
        if let Err(e) = self.write_line(&record) {
            tracing::error!(error = %e, event, "Failed to write log record");
        }
    }

    fn build_record(
        &self,
        level: LogLevel,
        event: &str,
        fields: Value,
        trace: Option<&TraceContext>,
    ) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert(
            "timestamp".into(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        record.insert("level".into(), Value::String(level.as_str().into()));
        record.insert("service".into(), Value::String(self.service.clone()));
        record.insert("message".into(), Value::String(event.into()));

        if let Some(ctx) = trace {
            record.insert("trace_id".into(), Value::String(ctx.trace_id.clone()));
            record.insert("span_id".into(), Value::String(ctx.span_id.clone()));
        }

        match fields {
            Value::Object(extra) => {
                for (key, value) in extra {
                    if RESERVED_KEYS.contains(&key.as_str()) {
                        continue;
                    }
                    record.insert(key, value);
                }
            }
            Value::Null => {}
            other => {
                record.insert("detail".into(), other);
            }
        }

        record
    }

    fn write_line(&self, record: &Map<String, Value>) -> io::Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        sink.write_all(&line)?;
        sink.flush()
    }
}

/// Error details for a log record: name, message, and the source chain.
pub fn error_fields(name: &str, error: &(dyn std::error::Error + 'static)) -> Value {
    let mut chain = vec![error.to_string()];
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }

    serde_json::json!({
        "error_name": name,
        "error_message": error.to_string(),
        "error_stack": chain.join(": "),
    })
}

/// Initialize the diagnostic subscriber on stderr.
///
/// Filter comes from `RUST_LOG`, defaulting to `taskflow=info,tower_http=warn`.
/// Calling this more than once is harmless.
pub fn init_diagnostics() {
    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskflow=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init();
}
