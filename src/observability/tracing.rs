//! Distributed trace context.
//!
//! # Responsibilities
//! - Extract W3C Trace Context (`traceparent`) from incoming requests
//! - Mint a server span id for every request handled
//! - Hand the active context to the logger and outgoing probe requests
//!
//! # Design Decisions
//! - Lookup is explicit: the middleware asks a [`TraceContextProvider`]
//!   once per request and carries the answer in request extensions
//! - Exporting spans is out of scope; only identifiers flow through

use axum::http::HeaderMap;
use rand::Rng;

/// W3C Trace Context header name.
pub const TRACEPARENT: &str = "traceparent";

/// Identifiers of the span serving the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    /// 32 lowercase hex characters.
    pub trace_id: String,
    /// 16 lowercase hex characters.
    pub span_id: String,
}

impl TraceContext {
    /// Start a new root trace.
    pub fn new_root() -> Self {
        let mut rng = rand::thread_rng();
        let trace: u128 = rng.gen_range(1..=u128::MAX);
        Self {
            trace_id: format!("{trace:032x}"),
            span_id: new_span_id(),
        }
    }

    /// Continue `self`'s trace with a fresh span id.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: new_span_id(),
        }
    }

    /// Parse a `traceparent` header value (`00-<trace>-<parent>-<flags>`).
    ///
    /// The returned context carries the *parent* span id; callers serving the
    /// request should take [`TraceContext::child`].
    pub fn from_traceparent(value: &str) -> Option<Self> {
        let mut parts = value.trim().split('-');
        let version = parts.next()?;
        let trace_id = parts.next()?;
        let parent_id = parts.next()?;
        let flags = parts.next()?;

        if version.len() != 2 || !is_lower_hex(version) || version == "ff" {
            return None;
        }
        // Version 00 has exactly four fields.
        if version == "00" && parts.next().is_some() {
            return None;
        }
        if flags.len() != 2 || !is_lower_hex(flags) {
            return None;
        }
        if !is_valid_id(trace_id, 32) || !is_valid_id(parent_id, 16) {
            return None;
        }

        Some(Self {
            trace_id: trace_id.to_string(),
            span_id: parent_id.to_string(),
        })
    }

    /// Render as a `traceparent` value with the sampled flag set.
    pub fn to_traceparent(&self) -> String {
        format!("00-{}-{}-01", self.trace_id, self.span_id)
    }
}

fn new_span_id() -> String {
    let span: u64 = rand::thread_rng().gen_range(1..=u64::MAX);
    format!("{span:016x}")
}

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn is_valid_id(s: &str, len: usize) -> bool {
    s.len() == len && is_lower_hex(s) && s.bytes().any(|b| b != b'0')
}

/// Source of the active trace context for a request.
pub trait TraceContextProvider: Send + Sync {
    /// Return the context the current request should be correlated with,
    /// or `None` when tracing is unavailable.
    fn current(&self, headers: &HeaderMap) -> Option<TraceContext>;
}

/// W3C Trace Context propagation.
///
/// An incoming `traceparent` is continued with a new server span; requests
/// without one start a new trace.
#[derive(Debug, Clone, Copy, Default)]
pub struct W3cPropagator;

impl TraceContextProvider for W3cPropagator {
    fn current(&self, headers: &HeaderMap) -> Option<TraceContext> {
        let incoming = headers
            .get(TRACEPARENT)
            .and_then(|v| v.to_str().ok())
            .and_then(TraceContext::from_traceparent);

        match incoming {
            Some(parent) => Some(parent.child()),
            None => Some(TraceContext::new_root()),
        }
    }
}

/// Provider used when tracing is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDisabled;

impl TraceContextProvider for TracingDisabled {
    fn current(&self, _headers: &HeaderMap) -> Option<TraceContext> {
        None
    }
}
