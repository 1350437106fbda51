//! Liveness and system overview handlers.

use axum::{extract::State, Json};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::http::error::{ApiError, RequestTrace};
use crate::http::server::AppState;
use crate::observability::logging::error_fields;

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": now_iso(),
        "tasksCount": state.tasks.len(),
    }))
}

/// Combines local state with the service's own health endpoint as seen
/// through the loopback interface.
pub async fn system_overview(
    State(state): State<AppState>,
    RequestTrace(trace): RequestTrace,
) -> Result<Json<Value>, ApiError> {
    match state.probe.fetch(trace.as_ref()).await {
        Ok(upstream_health) => Ok(Json(json!({
            "service": state.config.service_name,
            "timestamp": now_iso(),
            "tasksCount": state.tasks.len(),
            "upstreamHealth": upstream_health,
        }))),
        Err(e) => {
            let mut fields = error_fields(e.kind(), &e);
            fields["probe_target"] = json!(state.probe.target().to_string());
            state
                .logger
                .error("system_overview_failed", fields, trace.as_ref());
            Err(ApiError::Upstream)
        }
    }
}
