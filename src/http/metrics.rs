//! Prometheus scrape endpoint.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use crate::http::error::{ApiError, RequestTrace};
use crate::http::server::AppState;
use crate::observability::logging::error_fields;

pub async fn scrape(State(state): State<AppState>, RequestTrace(trace): RequestTrace) -> Response {
    match state.metrics.snapshot() {
        Ok(snapshot) => (
            [(header::CONTENT_TYPE, snapshot.content_type)],
            snapshot.payload,
        )
            .into_response(),
        Err(e) => {
            state.logger.error(
                "metrics_collection_failed",
                error_fields("MetricsError", &e),
                trace.as_ref(),
            );
            ApiError::MetricsUnavailable.into_response()
        }
    }
}
