//! Task CRUD handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::http::error::{ApiError, RequestTrace};
use crate::http::injection::InjectionQuery;
use crate::http::server::AppState;
use crate::observability::logging::error_fields;
use crate::tasks::{StatusPayload, Task, TaskPayload};

/// Failure produced on purpose by `error_rate`.
#[derive(Debug, thiserror::Error)]
#[error("simulated failure (error_rate={0})")]
pub struct InjectedFailure(pub f64);

/// Ids are compared as text, so anything that is not a stored UUID is
/// simply not found.
fn existing_id(state: &AppState, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw)
        .ok()
        .filter(|id| state.tasks.contains(*id))
        .ok_or(ApiError::TaskNotFound)
}

pub async fn list_tasks(
    State(state): State<AppState>,
    RequestTrace(trace): RequestTrace,
    query: Result<Query<InjectionQuery>, QueryRejection>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let query = query.map(|Query(q)| q).unwrap_or_default();

    let delay = query.delay();
    if !delay.is_zero() {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = state.shutdown.cancelled() => {
                tracing::debug!(?delay, "Injected delay cut short by shutdown");
            }
        }
    }

    if query.should_fail() {
        let failure = InjectedFailure(query.error_rate());
        state.logger.error(
            "task_list_failed",
            error_fields("InjectedFailure", &failure),
            trace.as_ref(),
        );
        return Err(ApiError::Internal);
    }

    Ok(Json(state.tasks.list()))
}

pub async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<TaskPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(payload) = payload?;
    let draft = payload.validate().map_err(ApiError::Validation)?;

    let task = state.tasks.create(draft);
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TaskPayload>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let Json(payload) = payload?;
    let id = existing_id(&state, &id)?;
    let draft = payload.validate().map_err(ApiError::Validation)?;

    state
        .tasks
        .update(id, draft)
        .map(Json)
        .ok_or(ApiError::TaskNotFound)
}

pub async fn update_task_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StatusPayload>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let Json(payload) = payload?;
    let id = existing_id(&state, &id)?;
    let completed = payload.validate().map_err(ApiError::Validation)?;

    state
        .tasks
        .set_completed(id, completed)
        .map(Json)
        .ok_or(ApiError::TaskNotFound)
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = existing_id(&state, &id)?;
    let task = state.tasks.delete(id).ok_or(ApiError::TaskNotFound)?;

    Ok(Json(json!({
        "message": "Task deleted successfully",
        "task": task,
    })))
}

pub async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}
