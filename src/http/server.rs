//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (observation, tracing, CORS, timeouts, limits, panics)
//! - Bind server to listener
//! - Serve until the shutdown coordinator fires

use std::any::Any;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::Config;
use crate::health::HealthProbe;
use crate::http::middleware::observe_request;
use crate::http::{health, metrics, tasks};
use crate::lifecycle::Shutdown;
use crate::observability::logging::StructuredLogger;
use crate::observability::metrics::{MetricsError, MetricsRegistry};
use crate::observability::tracing::{TraceContextProvider, TracingDisabled, W3cPropagator};
use crate::observability::Observability;
use crate::tasks::TaskStore;

/// Largest request body accepted.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("server I/O error")]
    Io(#[from] std::io::Error),

    #[error("metrics registry unavailable")]
    Metrics(#[from] MetricsError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tasks: Arc<TaskStore>,
    pub metrics: Arc<MetricsRegistry>,
    pub logger: Arc<StructuredLogger>,
    pub tracer: Arc<dyn TraceContextProvider>,
    pub probe: Arc<HealthProbe>,
    pub shutdown: Arc<Shutdown>,
}

impl AppState {
    pub fn observability(&self) -> Observability {
        Observability {
            metrics: self.metrics.clone(),
            logger: self.logger.clone(),
            tracer: self.tracer.clone(),
        }
    }

    /// Drop every task and every metric sample. Intended for tests.
    pub fn reset_in_memory_data(&self) -> Result<(), MetricsError> {
        self.tasks.clear();
        self.metrics.reset()?;
        self.tasks.publish_count();
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
///
/// The observation middleware is the outermost layer so it also sees
/// panics, timeouts, CORS preflights and routing misses.
#[allow(deprecated)]
pub fn build_router(state: AppState) -> Router {
    let observability = state.observability();
    let panic_logger = state.logger.clone();
    let request_timeout = state.config.request_timeout();

    Router::new()
        .route("/metrics", get(metrics::scrape))
        .route("/health", get(health::health))
        .route("/api/system/overview", get(health::system_overview))
        .route("/api/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/api/tasks/{id}",
            put(tasks::update_task)
                .patch(tasks::update_task_status)
                .delete(tasks::delete_task),
        )
        .fallback(tasks::route_not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::custom(move |panic: Box<dyn Any + Send + 'static>| {
            handle_panic(&panic_logger, panic)
        }))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn_with_state(observability, observe_request))
}

fn handle_panic(logger: &StructuredLogger, panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    logger.error(
        "unhandled_error",
        json!({
            "error_name": "Panic",
            "error_message": message,
            "error_stack": message,
        }),
        None,
    );

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Something went wrong!" })),
    )
        .into_response()
}

/// HTTP server for the task service.
pub struct HttpServer {
    listener: TcpListener,
    state: AppState,
}

impl HttpServer {
    /// Create a server around an already bound listener.
    ///
    /// The overview probe targets `127.0.0.1` on the listener's port.
    pub fn new(
        config: Config,
        listener: TcpListener,
        logger: Arc<StructuredLogger>,
    ) -> Result<Self, ServerError> {
        let local_addr = listener.local_addr()?;
        let probe_target = SocketAddr::new(Ipv4Addr::LOCALHOST.into(), local_addr.port());
        let probe = HealthProbe::new(probe_target, config.internal_health_timeout());

        let tracer: Arc<dyn TraceContextProvider> = if config.tracing_disabled {
            Arc::new(TracingDisabled)
        } else {
            Arc::new(W3cPropagator)
        };

        let metrics = Arc::new(MetricsRegistry::new()?);
        let gauge = metrics.clone();
        let tasks = TaskStore::with_count_observer(move |count| gauge.set_entity_count(count));

        let state = AppState {
            config: Arc::new(config),
            tasks: Arc::new(tasks),
            metrics,
            logger,
            tracer,
            probe: Arc::new(probe),
            shutdown: Arc::new(Shutdown::new()),
        };
        state.tasks.publish_count();

        Ok(Self { listener, state })
    }

    /// Replace the loopback health probe.
    pub fn with_probe(mut self, probe: HealthProbe) -> Self {
        self.state.probe = Arc::new(probe);
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn shutdown(&self) -> Arc<Shutdown> {
        self.state.shutdown.clone()
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Serve until shutdown is triggered and in-flight requests drain.
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let shutdown = self.state.shutdown.clone();
        let app = build_router(self.state).into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(self.listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::observability::exposition::sample_value;
    use crate::observability::metrics::TASKS_TOTAL;

    async fn test_state() -> AppState {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let logger = Arc::new(StructuredLogger::with_sink("test", std::io::sink()));
        HttpServer::new(Config::default(), listener, logger)
            .unwrap()
            .state()
            .clone()
    }

    async fn send(router: Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let request = builder
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_fallback_route_not_found() {
        let router = build_router(test_state().await);
        let (status, body) = send(router, "GET", "/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Route not found" }));
    }

    #[tokio::test]
    async fn test_malformed_json_rejected() {
        let router = build_router(test_state().await);
        let (status, body) = send(router, "POST", "/api/tasks", Some("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid JSON payload" }));
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let router = build_router(test_state().await);
        let title = "a".repeat(MAX_BODY_BYTES + 1);
        let payload = json!({ "title": title }).to_string();
        let (status, _) = send(router, "POST", "/api/tasks", Some(&payload)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_put_checks_existence_before_validation() {
        let router = build_router(test_state().await);
        let uri = format!("/api/tasks/{}", uuid::Uuid::new_v4());
        let (status, body) = send(router, "PUT", &uri, Some(r#"{"title":""}"#)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Task not found" }));
    }

    #[tokio::test]
    async fn test_gauge_tracks_creates_and_reset() {
        let state = test_state().await;
        let router = build_router(state.clone());

        let (status, _) = send(router.clone(), "POST", "/api/tasks", Some(r#"{"title":"one"}"#)).await;
        assert_eq!(status, StatusCode::CREATED);
        let payload = state.metrics.snapshot().unwrap().payload;
        assert_eq!(sample_value(&payload, TASKS_TOTAL, &[]), Some(1.0));

        state.reset_in_memory_data().unwrap();
        assert!(state.tasks.is_empty());
        let payload = state.metrics.snapshot().unwrap().payload;
        assert_eq!(sample_value(&payload, TASKS_TOTAL, &[]), Some(0.0));
    }

    #[test]
    fn test_panic_handler_body() {
        let logger = StructuredLogger::with_sink("test", std::io::sink());
        let response = handle_panic(&logger, Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
