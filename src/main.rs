//! TaskFlow backend
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ observability middleware ──▶ router ──▶ handlers ──▶ TaskStore
//!                          │                                     │
//!                          ├── MetricsRegistry ◀── GET /metrics  │
//!                          └── StructuredLogger (stdout)         └── HealthProbe ──▶ GET /health
//! ```

use std::process::ExitCode;
use std::sync::{Arc, OnceLock};

use serde_json::json;
use tokio::net::TcpListener;

use taskflow::config::{load_config, Config, ConfigError};
use taskflow::http::HttpServer;
use taskflow::lifecycle::wait_for_signal;
use taskflow::observability::logging::{error_fields, init_diagnostics, StructuredLogger};

#[tokio::main]
async fn main() -> ExitCode {
    init_diagnostics();

    let config = match load_config() {
        Ok(config) => config,
        Err(ConfigError::Parse(e)) => e.exit(),
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        bind_address = %config.bind_address(),
        service = %config.service_name,
        tracing_disabled = config.tracing_disabled,
        "Configuration loaded"
    );

    let logger = Arc::new(StructuredLogger::stdout(config.service_name.clone()));
    let received = Arc::new(OnceLock::new());

    let result = run(config, logger.clone(), received.clone()).await;
    let signal = received.get().copied();

    match result {
        Ok(()) => {
            logger.info("shutdown_completed", json!({ "signal": signal }), None);
            ExitCode::SUCCESS
        }
        Err(e) => {
            let mut fields = error_fields("ServerError", e.as_ref());
            fields["signal"] = json!(signal);
            logger.error("shutdown_failed", fields, None);
            ExitCode::FAILURE
        }
    }
}

async fn run(
    config: Config,
    logger: Arc<StructuredLogger>,
    received: Arc<OnceLock<&'static str>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(config.bind_address()).await?;
    let port = listener.local_addr()?.port();

    let server = HttpServer::new(config, listener, logger.clone())?;
    let shutdown = server.shutdown();

    logger.info(
        "server_started",
        json!({
            "port": port,
            "health_endpoint": format!("http://localhost:{port}/health"),
            "metrics_endpoint": format!("http://localhost:{port}/metrics"),
        }),
        None,
    );

    let signal_task = tokio::spawn(async move {
        let signal = wait_for_signal().await;
        let _ = received.set(signal);
        logger.info("shutdown_started", json!({ "signal": signal }), None);
        shutdown.trigger();
    });

    let result = server.run().await;
    signal_task.abort();
    result?;
    Ok(())
}
