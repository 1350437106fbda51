//! Configuration schema definitions.
//!
//! Every option can be given as a CLI flag or through its environment
//! variable; defaults allow running with no configuration at all.

use std::time::Duration;

use clap::Parser;

/// Root configuration for the TaskFlow backend.
#[derive(Debug, Clone, Parser)]
#[command(name = "taskflow", version, about = "Task tracking service with RED metrics and trace-correlated logs")]
pub struct Config {
    /// Bind host.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Listen port.
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Service identity reported in logs and the system overview.
    #[arg(long = "service-name", env = "OTEL_SERVICE_NAME", default_value = "taskflow-backend")]
    pub service_name: String,

    /// Timeout for the loopback health probe, in milliseconds.
    #[arg(long, env = "INTERNAL_HEALTH_TIMEOUT_MS", default_value_t = 2000)]
    pub internal_health_timeout_ms: u64,

    /// Disable trace context propagation and trace fields in logs.
    #[arg(long = "otel-sdk-disabled", env = "OTEL_SDK_DISABLED", default_value_t = false)]
    pub tracing_disabled: bool,

    /// Per-request timeout, in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            service_name: "taskflow-backend".to_string(),
            internal_health_timeout_ms: 2000,
            tracing_disabled: false,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn internal_health_timeout(&self) -> Duration {
        Duration::from_millis(self.internal_health_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
