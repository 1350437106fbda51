//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (clap handles syntactic)
//! - Validate value ranges (timeouts > 0, names non-empty)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: &Config → Result<(), Vec<ValidationError>>

use crate::config::schema::Config;

/// Longest loopback probe timeout accepted, in milliseconds.
pub const MAX_INTERNAL_HEALTH_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("service name must not be empty")]
    EmptyServiceName,

    #[error("host must not be empty")]
    EmptyHost,

    #[error("internal health timeout must be between 1 and {MAX_INTERNAL_HEALTH_TIMEOUT_MS} ms, got {0}")]
    HealthTimeoutOutOfRange(u64),

    #[error("request timeout must be at least 1 second")]
    ZeroRequestTimeout,
}

pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.service_name.trim().is_empty() {
        errors.push(ValidationError::EmptyServiceName);
    }
    if config.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }
    if config.internal_health_timeout_ms == 0
        || config.internal_health_timeout_ms > MAX_INTERNAL_HEALTH_TIMEOUT_MS
    {
        errors.push(ValidationError::HealthTimeoutOutOfRange(
            config.internal_health_timeout_ms,
        ));
    }
    if config.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
