//! Fault injection parameters for `GET /api/tasks`.
//!
//! Values arrive as free-form query strings and are parsed leniently:
//! anything unparseable means "no injection".

use std::time::Duration;

use serde::Deserialize;

/// Upper bound on injected latency.
pub const MAX_DELAY_MS: u64 = 5000;

#[derive(Debug, Default, Deserialize)]
pub struct InjectionQuery {
    pub delay_ms: Option<String>,
    pub error_rate: Option<String>,
}

impl InjectionQuery {
    /// Requested delay, capped at [`MAX_DELAY_MS`]. Zero when absent,
    /// negative, or not a number.
    pub fn delay(&self) -> Duration {
        let millis = self
            .delay_ms
            .as_deref()
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|ms| ms.is_finite() && *ms > 0.0)
            .map(|ms| ms.min(MAX_DELAY_MS as f64) as u64)
            .unwrap_or(0);
        Duration::from_millis(millis)
    }

    /// Failure probability clamped to `[0, 1]`.
    pub fn error_rate(&self) -> f64 {
        self.error_rate
            .as_deref()
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|rate| rate.is_finite())
            .map(|rate| rate.clamp(0.0, 1.0))
            .unwrap_or(0.0)
    }

    /// Roll for an injected failure.
    pub fn should_fail(&self) -> bool {
        let rate = self.error_rate();
        rate > 0.0 && fastrand::f64() < rate
    }
}
