//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers)
//!     → middleware/observability.rs (start instant, trace context)
//!     → handlers (tasks.rs, health.rs, metrics.rs)
//!     → error.rs (ApiError → JSON error body)
//!     → middleware/observability.rs (metrics + one log record)
//!     → Send to client
//! ```

pub mod error;
pub mod health;
pub mod injection;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod tasks;

pub use error::{ApiError, RequestTrace};
pub use server::{build_router, AppState, HttpServer, ServerError};
