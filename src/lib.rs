//! TaskFlow backend library
//!
//! In-memory task tracking service instrumented with RED metrics,
//! trace-correlated JSON logs and a loopback health overview.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod tasks;

pub use config::Config;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
