//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → name of the signal received
//!
//! Shutdown (shutdown.rs):
//!     trigger() → stop accepting → in-flight requests finish → exit
//!     long waits (delay injection) observe cancelled() and end early
//! ```
//!
//! # Design Decisions
//! - Shutdown is level-triggered: late subscribers still see it
//! - Exit code reflects whether the server closed cleanly

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
