//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! GET /api/system/overview
//!     → probe.rs (loopback GET /health, bounded by a timeout)
//!     → parsed JSON health document
//!     → embedded as upstreamHealth in the overview
//! ```
//!
//! # Design Decisions
//! - The probe goes over the network stack, not a direct function call,
//!   so the overview reflects what an external checker would see
//! - Every failure mode maps to a distinct ProbeError variant

pub mod probe;

pub use probe::{HealthProbe, ProbeError, PROBE_HEADER, PROBE_HEADER_VALUE};
