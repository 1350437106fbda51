//! Task tracking domain.
//!
//! # Data Flow
//! ```text
//! HTTP body
//!     → types.rs (payload validation, trimming)
//!     → store.rs (in-memory list)
//!     → Task (serialized back to the client)
//! ```

pub mod store;
pub mod types;

pub use store::TaskStore;
pub use types::{StatusPayload, Task, TaskDraft, TaskPayload};
