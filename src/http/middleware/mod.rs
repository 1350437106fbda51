//! Request middleware.

pub mod observability;

pub use observability::{observe_request, InFlightRequest};
