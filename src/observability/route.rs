//! Route label normalization.
//!
//! Collapses identifier segments so that `/api/tasks/42` and
//! `/api/tasks/7f0c...` share one label set in metrics and logs.

use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder substituted for every identifier segment.
pub const ID_PLACEHOLDER: &str = ":id";

/// Label used when no path is available.
pub const UNKNOWN_ROUTE: &str = "unknown";

static UUID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[1-5][0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}")
        .unwrap()
});

/// Normalize a raw request path (query string already stripped) into a
/// low-cardinality route label.
pub fn normalize_path(path: Option<&str>) -> String {
    let path = match path {
        Some(p) if !p.is_empty() => p,
        _ => return UNKNOWN_ROUTE.to_string(),
    };

    let without_uuids = UUID_PATTERN.replace_all(path, ID_PLACEHOLDER);

    without_uuids
        .split('/')
        .map(|segment| {
            if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                ID_PLACEHOLDER
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
