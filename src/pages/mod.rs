//! Page view models.
//!
//! Each page owns its feeds and cache keys; pages never share state. The pure
//! helpers in each module (filters, slices, exports) take the current
//! snapshot by reference and never mutate it.

pub mod alerts;
pub mod analytics;
pub mod dashboard;
pub mod health;
pub mod irrigation;
pub mod sensors;
pub mod weather;

/// Lower-cased substring match used by every search box.
pub(crate) fn matches_search(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}
