//! UUID generation and namespace prefixes
//!
//! Storage keeps plain UUIDs; the API boundary adds and strips the
//! `core_`/`soil_` prefixes.

use uuid::Uuid;

/// Prefix for core entities
pub const UUID_PREFIX_CORE: &str = "core_";
/// Prefix for soil items
pub const UUID_PREFIX_SOIL: &str = "soil_";

/// Random UUID v4, plain (no prefix)
pub fn generate_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Add `core_` unless the id already carries a known prefix
pub fn add_core_prefix(id: &str) -> String {
    if has_prefix(id) {
        id.to_string()
    } else {
        format!("{UUID_PREFIX_CORE}{id}")
    }
}

/// Add `soil_` unless the id already carries a known prefix
pub fn add_soil_prefix(id: &str) -> String {
    if has_prefix(id) {
        id.to_string()
    } else {
        format!("{UUID_PREFIX_SOIL}{id}")
    }
}

/// Remove a `core_` or `soil_` prefix
pub fn strip_prefix(id: &str) -> &str {
    id.strip_prefix(UUID_PREFIX_CORE)
        .or_else(|| id.strip_prefix(UUID_PREFIX_SOIL))
        .unwrap_or(id)
}

pub fn has_core_prefix(id: &str) -> bool {
    id.starts_with(UUID_PREFIX_CORE)
}

pub fn has_soil_prefix(id: &str) -> bool {
    id.starts_with(UUID_PREFIX_SOIL)
}

pub fn has_prefix(id: &str) -> bool {
    has_core_prefix(id) || has_soil_prefix(id)
}
