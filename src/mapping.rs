//! Field mapping between local and remote record shapes.
//!
//! A mapping is a flat dictionary of local field name → remote field name.
//! Both directions are pure and total: no coercion, no defaulting, and keys
//! absent from the mapping never pass through implicitly.

use std::collections::HashMap;

use serde_json::{Map, Value};

/// Translate a remote record into local field names.
///
/// For every `(local, remote)` pair in the mapping, emits `local: record[remote]`
/// when that value exists and is not null; otherwise the key is omitted.
pub fn map_fields(record: &Map<String, Value>, mapping: &HashMap<String, String>) -> Map<String, Value> {
    let mut out = Map::new();
    for (local, remote) in mapping {
        if let Some(value) = record.get(remote) {
            if !value.is_null() {
                out.insert(local.clone(), value.clone());
            }
        }
    }
    out
}

/// Translate a local record into remote field names (inverse of [`map_fields`]).
pub fn reverse_map_fields(record: &Map<String, Value>, mapping: &HashMap<String, String>) -> Map<String, Value> {
    let mut out = Map::new();
    for (local, remote) in mapping {
        if let Some(value) = record.get(local) {
            if !value.is_null() {
                out.insert(remote.clone(), value.clone());
            }
        }
    }
    out
}
