// src/resolver/mod.rs

//! Transaction conflict analysis
//!
//! Given the packages a transaction would install or upgrade, work out which
//! installed or co-installed packages they collide with (`conflicts`) and
//! which installed packages a sync package supersedes (`replacements`).
//!
//! Both maps are keyed by the new package name. Each value list has set
//! semantics: a name is recorded once per key, in discovery order.

pub mod conflicts;
pub mod replacements;

pub use conflicts::{conflicts_between, find_conflicts};
pub use replacements::find_replacements;

use std::collections::BTreeMap;

/// New package name -> names it conflicts with
pub type ConflictMap = BTreeMap<String, Vec<String>>;

/// Sync package name -> installed names it replaces
pub type ReplaceMap = BTreeMap<String, Vec<String>>;

/// Add `value` under `key` unless it is already there
fn record(map: &mut BTreeMap<String, Vec<String>>, key: &str, value: &str) {
    let entry = map.entry(key.to_string()).or_default();
    if !entry.iter().any(|existing| existing == value) {
        entry.push(value.to_string());
    }
}
