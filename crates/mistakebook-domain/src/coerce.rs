//! Value lookups shared by the normalizers.
//!
//! Each helper answers "what is this field, if it is the shape we want"
//! and returns an empty answer otherwise. None of them fail.

use serde_json::{Map, Value};

pub(crate) type Record = Map<String, Value>;

/// Ordered alias table for one detail field.
///
/// Lookup walks `keys` on the top-level record first. Only when none of
/// them is present does it walk `meta_keys` on the nested `meta` object.
/// The first present, non-null value wins even when its type is wrong, in
/// which case the field coerces to empty rather than trying the next key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldAliases {
    /// Top-level keys in priority order
    pub keys: &'static [&'static str],
    /// Keys checked inside `meta` when no top-level key is present
    pub meta_keys: &'static [&'static str],
}

impl FieldAliases {
    /// Create an alias table
    pub const fn new(keys: &'static [&'static str], meta_keys: &'static [&'static str]) -> Self {
        Self { keys, meta_keys }
    }

    /// Resolve the raw value for this field
    pub fn resolve<'a>(&self, record: &'a Record, meta: Option<&'a Record>) -> Option<&'a Value> {
        first_present(record, self.keys)
            .or_else(|| meta.and_then(|meta| first_present(meta, self.meta_keys)))
    }
}

/// First key whose value is present and not `null`.
pub(crate) fn first_present<'a>(record: &'a Record, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find(|value| !value.is_null())
}

/// The field as an owned string, untouched, when it is a JSON string.
pub(crate) fn string_field(record: &Record, key: &str) -> Option<String> {
    record.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Trimmed string, or empty for anything that is not a JSON string.
pub(crate) fn trimmed(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Trimmed string, `None` when blank or not a string.
pub(crate) fn non_blank(value: Option<&Value>) -> Option<String> {
    let normalized = trimmed(value);
    (!normalized.is_empty()).then_some(normalized)
}

pub(crate) fn finite_number(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64).filter(|n| n.is_finite())
}

pub(crate) fn strict_bool(value: Option<&Value>) -> Option<bool> {
    value.and_then(Value::as_bool)
}

/// Native booleans, plus `"true"` / `"false"` in any letter case.
pub(crate) fn coerce_bool(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

/// Split on any of `separators`, trim each piece, drop blanks.
pub(crate) fn split_trimmed(text: &str, separators: &[char]) -> Vec<String> {
    text.split(|c: char| separators.contains(&c))
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}
