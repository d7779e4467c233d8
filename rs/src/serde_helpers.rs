//! Lenient deserializers for feed and preference data
//!
//! Upstream collaborators hand us loosely typed JSON: ids may be numbers,
//! counters may be strings, follows may be an array or an object. Every helper
//! here accepts whatever shape arrives and coerces it to the canonical Rust
//! type, falling back to an empty/zero value instead of failing.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

fn value<'de, D>(deserializer: D) -> Result<Value, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null))
}

/// Coerce a scalar into a string. Objects, arrays and null become `None`.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Coerce a number or numeric string into a finite `f64`.
pub(crate) fn number_from_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn count_from_value(value: &Value) -> f64 {
    number_from_value(value).map(|n| n.max(0.0)).unwrap_or(0.0)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && n.is_finite()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Any scalar as a string, everything else as `""`.
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_to_string(&value(deserializer)?).unwrap_or_default())
}

/// Any non-empty scalar as `Some(string)`.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_to_string(&value(deserializer)?).filter(|s| !s.is_empty()))
}

/// Finite number or numeric string.
pub fn opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number_from_value(&value(deserializer)?))
}

/// Like [`opt_number`] but clamps negatives to zero.
pub fn opt_count<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number_from_value(&value(deserializer)?).map(|n| n.max(0.0)))
}

/// Only a literal JSON `true` is true.
pub fn strict_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(value(deserializer)?, Value::Bool(true)))
}

/// An array of scalars, or a single delimited string (`a;b,c|d`).
pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let list = match value(deserializer)? {
        Value::Array(items) => items
            .iter()
            .filter_map(scalar_to_string)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => s
            .split([';', ',', '|'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };
    Ok(list)
}

/// A set of ids given either as an array or as an object whose truthy-valued
/// keys are members.
pub fn id_set<'de, D>(deserializer: D) -> Result<HashSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let set = match value(deserializer)? {
        Value::Array(items) => items
            .iter()
            .filter_map(scalar_to_string)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::Object(map) => map
            .into_iter()
            .filter(|(_, v)| is_truthy(v))
            .map(|(k, _)| k)
            .collect(),
        _ => HashSet::new(),
    };
    Ok(set)
}

/// Per-channel counts given either as an object of counts or as an array of
/// `[channelId, count]` pairs. Later pairs for the same channel win.
pub fn channel_counts<'de, D>(deserializer: D) -> Result<HashMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let counts = match value(deserializer)? {
        Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| {
                let count = count_from_value(&v);
                (k, count)
            })
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Array(pair) if pair.len() == 2 => {
                    let key = scalar_to_string(&pair[0])?;
                    Some((key, count_from_value(&pair[1])))
                }
                _ => None,
            })
            .collect(),
        _ => HashMap::new(),
    };
    Ok(counts)
}

/// Whole appearance counters; fractional values are truncated.
pub fn appearance_counts<'de, D>(deserializer: D) -> Result<HashMap<String, u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let counts = channel_counts(deserializer)?
        .into_iter()
        .map(|(k, v)| (k, v.min(u32::MAX as f64) as u32))
        .collect();
    Ok(counts)
}

/// A list where entries that fail to deserialize are skipped with a warning
/// instead of failing the whole document.
pub fn skip_invalid<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match value(deserializer)? {
        Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };

    let total = items.len();
    let parsed: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Skipping malformed entry {}: {}", index, e);
                None
            }
        })
        .collect();

    if parsed.len() < total {
        tracing::debug!("Kept {} of {} entries", parsed.len(), total);
    }
    Ok(parsed)
}
