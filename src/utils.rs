use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::ZidooError;

// Helper module for parsing the loosely typed values the player returns
pub mod zidoo_parse {
    use super::*;

    /// Catalog release dates come as `YYYY-MM-DD`; anything else is dropped.
    pub fn parse_release_date(s: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
    }

    /// Returns the index following `current` in `indices`, wrapping to 0.
    /// Also 0 when the list is empty or `current` is unknown.
    pub fn next_index(indices: &[i64], current: i64) -> i64 {
        let mut iter = indices.iter();
        while let Some(index) = iter.next() {
            if *index == current {
                return iter.next().copied().unwrap_or(0);
            }
        }
        0
    }

    /// Collects item ids (as strings) from a music list array, optionally
    /// descending into a nested object first (search results nest under `result`).
    pub fn music_ids(array: Option<&Value>, sub: Option<&str>) -> Vec<String> {
        let Some(items) = array.and_then(Value::as_array) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| match sub {
                Some(key) => item.get(key),
                None => Some(item),
            })
            .filter_map(|item| item.get("id"))
            .map(|id| match id {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect()
    }
}

/// Accepts a JSON string or number and yields it as an owned string.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

/// Optional flavour of [`lenient_string`]; `null` and empty strings become `None`.
pub(crate) fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Integers sometimes arrive quoted.
pub(crate) fn lenient_opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

lazy_static! {
    static ref MAC_RE: Regex =
        Regex::new(r"^([0-9A-Fa-f]{2})[:-]?([0-9A-Fa-f]{2})[:-]?([0-9A-Fa-f]{2})[:-]?([0-9A-Fa-f]{2})[:-]?([0-9A-Fa-f]{2})[:-]?([0-9A-Fa-f]{2})$")
            .unwrap();
}

/// Parses `aa:bb:cc:dd:ee:ff` (also `-` separated or bare hex) into raw bytes.
pub fn parse_mac(mac: &str) -> Result<[u8; 6], ZidooError> {
    let caps = MAC_RE
        .captures(mac.trim())
        .ok_or_else(|| ZidooError::InvalidMacAddress(mac.to_string()))?;
    let mut bytes = [0u8; 6];
    for (i, byte) in bytes.iter_mut().enumerate() {
        let group = caps
            .get(i + 1)
            .ok_or_else(|| ZidooError::InvalidMacAddress(mac.to_string()))?;
        *byte = u8::from_str_radix(group.as_str(), 16)
            .map_err(|_| ZidooError::InvalidMacAddress(mac.to_string()))?;
    }
    Ok(bytes)
}
