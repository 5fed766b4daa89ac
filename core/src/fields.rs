//! Serde helpers for the loosely typed LoanPro payloads.
//!
//! Amounts, identifiers and flags arrive as strings, numbers, booleans or
//! `null` depending on the endpoint. Models keep them as text so amounts are
//! displayed exactly as received and never pass through binary floating point
//! inside this crate.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Literals treated as a zero amount in breakdown checks.
pub const ZERO_AMOUNTS: [&str; 3] = ["", "0", "0.00"];

pub fn is_zero_amount(value: &str) -> bool {
    ZERO_AMOUNTS.contains(&value)
}

pub fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() { None } else { Some(value) }
}

/// Any scalar as text. `null` and absent become `""`; booleans become the
/// `"1"`/`"0"` flags the API uses elsewhere; nested JSON is kept serialized.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(Value::Bool(flag)) => String::from(if flag { "1" } else { "0" }),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    })
}

/// Integer identifiers that may be sent as a number or a numeric string.
pub fn integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| serde::de::Error::custom(format!("id {n} is not an integer"))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(0),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("id '{s}' is not an integer"))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected an integer id, got {other}"
        ))),
    }
}

/// Lists where `null` means "none".
pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
