//! Lenient serde helpers for stored records.
//!
//! Stored configuration is written by several generations of admin tooling, so
//! identifiers show up as numbers or strings and flags as booleans or `0`/`1`.

use log::{debug, warn};
use serde::de::{self, DeserializeOwned, Deserializer, Visitor};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::fmt;

/// Deserialize an unsigned integer that may be written as a number or a string.
pub fn deserialize_u64_lenient<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    struct NumberOrStringVisitor;

    impl<'de> Visitor<'de> for NumberOrStringVisitor {
        type Value = u64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("unsigned integer or numeric string")
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u64::try_from(value).map_err(|_| E::custom(format!("negative value {}", value)))
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            value
                .trim()
                .parse::<u64>()
                .map_err(|_| E::custom(format!("invalid number '{}'", value)))
        }
    }

    deserializer.deserialize_any(NumberOrStringVisitor)
}

/// Deserialize a port that may be written as a number or a string.
pub fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let value = deserialize_u64_lenient(deserializer)?;
    u16::try_from(value).map_err(|_| de::Error::custom(format!("port {} out of range", value)))
}

/// Deserialize a small counter (such as a VMess alterId) from a number or a string.
pub fn deserialize_u16_lenient<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_port(deserializer)
}

/// Deserialize a flag written as a boolean, a number (`0` is false) or a string.
pub fn deserialize_bool_lenient<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct FlagVisitor;

    impl<'de> Visitor<'de> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("boolean, number or flag string")
        }

        fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value != 0)
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value != 0)
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(parse_flag(value))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(false)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(false)
        }
    }

    deserializer.deserialize_any(FlagVisitor)
}

/// Deserialize a list that may also be written as one comma separated string.
pub fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        One(String),
        Many(Vec<String>),
    }

    let list = match Option::<StringOrList>::deserialize(deserializer)? {
        None => None,
        Some(StringOrList::One(value)) => Some(
            value
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        Some(StringOrList::Many(values)) => Some(values),
    };
    Ok(list)
}

/// Deserialize a field, falling back to its default when it is null or of the wrong shape.
pub fn deserialize_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = JsonValue::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(T::default());
    }
    Ok(T::deserialize(value).unwrap_or_else(|e| {
        debug!("Ignoring unreadable field: {}", e);
        T::default()
    }))
}

/// Deserialize a list, dropping the elements that do not fit `T`.
pub fn deserialize_lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    JsonValue::deserialize(deserializer).map(decode_lenient_list)
}

/// Decode every element of a JSON array that fits `T`.
///
/// Null decodes to an empty list. Elements that fail are skipped one at a time.
pub fn decode_lenient_list<T: DeserializeOwned>(value: JsonValue) -> Vec<T> {
    match value {
        JsonValue::Null => Vec::new(),
        JsonValue::Array(items) => items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match T::deserialize(item) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    warn!("Skipping list entry {}: {}", index, e);
                    None
                }
            })
            .collect(),
        other => {
            warn!("Expected a list, found {}", other);
            Vec::new()
        }
    }
}

/// Interpret a query or config flag such as `1`, `true` or `yes`.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
