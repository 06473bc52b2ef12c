//! Forgiving field deserialization.
//!
//! Engine reports and editor settings come from code we don't control. A
//! field of the wrong shape must not poison the whole structure, so fields
//! decorated with [`lenient`] become `None` instead of failing.

use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use serde_json::Value;

/// Deserialize a field as `Some(T)` when it has the right shape, `None` otherwise.
///
/// Use together with `#[serde(default)]` so absent fields also land on `None`.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}
