use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `null` deserializes as `T::default()` instead of failing.
pub(crate) fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// Any value of the wrong type (or `null`) deserializes as `T::default()`.
/// Applied per field on provider payloads.
pub(crate) fn lenient<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let v = Value::deserialize(d)?;
    Ok(T::deserialize(v).unwrap_or_default())
}

/// Parse `parent[key]` as `T`. Absent, `null` or malformed sections yield
/// `T::default()`.
pub(crate) fn section<T>(parent: &Value, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match parent.get(key) {
        Some(v) if !v.is_null() => T::deserialize(v).unwrap_or_default(),
        _ => T::default(),
    }
}

/// Parse `parent[key]` as an array of `T`, dropping elements that do not
/// parse. A non-array value yields an empty vec.
pub(crate) fn lenient_vec<T>(parent: Option<&Value>, key: &str) -> Vec<T>
where
    T: DeserializeOwned,
{
    parent
        .and_then(|p| p.get(key))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| T::deserialize(item).ok())
                .collect()
        })
        .unwrap_or_default()
}
