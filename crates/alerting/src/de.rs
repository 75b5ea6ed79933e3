//! Serde helpers for lenient decoding.

use serde::{Deserialize, Deserializer};

/// Deserializes `null` as the type's default value.
///
/// Combined with `#[serde(default)]`, an absent field and an explicit `null`
/// both produce the zero value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
