//! Serde adapter encoding `U256` as a decimal string.
//!
//! Reserves, amounts and gas values are never encoded as JSON numbers;
//! they round-trip through base-10 text. Absent and `null` fields decode
//! to zero so that partially populated pool records normalize on store.

use alloy_primitives::U256;
use serde::de::Error;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(U256::ZERO),
        Some(raw) if raw.is_empty() => Ok(U256::ZERO),
        Some(raw) => U256::from_str_radix(&raw, 10)
            .map_err(|err| Error::custom(format!("invalid decimal amount {raw:?}: {err}"))),
    }
}
