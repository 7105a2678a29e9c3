use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub fn to_json<T: Serialize>(obj: &T) -> Result<String> {
    serde_json::to_string_pretty(obj).context("serializing to JSON")
}

/// Produces a compact form, for storing big blobs.
pub fn to_json_terse<T: Serialize>(obj: &T) -> Result<String> {
    serde_json::to_string(obj).context("serializing to JSON")
}

pub fn from_json<T: DeserializeOwned>(raw: &[u8]) -> Result<T> {
    serde_json::from_slice(raw).context("deserializing from JSON")
}

// For BTreeMaps with struct keys. See https://github.com/serde-rs/json/issues/402.

pub fn serialize_btreemap<S: Serializer, K: Serialize, V: Serialize>(
    map: &BTreeMap<K, V>,
    s: S,
) -> Result<S::Ok, S::Error> {
    map.iter().collect::<Vec<(_, _)>>().serialize(s)
}

pub fn deserialize_btreemap<
    'de,
    D: Deserializer<'de>,
    K: Deserialize<'de> + Ord,
    V: Deserialize<'de>,
>(
    d: D,
) -> Result<BTreeMap<K, V>, D::Error> {
    let vec = <Vec<(K, V)>>::deserialize(d)?;
    Ok(vec.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Copy, PartialOrd, Eq, Ord)]
    struct Key(i64, i64);

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Holder {
        #[serde(
            serialize_with = "serialize_btreemap",
            deserialize_with = "deserialize_btreemap"
        )]
        map: BTreeMap<Key, String>,
    }

    #[test]
    fn struct_keys_survive_json() {
        let mut map = BTreeMap::new();
        map.insert(Key(1, 2), "a".to_string());
        map.insert(Key(3, 4), "b".to_string());
        let holder = Holder { map };
        let raw = to_json(&holder).unwrap();
        let back: Holder = from_json(raw.as_bytes()).unwrap();
        assert_eq!(holder, back);
    }
}
