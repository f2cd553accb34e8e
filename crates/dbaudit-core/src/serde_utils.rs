use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

#[derive(Deserialize)]
#[serde(untagged)]
enum VecOrMap<T> {
    Vec(Vec<T>),
    Map(BTreeMap<String, T>),
}

/// Accepts either a list or an object keyed by id (values in key order)
pub fn vec_or_map<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match VecOrMap::deserialize(deserializer)? {
        VecOrMap::Vec(items) => items,
        VecOrMap::Map(items) => items.into_values().collect(),
    })
}
