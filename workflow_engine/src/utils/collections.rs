//! Helpers over the `extra` state map (`FxHashMap<String, Value>`) that
//! [`crate::node::NodePartial`] and [`crate::state::StateSnapshot`] carry.
//!
//! Nodes build and read this map constantly; these helpers avoid
//! repeating the same `Value` matching at every call site.

use rustc_hash::FxHashMap;
use serde_json::{Number, Value};

/// A fresh, empty extra map — the same backing type `NodePartial.extra`
/// and `StateSnapshot.extra` use.
#[must_use]
pub fn new_extra_map() -> FxHashMap<String, Value> {
    FxHashMap::default()
}

/// Builds an extra map from an iterator of key/value pairs.
pub fn extra_map_from_pairs<I, K>(pairs: I) -> FxHashMap<String, Value>
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Merges several extra maps left-to-right. Later maps' keys win on
/// conflict, matching `MapMerge`'s per-key overwrite semantics at a
/// barrier.
#[must_use]
pub fn merge_extra_maps<'a, I>(maps: I) -> FxHashMap<String, Value>
where
    I: IntoIterator<Item = &'a FxHashMap<String, Value>>,
{
    let mut out = FxHashMap::default();
    for map in maps {
        for (k, v) in map {
            out.insert(k.clone(), v.clone());
        }
    }
    out
}

/// Typed accessors over an extra map.
pub trait ExtraMapExt {
    fn insert_string(&mut self, key: &str, value: impl Into<String>);
    fn insert_number(&mut self, key: &str, value: impl Into<Number>);
    fn insert_bool(&mut self, key: &str, value: bool);
    fn get_string(&self, key: &str) -> Option<&str>;
    fn get_number(&self, key: &str) -> Option<Number>;
    fn get_bool(&self, key: &str) -> Option<bool>;
}

impl ExtraMapExt for FxHashMap<String, Value> {
    fn insert_string(&mut self, key: &str, value: impl Into<String>) {
        self.insert(key.to_string(), Value::String(value.into()));
    }

    fn insert_number(&mut self, key: &str, value: impl Into<Number>) {
        self.insert(key.to_string(), Value::Number(value.into()));
    }

    fn insert_bool(&mut self, key: &str, value: bool) {
        self.insert(key.to_string(), Value::Bool(value));
    }

    fn get_string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    fn get_number(&self, key: &str) -> Option<Number> {
        self.get(key).and_then(Value::as_number).cloned()
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_typed_values() {
        let mut map = new_extra_map();
        map.insert_string("name", "test");
        map.insert_number("count", 42);
        map.insert_bool("enabled", true);

        assert_eq!(map.get_string("name").unwrap(), "test");
        assert_eq!(map.get_number("count").unwrap(), 42.into());
        assert!(map.get_bool("enabled").unwrap());
    }

    #[test]
    fn merge_prefers_later_map_on_conflict() {
        let a = extra_map_from_pairs([("k", Value::from(1))]);
        let b = extra_map_from_pairs([("k", Value::from(2))]);
        let merged = merge_extra_maps([&a, &b]);
        assert_eq!(merged.get("k"), Some(&Value::from(2)));
    }
}
