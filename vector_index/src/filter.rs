//! Metadata filter expressions (§4.5: "`filter` expressions map metadata
//! keys to either exact values or `{$in: [...]}` lists, composed with
//! implicit AND").

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single metadata key's constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Exact(Value),
    In { #[serde(rename = "$in")] values: Vec<Value> },
}

/// A conjunction of per-key constraints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Filter {
    #[serde(flatten)]
    pub constraints: BTreeMap<String, FilterValue>,
}

impl Filter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn eq(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constraints.insert(key.into(), FilterValue::Exact(value.into()));
        self
    }

    #[must_use]
    pub fn one_of(mut self, key: impl Into<String>, values: Vec<Value>) -> Self {
        self.constraints.insert(key.into(), FilterValue::In { values });
        self
    }

    /// Evaluates the filter (implicit AND across keys) against a metadata object.
    #[must_use]
    pub fn matches(&self, metadata: &Value) -> bool {
        self.constraints.iter().all(|(key, constraint)| {
            let Some(actual) = metadata.get(key) else {
                return false;
            };
            match constraint {
                FilterValue::Exact(expected) => actual == expected,
                FilterValue::In { values } => values.contains(actual),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exact_match() {
        let filter = Filter::new().eq("origin", "acme");
        assert!(filter.matches(&json!({"origin": "acme"})));
        assert!(!filter.matches(&json!({"origin": "other"})));
    }

    #[test]
    fn in_list_match() {
        let filter = Filter::new().one_of("sensitivity", vec![json!("public"), json!("internal")]);
        assert!(filter.matches(&json!({"sensitivity": "internal"})));
        assert!(!filter.matches(&json!({"sensitivity": "confidential"})));
    }

    #[test]
    fn multiple_constraints_are_anded() {
        let filter = Filter::new().eq("origin", "acme").eq("sensitivity", "internal");
        assert!(filter.matches(&json!({"origin": "acme", "sensitivity": "internal"})));
        assert!(!filter.matches(&json!({"origin": "acme", "sensitivity": "confidential"})));
    }

    #[test]
    fn missing_key_fails_constraint() {
        let filter = Filter::new().eq("origin", "acme");
        assert!(!filter.matches(&json!({})));
    }
}
