//! Free-form artisan attributes attached to a portal token.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A primitive metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// JSON boolean.
    Bool(bool),
    /// JSON integer.
    Integer(i64),
    /// JSON number with a fraction.
    Float(f64),
    /// JSON string.
    Text(String),
}

/// String-keyed map of primitives. Keys are not validated here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortalMetadata(BTreeMap<String, MetadataValue>);

impl PortalMetadata {
    /// Empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace `key`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: MetadataValue) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.0.get(key)
    }

    /// Text value of `key`, if present and textual.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(MetadataValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetadataValue)> {
        self.0.iter()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn deserializes_primitive_values() -> TestResult {
        let metadata: PortalMetadata = serde_json::from_value(json!({
            "name": "Jean Dupont",
            "rating": 4.5,
            "jobs": 12,
            "verified": true,
        }))?;

        assert_eq!(metadata.text("name"), Some("Jean Dupont"));
        assert_eq!(metadata.get("jobs"), Some(&MetadataValue::Integer(12)));
        assert_eq!(metadata.get("rating"), Some(&MetadataValue::Float(4.5)));
        assert_eq!(metadata.get("verified"), Some(&MetadataValue::Bool(true)));

        Ok(())
    }

    #[test]
    fn nested_values_are_rejected() {
        let result = serde_json::from_value::<PortalMetadata>(json!({ "address": { "city": "Lyon" } }));

        assert!(result.is_err(), "nested objects are not primitives");
    }

    #[test]
    fn text_ignores_non_text_values() {
        let metadata = PortalMetadata::new().with("name", MetadataValue::Integer(1));

        assert_eq!(metadata.text("name"), None);
    }
}
