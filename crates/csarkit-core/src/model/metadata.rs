//! Metadata bags

use indexmap::IndexMap;
use serde::Serialize;

use crate::value::RawValue;

/// Ordered key → value metadata of a template, node template or group
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Metadata(IndexMap<String, RawValue>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata from a `metadata:` section; anything but a mapping is empty
    pub fn from_raw(raw: Option<&RawValue>) -> Self {
        match raw.and_then(RawValue::as_mapping) {
            Some(map) => Self(map.clone()),
            None => Self::default(),
        }
    }

    /// Parse a `Key: value` meta file such as `TOSCA-Metadata/TOSCA.meta`
    ///
    /// Values are kept as strings. Lines without a colon are ignored.
    pub fn from_meta_text(text: &str) -> Self {
        let entries = text
            .lines()
            .filter_map(|line| line.split_once(':'))
            .filter(|(key, _)| !key.trim().is_empty())
            .map(|(key, value)| (key.trim().to_string(), RawValue::string(value.trim())))
            .collect();
        Self(entries)
    }

    /// String rendering of a scalar entry
    pub fn get_value(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(RawValue::leaf_string)
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.0.get(key)
    }

    pub fn property_map(&self) -> &IndexMap<String, RawValue> {
        &self.0
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(String, RawValue)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (String, RawValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
