use indexmap::IndexMap;
use serde::Serialize;

use super::metadata::Metadata;
use super::property::Property;

/// A named collection of sibling node templates
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub name: String,

    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub metadata: Metadata,

    pub properties: IndexMap<String, Property>,

    /// Node template names in the group's own scope, in declaration order
    pub members: Vec<String>,
}

impl Group {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            description: None,
            metadata: Metadata::default(),
            properties: IndexMap::new(),
            members: Vec::new(),
        }
    }

    pub fn has_member(&self, node_name: &str) -> bool {
        self.members.iter().any(|m| m == node_name)
    }
}
