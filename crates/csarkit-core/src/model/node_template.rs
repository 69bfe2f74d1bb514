//! Node templates

use indexmap::IndexMap;
use serde::Serialize;

use super::metadata::Metadata;
use super::property::Property;
use super::topology::SubstitutionMappings;

/// A requirement assignment on a node template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    /// Requirement name, e.g. `virtualLink`
    pub name: String,

    /// Target node template (or node type) name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
}

/// A node of a topology, possibly backed by a nested topology of its own
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTemplate {
    /// Name, unique within the owning topology
    pub name: String,

    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub metadata: Metadata,

    pub properties: IndexMap<String, Property>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<Requirement>,

    /// Topology substituting this node's type, when the CSAR carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested_template: Option<Box<SubstitutionMappings>>,
}

impl NodeTemplate {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            description: None,
            metadata: Metadata::default(),
            properties: IndexMap::new(),
            requirements: Vec::new(),
            nested_template: None,
        }
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    pub fn nested_template(&self) -> Option<&SubstitutionMappings> {
        self.nested_template.as_deref()
    }

    /// Requirements with the given name
    pub fn requirements_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Requirement> {
        self.requirements.iter().filter(move |r| r.name == name)
    }
}
