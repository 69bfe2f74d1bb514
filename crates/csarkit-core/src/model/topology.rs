//! Topologies and nested composition

use indexmap::IndexMap;
use serde::Serialize;

use super::group::Group;
use super::node_template::NodeTemplate;
use super::property::Input;
use crate::value::RawValue;

/// Declaration that a topology stands in for a node type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Substitution {
    pub node_type: String,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub capabilities: IndexMap<String, RawValue>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub requirements: IndexMap<String, RawValue>,
}

/// One scope of node templates and groups
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyTemplate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub inputs: IndexMap<String, Input>,

    pub node_templates: Vec<NodeTemplate>,

    pub groups: Vec<Group>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub substitution: Option<Substitution>,
}

impl TopologyTemplate {
    pub fn node_template(&self, name: &str) -> Option<&NodeTemplate> {
        self.node_templates.iter().find(|n| n.name == name)
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn input(&self, name: &str) -> Option<&Input> {
        self.inputs.get(name)
    }

    /// Node type this topology substitutes, if any
    pub fn substituted_type(&self) -> Option<&str> {
        self.substitution.as_ref().map(|s| s.node_type.as_str())
    }
}

/// The nested topology behind a node template
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SubstitutionMappings {
    topology: TopologyTemplate,
}

impl SubstitutionMappings {
    pub fn new(topology: TopologyTemplate) -> Self {
        Self { topology }
    }

    pub fn topology(&self) -> &TopologyTemplate {
        &self.topology
    }

    pub fn node_templates(&self) -> &[NodeTemplate] {
        &self.topology.node_templates
    }

    pub fn groups(&self) -> &[Group] {
        &self.topology.groups
    }

    pub fn inputs(&self) -> &IndexMap<String, Input> {
        &self.topology.inputs
    }

    pub fn node_type(&self) -> Option<&str> {
        self.topology.substituted_type()
    }
}
