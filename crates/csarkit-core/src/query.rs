//! Entity queries
//!
//! An [`EntityQuery`] selects node templates or groups of one scope by type
//! and metadata. Queries look at a single scope: the top-level topology with
//! [`EntityQuery::entities_in_scope`], or the topology nested behind a node
//! with [`EntityQuery::entities_in_nested_template`]. Callers step further
//! down one level at a time.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

use crate::model::{Group, Metadata, NodeTemplate, Property, TopologyTemplate};
use crate::path;
use crate::value::RawValue;

/// Metadata key of an entity's UUID
pub const UUID: &str = "UUID";
/// Metadata key of a VF module's UUID in older CSARs
pub const VF_MODULE_MODEL_UUID: &str = "vfModuleModelUUID";
pub const CUSTOMIZATION_UUID: &str = "customizationUUID";
/// Metadata key of a VF module's customization UUID in older CSARs
pub const VF_MODULE_MODEL_CUSTOMIZATION_UUID: &str = "vfModuleModelCustomizationUUID";

/// Kinds of entities a query can return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    NodeTemplate,
    Group,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::NodeTemplate => f.write_str("node template"),
            EntityKind::Group => f.write_str("group"),
        }
    }
}

/// A metadata value looked up under one key or a renamed alternative
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataFilter {
    keys: Vec<String>,
    value: String,
}

impl MetadataFilter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            keys: vec![key.into()],
            value: value.into(),
        }
    }

    /// Match `value` under either `key` or `alternative`
    pub fn either(
        key: impl Into<String>,
        alternative: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            keys: vec![key.into(), alternative.into()],
            value: value.into(),
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.keys
            .iter()
            .any(|key| metadata.get_value(key).as_deref() == Some(self.value.as_str()))
    }
}

/// Criteria for node templates or groups of one scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityQuery {
    kind: EntityKind,
    metadata: Option<MetadataFilter>,
    type_name: Option<String>,
}

impl EntityQuery {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            metadata: None,
            type_name: None,
        }
    }

    pub fn node_templates() -> Self {
        Self::new(EntityKind::NodeTemplate)
    }

    pub fn groups() -> Self {
        Self::new(EntityKind::Group)
    }

    /// Groups whose UUID is `uuid`, under either metadata spelling
    pub fn groups_by_uuid(uuid: impl Into<String>) -> Self {
        Self::groups().with_filter(MetadataFilter::either(UUID, VF_MODULE_MODEL_UUID, uuid))
    }

    /// Groups whose customization UUID is `id`, under either metadata spelling
    pub fn groups_by_customization_uuid(id: impl Into<String>) -> Self {
        Self::groups().with_filter(MetadataFilter::either(
            CUSTOMIZATION_UUID,
            VF_MODULE_MODEL_CUSTOMIZATION_UUID,
            id,
        ))
    }

    #[must_use]
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    #[must_use]
    pub fn with_metadata(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_filter(MetadataFilter::new(key, value))
    }

    #[must_use]
    pub fn with_filter(mut self, filter: MetadataFilter) -> Self {
        self.metadata = Some(filter);
        self
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn metadata_filter(&self) -> Option<&MetadataFilter> {
        self.metadata.as_ref()
    }

    /// Whether an entity with this metadata and type passes every filter set
    pub fn match_criteria(&self, metadata: &Metadata, type_name: &str) -> bool {
        let type_matches = self.type_name.as_deref().is_none_or(|t| t == type_name);
        let metadata_matches = self.metadata.as_ref().is_none_or(|f| f.matches(metadata));
        type_matches && metadata_matches
    }

    /// Matching entities directly owned by `scope`
    pub fn entities_in_scope<'a>(&self, scope: &'a TopologyTemplate) -> Vec<Entity<'a>> {
        self.collect(scope, None)
    }

    /// Matching entities of the topology nested behind `node`
    pub fn entities_in_nested_template<'a>(&self, node: &'a NodeTemplate) -> Vec<Entity<'a>> {
        match node.nested_template() {
            Some(nested) => self.collect(nested.topology(), Some(node)),
            None => Vec::new(),
        }
    }

    fn collect<'a>(
        &self,
        scope: &'a TopologyTemplate,
        parent: Option<&'a NodeTemplate>,
    ) -> Vec<Entity<'a>> {
        match self.kind {
            EntityKind::NodeTemplate => scope
                .node_templates
                .iter()
                .filter(|n| self.match_criteria(&n.metadata, &n.type_name))
                .map(|node| Entity::Node {
                    node,
                    scope,
                    parent,
                })
                .collect(),
            EntityKind::Group => scope
                .groups
                .iter()
                .filter(|g| self.match_criteria(&g.metadata, &g.type_name))
                .map(|group| Entity::Group {
                    group,
                    scope,
                    parent,
                })
                .collect(),
        }
    }
}

/// A query result, tied to the scope it was found in
#[derive(Debug, Clone, Copy)]
pub enum Entity<'a> {
    Node {
        node: &'a NodeTemplate,
        scope: &'a TopologyTemplate,
        /// Node whose nested topology is `scope`
        parent: Option<&'a NodeTemplate>,
    },
    Group {
        group: &'a Group,
        scope: &'a TopologyTemplate,
        parent: Option<&'a NodeTemplate>,
    },
}

impl<'a> Entity<'a> {
    pub fn kind(&self) -> EntityKind {
        match *self {
            Entity::Node { .. } => EntityKind::NodeTemplate,
            Entity::Group { .. } => EntityKind::Group,
        }
    }

    pub fn name(&self) -> &'a str {
        match *self {
            Entity::Node { node, .. } => &node.name,
            Entity::Group { group, .. } => &group.name,
        }
    }

    pub fn type_name(&self) -> &'a str {
        match *self {
            Entity::Node { node, .. } => &node.type_name,
            Entity::Group { group, .. } => &group.type_name,
        }
    }

    pub fn metadata(&self) -> &'a Metadata {
        match *self {
            Entity::Node { node, .. } => &node.metadata,
            Entity::Group { group, .. } => &group.metadata,
        }
    }

    pub fn properties(&self) -> &'a IndexMap<String, Property> {
        match *self {
            Entity::Node { node, .. } => &node.properties,
            Entity::Group { group, .. } => &group.properties,
        }
    }

    pub fn scope(&self) -> &'a TopologyTemplate {
        match *self {
            Entity::Node { scope, .. } | Entity::Group { scope, .. } => scope,
        }
    }

    pub fn parent(&self) -> Option<&'a NodeTemplate> {
        match *self {
            Entity::Node { parent, .. } | Entity::Group { parent, .. } => parent,
        }
    }

    pub fn as_node(&self) -> Option<&'a NodeTemplate> {
        match *self {
            Entity::Node { node, .. } => Some(node),
            Entity::Group { .. } => None,
        }
    }

    pub fn as_group(&self) -> Option<&'a Group> {
        match *self {
            Entity::Group { group, .. } => Some(group),
            Entity::Node { .. } => None,
        }
    }

    /// Node templates of the scope named by a group's members, in member order
    ///
    /// Names absent from the scope are skipped; a node entity has no members.
    pub fn member_nodes(&self) -> Vec<&'a NodeTemplate> {
        match *self {
            Entity::Group { group, scope, .. } => group
                .members
                .iter()
                .filter_map(|member| scope.node_template(member))
                .collect(),
            Entity::Node { .. } => Vec::new(),
        }
    }

    pub fn property_value(&self, property_path: &str) -> Option<&'a RawValue> {
        path::resolve(property_path, self.properties())
    }

    pub fn property_leaf_value(&self, property_path: &str) -> Option<String> {
        path::resolve_leaf(property_path, self.properties())
    }
}
