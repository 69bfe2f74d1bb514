//! Document model construction
//!
//! Turns raw definitions documents into the model, recording every problem
//! met on the way in an [`IssueCollector`]. Construction never stops on an
//! issue: the offending entry is skipped or kept as-is and the rest of the
//! document is still built.

use indexmap::IndexMap;
use tracing::debug;

use super::group::Group;
use super::metadata::Metadata;
use super::node_template::{NodeTemplate, Requirement};
use super::property::{Input, Property};
use super::template::Template;
use super::topology::{Substitution, SubstitutionMappings, TopologyTemplate};
use super::types::{parse_constraints, TypeCatalog};
use crate::issues::{codes, IssueCollector};
use crate::value::RawValue;

pub struct TemplateBuilder<'a> {
    catalog: &'a TypeCatalog,
    issues: IssueCollector,
    /// Node types whose substituting topology is being expanded
    type_chain: Vec<String>,
}

impl<'a> TemplateBuilder<'a> {
    pub fn new(catalog: &'a TypeCatalog) -> Self {
        Self::with_issues(catalog, IssueCollector::new())
    }

    /// Continue collecting into issues raised earlier, e.g. by the catalog
    pub fn with_issues(catalog: &'a TypeCatalog, issues: IssueCollector) -> Self {
        Self {
            catalog,
            issues,
            type_chain: Vec::new(),
        }
    }

    /// Build the template of an entry definitions document
    pub fn build(
        mut self,
        document: &RawValue,
        conformance_level: impl Into<String>,
        meta_files: IndexMap<String, Metadata>,
    ) -> (Template, IssueCollector) {
        let tosca_definitions_version = text(document.get("tosca_definitions_version"));
        if tosca_definitions_version.is_none() {
            self.issues.raise(
                codes::MISSING_DEFINITIONS_VERSION,
                "MissingRequiredFieldError: Template is missing required field \"tosca_definitions_version\"",
            );
        }

        let topology = match document.get("topology_template") {
            Some(raw) if !raw.is_null() => {
                // A node of the service's own type must not expand back into it
                let own_type = raw
                    .get("substitution_mappings")
                    .and_then(|s| s.get("node_type"))
                    .and_then(RawValue::as_str);
                if let Some(own_type) = own_type {
                    self.type_chain.push(own_type.to_string());
                }
                let topology = self.build_topology(raw);
                self.type_chain.clear();
                topology
            }
            _ => TopologyTemplate::default(),
        };

        let template = Template {
            tosca_definitions_version,
            description: text(document.get("description")),
            conformance_level: conformance_level.into(),
            metadata: Metadata::from_raw(document.get("metadata")),
            topology,
            meta_files,
        };

        (template, self.issues)
    }

    /// Build one topology scope, expanding nested templates
    pub fn build_topology(&mut self, raw: &RawValue) -> TopologyTemplate {
        if raw.as_mapping().is_none() {
            self.issues.raise(
                codes::MALFORMED_SECTION,
                "ValidationError: \"topology_template\" must be a map",
            );
            return TopologyTemplate::default();
        }

        let inputs = self.build_inputs(raw.get("inputs"));

        let mut node_templates = Vec::new();
        if let Some(nodes) = self.section(raw.get("node_templates"), "node_templates") {
            for (name, def) in nodes {
                if let Some(node) = self.build_node(name, def) {
                    node_templates.push(node);
                }
            }
        }

        let mut groups = Vec::new();
        if let Some(defs) = self.section(raw.get("groups"), "groups") {
            for (name, def) in defs {
                if let Some(group) = self.build_group(name, def) {
                    groups.push(group);
                }
            }
        }

        for group in &groups {
            for member in &group.members {
                if !node_templates.iter().any(|n: &NodeTemplate| &n.name == member) {
                    self.issues.raise(
                        codes::UNKNOWN_GROUP_MEMBER,
                        format!(
                            "InvalidGroupTargetException: Member \"{}\" of group \"{}\" is not a node template of the same topology",
                            member, group.name
                        ),
                    );
                }
            }
        }

        TopologyTemplate {
            description: text(raw.get("description")),
            inputs,
            node_templates,
            groups,
            substitution: self.build_substitution(raw.get("substitution_mappings")),
        }
    }

    fn build_inputs(&mut self, raw: Option<&RawValue>) -> IndexMap<String, Input> {
        let mut inputs = IndexMap::new();
        let Some(defs) = self.section(raw, "inputs") else {
            return inputs;
        };

        for (name, def) in defs {
            if def.as_mapping().is_none() {
                self.issues.raise(
                    codes::MALFORMED_SECTION,
                    format!("ValidationError: Input \"{}\" must be a map", name),
                );
                continue;
            }

            let declared_type = text(def.get("type"));
            let constraints = parse_constraints(
                name,
                declared_type.as_deref(),
                def.get("constraints"),
                &mut self.issues,
            );
            let default = def.get("default").filter(|d| !d.is_null()).cloned();

            if let Some(default) = &default {
                for constraint in &constraints {
                    if let Err(issue) = constraint.validate(default) {
                        self.issues.push(issue);
                    }
                }
            }

            inputs.insert(
                name.clone(),
                Input {
                    name: name.clone(),
                    declared_type,
                    description: text(def.get("description")),
                    required: def.get("required").and_then(RawValue::as_bool).unwrap_or(true),
                    default,
                    constraints,
                },
            );
        }

        inputs
    }

    fn build_node(&mut self, name: &str, def: &RawValue) -> Option<NodeTemplate> {
        let Some(type_name) = def.get("type").and_then(RawValue::as_str) else {
            self.issues.raise(
                codes::MALFORMED_SECTION,
                format!(
                    "ValidationError: Node template \"{}\" must be a map with a \"type\"",
                    name
                ),
            );
            return None;
        };

        let mut node = NodeTemplate::new(name, type_name);
        node.description = text(def.get("description"));
        node.metadata = Metadata::from_raw(def.get("metadata"));
        node.properties = self.build_node_properties(name, type_name, def.get("properties"));
        node.requirements = self.build_requirements(name, def.get("requirements"));
        node.nested_template = self.expand_nested(name, type_name);

        Some(node)
    }

    /// Assign properties, applying the node type's declarations when known
    fn build_node_properties(
        &mut self,
        node: &str,
        type_name: &str,
        raw: Option<&RawValue>,
    ) -> IndexMap<String, Property> {
        let catalog = self.catalog;
        let resolved = catalog.properties_of(type_name);
        let mut properties = IndexMap::new();

        if let Some(assigned) = self.section(raw, "properties") {
            for (name, value) in assigned {
                let def = resolved
                    .as_ref()
                    .and_then(|r| r.properties.get(name.as_str()).copied());

                match def {
                    Some(def) => {
                        for constraint in &def.constraints {
                            if let Err(issue) = constraint.validate(value) {
                                self.issues.push(issue);
                            }
                        }
                    }
                    None if resolved.as_ref().is_some_and(|r| r.complete) => {
                        self.issues.raise(
                            codes::UNKNOWN_PROPERTY,
                            format!(
                                "UnknownFieldError: Node template \"{}\" contains unknown field \"{}\"",
                                node, name
                            ),
                        );
                    }
                    None => {}
                }

                let declared_type = def.and_then(|d| d.type_name.clone());
                properties.insert(
                    name.clone(),
                    Property::new(name.clone(), value.clone()).with_type(declared_type),
                );
            }
        }

        if let Some(resolved) = &resolved {
            for (name, def) in &resolved.properties {
                if properties.contains_key(*name) {
                    continue;
                }
                match &def.default {
                    Some(default) => {
                        properties.insert(
                            name.to_string(),
                            Property::new(*name, default.clone()).with_type(def.type_name.clone()),
                        );
                    }
                    None if def.required => {
                        self.issues.raise(
                            codes::MISSING_REQUIRED_PROPERTY,
                            format!(
                                "MissingRequiredFieldError: Node template \"{}\" is missing required property \"{}\"",
                                node, name
                            ),
                        );
                    }
                    None => {}
                }
            }
        }

        properties
    }

    fn build_requirements(&mut self, node: &str, raw: Option<&RawValue>) -> Vec<Requirement> {
        let Some(raw) = raw.filter(|r| !r.is_null()) else {
            return Vec::new();
        };
        let Some(entries) = raw.as_sequence() else {
            self.issues.raise(
                codes::MALFORMED_SECTION,
                format!(
                    "ValidationError: Requirements of node template \"{}\" must be a list",
                    node
                ),
            );
            return Vec::new();
        };

        let mut requirements = Vec::new();
        for entry in entries {
            let single = entry
                .as_mapping()
                .filter(|m| m.len() == 1)
                .and_then(|m| m.first());

            let requirement = match single {
                Some((name, RawValue::Mapping(assignment))) => Some(Requirement {
                    name: name.clone(),
                    node: assignment.get("node").and_then(RawValue::leaf_string),
                    capability: assignment.get("capability").and_then(RawValue::leaf_string),
                    relationship: assignment.get("relationship").and_then(|r| {
                        r.leaf_string()
                            .or_else(|| r.get("type").and_then(RawValue::leaf_string))
                    }),
                }),
                Some((name, target)) => target.as_str().map(|target| Requirement {
                    name: name.clone(),
                    node: Some(target.to_string()),
                    capability: None,
                    relationship: None,
                }),
                None => None,
            };

            match requirement {
                Some(requirement) => requirements.push(requirement),
                None => self.issues.raise(
                    codes::MALFORMED_SECTION,
                    format!(
                        "ValidationError: Requirement \"{}\" of node template \"{}\" is not a single-entry map",
                        entry, node
                    ),
                ),
            }
        }
        requirements
    }

    fn build_group(&mut self, name: &str, def: &RawValue) -> Option<Group> {
        let Some(type_name) = def.get("type").and_then(RawValue::as_str) else {
            self.issues.raise(
                codes::MALFORMED_SECTION,
                format!("ValidationError: Group \"{}\" must be a map with a \"type\"", name),
            );
            return None;
        };

        let mut group = Group::new(name, type_name);
        group.description = text(def.get("description"));
        group.metadata = Metadata::from_raw(def.get("metadata"));

        if let Some(properties) = self.section(def.get("properties"), "properties") {
            group.properties = properties
                .iter()
                .map(|(p, value)| (p.clone(), Property::new(p.clone(), value.clone())))
                .collect();
        }

        match def.get("members") {
            None => {}
            Some(RawValue::Sequence(members)) => {
                for member in members {
                    match member.as_str() {
                        Some(member) => group.members.push(member.to_string()),
                        None => self.issues.raise(
                            codes::MALFORMED_SECTION,
                            format!(
                                "ValidationError: Member \"{}\" of group \"{}\" must be a node template name",
                                member, name
                            ),
                        ),
                    }
                }
            }
            Some(other) if other.is_null() => {}
            Some(_) => self.issues.raise(
                codes::MALFORMED_SECTION,
                format!("ValidationError: Members of group \"{}\" must be a list", name),
            ),
        }

        Some(group)
    }

    fn build_substitution(&mut self, raw: Option<&RawValue>) -> Option<Substitution> {
        let raw = raw.filter(|r| !r.is_null())?;
        let Some(node_type) = raw.get("node_type").and_then(RawValue::as_str) else {
            self.issues.raise(
                codes::MALFORMED_SECTION,
                "ValidationError: \"substitution_mappings\" must name a \"node_type\"",
            );
            return None;
        };

        let mapping = |key: &str| {
            raw.get(key)
                .and_then(RawValue::as_mapping)
                .cloned()
                .unwrap_or_default()
        };

        Some(Substitution {
            node_type: node_type.to_string(),
            capabilities: mapping("capabilities"),
            requirements: mapping("requirements"),
        })
    }

    /// Build the topology substituting `type_name`, refusing cycles
    fn expand_nested(&mut self, node: &str, type_name: &str) -> Option<Box<SubstitutionMappings>> {
        let catalog = self.catalog;
        let raw = catalog.substitution(type_name)?;

        if self.type_chain.iter().any(|t| t == type_name) {
            self.issues.raise(
                codes::SUBSTITUTION_CYCLE,
                format!(
                    "ValidationError: Node template \"{}\" of type \"{}\" substitutes a topology that contains it ({} -> {})",
                    node,
                    type_name,
                    self.type_chain.join(" -> "),
                    type_name
                ),
            );
            return None;
        }

        debug!(node, node_type = type_name, depth = self.type_chain.len(), "expanding nested template");
        self.type_chain.push(type_name.to_string());
        let topology = self.build_topology(raw);
        self.type_chain.pop();

        Some(Box::new(SubstitutionMappings::new(topology)))
    }

    /// A mapping section; absent and null are empty, anything else is an issue
    fn section<'r>(
        &mut self,
        raw: Option<&'r RawValue>,
        name: &str,
    ) -> Option<&'r IndexMap<String, RawValue>> {
        match raw {
            None => None,
            Some(RawValue::Mapping(map)) => Some(map),
            Some(value) if value.is_null() => None,
            Some(_) => {
                self.issues.raise(
                    codes::MALFORMED_SECTION,
                    format!("ValidationError: \"{}\" must be a map", name),
                );
                None
            }
        }
    }
}

fn text(raw: Option<&RawValue>) -> Option<String> {
    raw.and_then(RawValue::leaf_string)
}
