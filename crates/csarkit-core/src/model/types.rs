//! Node type catalog
//!
//! Collects the `node_types` of every definitions document in a CSAR and the
//! topologies that substitute node types. The builder uses it to give node
//! template properties their declared type, defaults and constraints, and to
//! expand nested templates.

use indexmap::IndexMap;
use tracing::debug;

use crate::constraints::Constraint;
use crate::issues::{codes, IssueCollector};
use crate::value::RawValue;

/// Normative root every node type derives from
pub const ROOT_NODE_TYPE: &str = "tosca.nodes.Root";

/// A property declared by a node type
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDef {
    pub name: String,
    pub type_name: Option<String>,
    /// TOSCA `required`, true unless declared otherwise
    pub required: bool,
    pub default: Option<RawValue>,
    /// Well-formed constraints only
    pub constraints: Vec<Constraint>,
}

/// A node type definition
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTypeDef {
    pub name: String,
    pub derived_from: Option<String>,
    pub properties: IndexMap<String, PropertyDef>,
}

/// Properties of a type, inherited ones included
#[derive(Debug, Clone)]
pub struct ResolvedProperties<'a> {
    pub properties: IndexMap<&'a str, &'a PropertyDef>,
    /// Every ancestor up to the root was found in the catalog
    pub complete: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    node_types: IndexMap<String, NodeTypeDef>,
    substitutions: IndexMap<String, RawValue>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the `node_types` section of a definitions document
    ///
    /// The first definition of a type wins. Constraint declaration problems
    /// are recorded and the offending constraint dropped.
    pub fn add_node_types(&mut self, document: &RawValue, issues: &mut IssueCollector) {
        let Some(types) = document.get("node_types").and_then(RawValue::as_mapping) else {
            return;
        };

        for (name, def) in types {
            if self.node_types.contains_key(name) {
                debug!(node_type = %name, "node type already defined, keeping first definition");
                continue;
            }
            let Some(def) = def.as_mapping() else {
                issues.raise(
                    codes::MALFORMED_SECTION,
                    format!("ValidationError: Node type \"{}\" must be a map", name),
                );
                continue;
            };

            let derived_from = def
                .get("derived_from")
                .and_then(RawValue::as_str)
                .map(str::to_string);

            let properties = def
                .get("properties")
                .and_then(RawValue::as_mapping)
                .map(|props| {
                    props
                        .iter()
                        .map(|(p, raw)| (p.clone(), parse_property_def(p, raw, issues)))
                        .collect()
                })
                .unwrap_or_default();

            self.node_types.insert(
                name.clone(),
                NodeTypeDef {
                    name: name.clone(),
                    derived_from,
                    properties,
                },
            );
        }
    }

    /// Register a document's topology when it substitutes a node type
    pub fn add_substitution(&mut self, document: &RawValue) -> Option<&str> {
        let topology = document.get("topology_template")?;
        let node_type = topology
            .get("substitution_mappings")
            .and_then(|s| s.get("node_type"))
            .and_then(RawValue::as_str)?;

        if self.substitutions.contains_key(node_type) {
            debug!(node_type, "substitution already registered, keeping first");
            return None;
        }
        self.substitutions
            .insert(node_type.to_string(), topology.clone());
        self.substitutions
            .get_key_value(node_type)
            .map(|(k, _)| k.as_str())
    }

    pub fn node_type(&self, name: &str) -> Option<&NodeTypeDef> {
        self.node_types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.node_types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.node_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_types.is_empty()
    }

    /// Raw topology substituting `node_type`
    pub fn substitution(&self, node_type: &str) -> Option<&RawValue> {
        self.substitutions.get(node_type)
    }

    /// Ancestor chain of a type, the type itself first
    pub fn ancestry<'a>(&'a self, name: &'a str) -> Vec<&'a str> {
        let mut chain = vec![name];
        let mut current = name;
        while let Some(parent) = self
            .node_types
            .get(current)
            .and_then(|t| t.derived_from.as_deref())
        {
            if chain.contains(&parent) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    pub fn is_derived_from(&self, name: &str, ancestor: &str) -> bool {
        self.ancestry(name).contains(&ancestor)
    }

    /// Properties of `name` merged along `derived_from`, children overriding
    ///
    /// `None` when the type itself is unknown.
    pub fn properties_of<'a>(&'a self, name: &'a str) -> Option<ResolvedProperties<'a>> {
        if !self.contains(name) {
            return None;
        }

        let chain = self.ancestry(name);
        let complete = chain.last().is_some_and(|last| {
            *last == ROOT_NODE_TYPE
                || self
                    .node_types
                    .get(*last)
                    .is_some_and(|t| t.derived_from.is_none())
        });

        let mut properties = IndexMap::new();
        for type_name in chain.iter().rev() {
            if let Some(def) = self.node_types.get(*type_name) {
                for (p, prop) in &def.properties {
                    properties.insert(p.as_str(), prop);
                }
            }
        }

        Some(ResolvedProperties {
            properties,
            complete,
        })
    }
}

fn parse_property_def(name: &str, raw: &RawValue, issues: &mut IssueCollector) -> PropertyDef {
    let type_name = raw.get("type").and_then(RawValue::as_str).map(str::to_string);
    let required = raw.get("required").and_then(RawValue::as_bool).unwrap_or(true);
    let default = raw.get("default").filter(|d| !d.is_null()).cloned();
    let constraints = parse_constraints(name, type_name.as_deref(), raw.get("constraints"), issues);

    PropertyDef {
        name: name.to_string(),
        type_name,
        required,
        default,
        constraints,
    }
}

/// Parse a `constraints:` list, keeping the well-formed entries
pub(crate) fn parse_constraints(
    property_name: &str,
    property_type: Option<&str>,
    raw: Option<&RawValue>,
    issues: &mut IssueCollector,
) -> Vec<Constraint> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let Some(entries) = raw.as_sequence() else {
        issues.raise(
            codes::MALFORMED_SECTION,
            format!(
                "ValidationError: Constraints of property \"{}\" must be a list",
                property_name
            ),
        );
        return Vec::new();
    };

    let mut constraints = Vec::new();
    for declared in entries {
        let parsed = Constraint::parse(property_name, property_type, declared)
            .and_then(|c| c.well_formed().map(|()| c));
        match parsed {
            Ok(constraint) => constraints.push(constraint),
            Err(issue) => issues.push(issue),
        }
    }
    constraints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ConstraintKind;

    fn catalog(yaml: &str) -> (TypeCatalog, IssueCollector) {
        let mut catalog = TypeCatalog::new();
        let mut issues = IssueCollector::new();
        catalog.add_node_types(&RawValue::from_yaml_str(yaml).unwrap(), &mut issues);
        (catalog, issues)
    }

    const TYPES: &str = r#"
node_types:
  org.openecomp.resource.abstract.nodes.VF:
    derived_from: tosca.nodes.Root
    properties:
      nf_role:
        type: string
        required: false
      nf_naming_code:
        type: string
        constraints:
          - min_length: 3
  org.openecomp.resource.vf.Fw:
    derived_from: org.openecomp.resource.abstract.nodes.VF
    properties:
      nf_role:
        type: string
        default: firewall
  org.openecomp.resource.vf.Orphan:
    derived_from: org.openecomp.resource.abstract.nodes.Missing
    properties:
      x:
        type: integer
"#;

    #[test]
    fn test_inherited_properties() {
        let (catalog, issues) = catalog(TYPES);
        assert!(issues.is_empty());

        let resolved = catalog.properties_of("org.openecomp.resource.vf.Fw").unwrap();
        assert!(resolved.complete);

        let names: Vec<_> = resolved.properties.keys().copied().collect();
        assert_eq!(names, vec!["nf_role", "nf_naming_code"]);

        // Child definition overrides the parent's
        let role = resolved.properties["nf_role"];
        assert!(role.required);
        assert_eq!(role.default, Some(RawValue::string("firewall")));

        let naming = resolved.properties["nf_naming_code"];
        assert_eq!(naming.constraints[0].kind(), ConstraintKind::MinLength);
    }

    #[test]
    fn test_incomplete_chain() {
        let (catalog, _) = catalog(TYPES);
        let resolved = catalog.properties_of("org.openecomp.resource.vf.Orphan").unwrap();
        assert!(!resolved.complete);
        assert!(catalog.properties_of("unknown.Type").is_none());
    }

    #[test]
    fn test_derived_from() {
        let (catalog, _) = catalog(TYPES);
        assert!(catalog.is_derived_from(
            "org.openecomp.resource.vf.Fw",
            "org.openecomp.resource.abstract.nodes.VF"
        ));
        assert!(catalog.is_derived_from("org.openecomp.resource.vf.Fw", ROOT_NODE_TYPE));
        assert!(!catalog.is_derived_from("org.openecomp.resource.vf.Orphan", ROOT_NODE_TYPE));
    }

    #[test]
    fn test_derivation_loop_terminates() {
        let (catalog, _) = catalog(
            r#"
node_types:
  a.A: { derived_from: a.B }
  a.B: { derived_from: a.A }
"#,
        );
        assert_eq!(catalog.ancestry("a.A"), vec!["a.A", "a.B"]);
    }

    #[test]
    fn test_bad_constraints_recorded() {
        let (catalog, issues) = catalog(
            r#"
node_types:
  a.A:
    properties:
      p:
        type: string
        constraints:
          - min_length: three
          - longer_than: 2
          - max_length: 8
"#,
        );

        let raised: Vec<_> = issues.issues().iter().map(|i| i.code.as_str()).collect();
        assert_eq!(raised, vec![codes::MALFORMED_MIN_LENGTH, codes::UNKNOWN_CONSTRAINT]);

        let def = &catalog.node_type("a.A").unwrap().properties["p"];
        assert_eq!(def.constraints.len(), 1);
        assert_eq!(def.constraints[0].kind(), ConstraintKind::MaxLength);
    }

    #[test]
    fn test_substitution_index() {
        let mut catalog = TypeCatalog::new();
        let doc = RawValue::from_yaml_str(
            r#"
topology_template:
  substitution_mappings:
    node_type: org.openecomp.resource.vf.Fw
  node_templates: {}
"#,
        )
        .unwrap();

        assert_eq!(catalog.add_substitution(&doc), Some("org.openecomp.resource.vf.Fw"));
        assert!(catalog.substitution("org.openecomp.resource.vf.Fw").is_some());
        assert_eq!(catalog.add_substitution(&doc), None);
    }
}
