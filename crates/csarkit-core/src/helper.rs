//! Service-level queries over a parsed template
//!
//! [`ServiceHelper`] answers the questions orchestration code asks of an SDC
//! service CSAR: which VFs it instantiates, which VFCs and connection points
//! they are built from, which VF modules group them, and what a property or
//! input resolves to.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, error, warn};

use crate::csar::CONFORMANCE_LEVEL_KEY;
use crate::error::CoreError;
use crate::model::{Group, Input, Metadata, NodeTemplate, Template, CSAR_META};
use crate::path::{self, PATH_DELIMITER};
use crate::query::{Entity, EntityQuery, CUSTOMIZATION_UUID};
use crate::value::RawValue;

/// Metadata key holding a node template's SDC type
pub const SDC_TYPE: &str = "type";
/// Metadata key holding a node template's category
pub const CATEGORY: &str = "category";
pub const ALLOTTED_RESOURCE_CATEGORY: &str = "Allotted Resource";
/// Metadata key shared by a service-level VF module and its VF-level group
pub const VF_MODULE_MODEL_INVARIANT_UUID: &str = "vfModuleModelInvariantUUID";
pub const VF_MODULE_GROUP_TYPE: &str = "org.openecomp.groups.VfModule";

const CP_PROPERTY_PREFIX: &str = "port_";
const CP_PROPERTY_SUFFIXES: &[&str] = &["_network_role_tag", "_ip_requirements", "_subnetpoolid"];
const CP_PROPERTY_PATHS: &[&str] = &[
    "network_role_tag",
    "ip_requirements#ip_count_required#count",
    "ip_requirements#dhcp_enabled",
    "ip_requirements#ip_version",
    "subnetpoolid",
];

/// SDC component types, as found in a node template's `type` metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SdcType {
    Cp,
    Vl,
    Vf,
    Vfc,
    Pnf,
    Service,
    Cvfc,
    ServiceProxy,
    Configuration,
}

impl SdcType {
    pub const ALL: [SdcType; 9] = [
        SdcType::Cp,
        SdcType::Vl,
        SdcType::Vf,
        SdcType::Vfc,
        SdcType::Pnf,
        SdcType::Service,
        SdcType::Cvfc,
        SdcType::ServiceProxy,
        SdcType::Configuration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SdcType::Cp => "CP",
            SdcType::Vl => "VL",
            SdcType::Vf => "VF",
            SdcType::Vfc => "VFC",
            SdcType::Pnf => "PNF",
            SdcType::Service => "SERVICE",
            SdcType::Cvfc => "CVFC",
            SdcType::ServiceProxy => "SERVICE_PROXY",
            SdcType::Configuration => "CONFIGURATION",
        }
    }

    /// Types backed by a nested topology of their own
    pub fn is_complex(&self) -> bool {
        matches!(
            self,
            SdcType::Vf | SdcType::Pnf | SdcType::Service | SdcType::Cvfc
        )
    }

    fn query(&self) -> EntityQuery {
        EntityQuery::node_templates().with_metadata(SDC_TYPE, self.as_str())
    }
}

impl fmt::Display for SdcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SdcType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::InvalidTemplate {
                message: format!("unknown SDC type '{}'", s),
            })
    }
}

/// Lowercased name with `.`, `-` and spaces removed, as used in group names
pub fn normalise_component_instance_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '.' | '-') && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Read-only queries over one service template
#[derive(Debug, Clone, Copy)]
pub struct ServiceHelper<'a> {
    template: &'a Template,
}

impl<'a> ServiceHelper<'a> {
    pub fn new(template: &'a Template) -> Self {
        Self { template }
    }

    pub fn template(&self) -> &'a Template {
        self.template
    }

    // Service level

    pub fn service_metadata(&self) -> &'a Metadata {
        &self.template.metadata
    }

    pub fn service_metadata_properties(&self) -> &'a IndexMap<String, RawValue> {
        self.template.metadata.property_map()
    }

    pub fn metadata_property_value(&self, metadata: &Metadata, key: &str) -> Option<String> {
        if key.is_empty() {
            error!("metadata property name is empty");
            return None;
        }
        metadata.get_value(key)
    }

    pub fn service_inputs(&self) -> &'a IndexMap<String, Input> {
        self.template.inputs()
    }

    /// Conformance level declared in `csar.meta`
    pub fn conformance_level(&self) -> Option<String> {
        let Some(csar_meta) = self.template.meta_file(CSAR_META) else {
            warn!("no {} in the CSAR; older CSARs may not declare a conformance level", CSAR_META);
            return None;
        };
        let level = csar_meta.get_value(CONFORMANCE_LEVEL_KEY);
        match &level {
            Some(level) => debug!(level = %level, "CSAR conformance level"),
            None => error!("{} has no {} entry", CSAR_META, CONFORMANCE_LEVEL_KEY),
        }
        level
    }

    pub fn substitution_mappings_type_name(&self) -> Option<&'a str> {
        let node_type = self.template.topology.substituted_type();
        if node_type.is_none() {
            debug!("service defines no substitution mappings");
        }
        node_type
    }

    /// Properties of a meta file, e.g. `TOSCA.meta`
    pub fn meta_properties(&self, file: &str) -> Option<&'a Metadata> {
        self.template.meta_file(file)
    }

    // Service node templates

    pub fn service_node_templates(&self) -> &'a [NodeTemplate] {
        &self.template.topology.node_templates
    }

    pub fn service_node_templates_by_type(&self, node_type: &str) -> Vec<&'a NodeTemplate> {
        if node_type.is_empty() {
            error!("node type is empty");
            return Vec::new();
        }
        nodes(
            EntityQuery::node_templates()
                .with_type(node_type)
                .entities_in_scope(&self.template.topology),
        )
    }

    pub fn service_node_templates_by_sdc_type(&self, sdc_type: SdcType) -> Vec<&'a NodeTemplate> {
        nodes(sdc_type.query().entities_in_scope(&self.template.topology))
    }

    pub fn service_vf_list(&self) -> Vec<&'a NodeTemplate> {
        self.service_node_templates_by_sdc_type(SdcType::Vf)
    }

    pub fn service_vl_list(&self) -> Vec<&'a NodeTemplate> {
        self.service_node_templates_by_sdc_type(SdcType::Vl)
    }

    pub fn allotted_resources(&self) -> Vec<&'a NodeTemplate> {
        let resources = nodes(
            EntityQuery::node_templates()
                .with_metadata(CATEGORY, ALLOTTED_RESOURCE_CATEGORY)
                .entities_in_scope(&self.template.topology),
        );
        if resources.is_empty() {
            debug!("service has no allotted resources");
        }
        resources
    }

    // Nested templates

    /// Node templates of an SDC type inside `parent`'s nested topology
    pub fn node_templates_by_sdc_type(
        &self,
        parent: &'a NodeTemplate,
        sdc_type: SdcType,
    ) -> Vec<&'a NodeTemplate> {
        if parent.nested_template().is_none() {
            debug!(node = %parent.name, "node template has no nested template");
        }
        nodes(sdc_type.query().entities_in_nested_template(parent))
    }

    pub fn vfc_list_by_vf(&self, vf_customization_uuid: &str) -> Vec<&'a NodeTemplate> {
        match self.vf_by_customization_uuid(vf_customization_uuid) {
            Some(vf) => self.node_templates_by_sdc_type(vf, SdcType::Vfc),
            None => Vec::new(),
        }
    }

    pub fn cp_list_by_vf(&self, vf_customization_uuid: &str) -> Vec<&'a NodeTemplate> {
        let cps = match self.vf_by_customization_uuid(vf_customization_uuid) {
            Some(vf) => self.node_templates_by_sdc_type(vf, SdcType::Cp),
            None => Vec::new(),
        };
        if cps.is_empty() {
            debug!(vf_customization_uuid, "no CPs found for VF");
        }
        cps
    }

    /// Service-level VF module groups of a VF
    ///
    /// Service-level group names start with the VF's normalised instance name.
    pub fn vf_modules_by_vf(&self, vf_customization_uuid: &str) -> Vec<&'a Group> {
        let Some(vf) = self.vf_by_customization_uuid(vf_customization_uuid) else {
            return Vec::new();
        };
        let prefix = normalise_component_instance_name(&vf.name);
        debug!(vf = %vf.name, prefix = %prefix, "searching service-level VF modules");

        EntityQuery::groups()
            .with_type(VF_MODULE_GROUP_TYPE)
            .entities_in_scope(&self.template.topology)
            .into_iter()
            .filter_map(|e| e.as_group())
            .filter(|g| g.name.starts_with(&prefix))
            .collect()
    }

    /// Nodes of `vf` grouped by the VF-level counterpart of a service-level VF module
    pub fn members_of_vf_module(&self, vf: &'a NodeTemplate, vf_module: &Group) -> Vec<&'a NodeTemplate> {
        let Some(invariant_uuid) = vf_module.metadata.get_value(VF_MODULE_MODEL_INVARIANT_UUID)
        else {
            error!(
                group = %vf_module.name,
                "VF module has no {}, cannot match a VF group",
                VF_MODULE_MODEL_INVARIANT_UUID
            );
            return Vec::new();
        };

        let Some(nested) = vf.nested_template() else {
            return Vec::new();
        };
        let Some(group) = EntityQuery::groups()
            .with_metadata(VF_MODULE_MODEL_INVARIANT_UUID, invariant_uuid)
            .entities_in_nested_template(vf)
            .first()
            .and_then(Entity::as_group)
        else {
            return Vec::new();
        };

        // Scope order, each node once
        nested
            .node_templates()
            .iter()
            .filter(|n| group.has_member(&n.name))
            .collect()
    }

    /// Pairs of (requiring node, capable node) linked by requirement `req_name`
    pub fn node_template_pairs_by_req_name(
        &self,
        requiring: &[&'a NodeTemplate],
        capable: &[&'a NodeTemplate],
        req_name: &str,
    ) -> Vec<(&'a NodeTemplate, &'a NodeTemplate)> {
        let mut pairs = Vec::new();
        for node in requiring {
            for requirement in node.requirements_named(req_name) {
                let Some(target) = requirement.node.as_deref() else {
                    continue;
                };
                if let Some(cap) = capable.iter().find(|c| c.name == target) {
                    pairs.push((*node, *cap));
                }
            }
        }
        pairs
    }

    // Node templates and groups

    pub fn type_of_node_template(&self, node: &'a NodeTemplate) -> &'a str {
        &node.type_name
    }

    pub fn node_template_customization_uuid(&self, node: &NodeTemplate) -> Option<String> {
        let uuid = node.metadata.get_value(CUSTOMIZATION_UUID);
        if uuid.is_none() {
            error!(node = %node.name, "node template has no {}", CUSTOMIZATION_UUID);
        }
        uuid
    }

    pub fn node_template_property_leaf_value(&self, node: &NodeTemplate, path: &str) -> Option<String> {
        path::resolve_leaf(path, &node.properties)
    }

    pub fn node_template_property_value(&self, node: &'a NodeTemplate, path: &str) -> Option<&'a RawValue> {
        path::resolve(path, &node.properties)
    }

    pub fn group_property_leaf_value(&self, group: &Group, path: &str) -> Option<String> {
        path::resolve_leaf(path, &group.properties)
    }

    pub fn group_property_value(&self, group: &'a Group, path: &str) -> Option<&'a RawValue> {
        path::resolve(path, &group.properties)
    }

    /// Leaf of an input default; `path` is `<input>#default[#...]`
    pub fn service_input_leaf_value_of_default(&self, path: &str) -> Option<String> {
        path::resolve_leaf(path, self.template.inputs())
    }

    pub fn service_input_value_of_default(&self, path: &str) -> Option<&'a RawValue> {
        path::resolve(path, self.template.inputs())
    }

    /// Connection point properties of a VFC, by CP name
    ///
    /// CP properties are named `port_<cp>_network_role_tag`,
    /// `port_<cp>_ip_requirements` and `port_<cp>_subnetpoolid`.
    pub fn cp_properties_from_vfc(
        &self,
        vfc: &'a NodeTemplate,
    ) -> IndexMap<String, IndexMap<String, &'a RawValue>> {
        let mut cps: IndexMap<String, IndexMap<String, &'a RawValue>> = IndexMap::new();

        for property_name in vfc.properties.keys() {
            let Some(rest) = property_name.strip_prefix(CP_PROPERTY_PREFIX) else {
                continue;
            };
            let Some((cp_name, suffix)) = CP_PROPERTY_SUFFIXES
                .iter()
                .find_map(|suffix| rest.strip_suffix(suffix).map(|cp| (cp, *suffix)))
            else {
                continue;
            };

            let family = suffix.trim_start_matches('_');
            for item in CP_PROPERTY_PATHS.iter().filter(|p| p.contains(family)) {
                let full_path = format!("{}{}_{}", CP_PROPERTY_PREFIX, cp_name, item);
                if let Some(value) = path::resolve(&full_path, &vfc.properties) {
                    cps.entry(cp_name.to_string())
                        .or_default()
                        .insert(item.to_string(), value);
                }
            }
        }

        cps
    }

    /// Run a query at service level, or inside `within`'s nested topology
    pub fn entities(&self, query: &EntityQuery, within: Option<&'a NodeTemplate>) -> Vec<Entity<'a>> {
        match within {
            Some(node) => query.entities_in_nested_template(node),
            None => query.entities_in_scope(&self.template.topology),
        }
    }

    /// A service-level node template by name
    pub fn node_template(&self, name: &str) -> Option<&'a NodeTemplate> {
        self.template.topology.node_template(name)
    }

    fn vf_by_customization_uuid(&self, customization_uuid: &str) -> Option<&'a NodeTemplate> {
        if customization_uuid.is_empty() {
            error!("VF customization UUID is empty");
            return None;
        }
        let vf = self.service_vf_list().into_iter().find(|vf| {
            vf.metadata.get_value(CUSTOMIZATION_UUID).as_deref() == Some(customization_uuid)
        });
        if vf.is_none() {
            debug!(customization_uuid, "no VF with this customization UUID");
        }
        vf
    }
}

fn nodes(entities: Vec<Entity<'_>>) -> Vec<&NodeTemplate> {
    entities.into_iter().filter_map(|e| e.as_node()).collect()
}

/// Join path segments with the path delimiter
pub fn join_path(segments: &[&str]) -> String {
    let delimiter = PATH_DELIMITER.to_string();
    segments.join(delimiter.as_str())
}
