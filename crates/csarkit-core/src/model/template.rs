use indexmap::IndexMap;
use serde::Serialize;

use super::metadata::Metadata;
use super::property::Input;
use super::topology::TopologyTemplate;

/// Meta file names kept on the template
pub const TOSCA_META: &str = "TOSCA.meta";
pub const CSAR_META: &str = "csar.meta";

/// A parsed service template, root of the document model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tosca_definitions_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Declared conformance level, or the configured default
    pub conformance_level: String,

    pub metadata: Metadata,

    pub topology: TopologyTemplate,

    /// Key/value meta files of the CSAR, by file name
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub meta_files: IndexMap<String, Metadata>,
}

impl Template {
    pub fn inputs(&self) -> &IndexMap<String, Input> {
        &self.topology.inputs
    }

    pub fn meta_file(&self, name: &str) -> Option<&Metadata> {
        self.meta_files.get(name)
    }
}
