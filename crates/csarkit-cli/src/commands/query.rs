//! Query command - list node templates or groups by type and metadata

use csarkit_core::{EntityKind, EntityQuery, SeverityConfig, ServiceHelper};
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::display;
use crate::util;

pub fn run(
    csar_path: &Path,
    config: &SeverityConfig,
    groups: bool,
    type_name: Option<&str>,
    metadata: Option<&str>,
    within: Option<&str>,
    json_output: bool,
) -> Result<()> {
    let parsed = util::parse_csar(csar_path, config)?;
    let helper = ServiceHelper::new(&parsed.template);

    let mut query = EntityQuery::new(if groups {
        EntityKind::Group
    } else {
        EntityKind::NodeTemplate
    });
    if let Some(type_name) = type_name {
        query = query.with_type(type_name);
    }
    if let Some(filter) = metadata {
        let (key, value) = util::parse_key_value(filter)?;
        query = query.with_metadata(key, value);
    }

    let parent = within
        .map(|name| util::nested_parent(&parsed.template, name))
        .transpose()?;
    let entities = helper.entities(&query, parent);

    if json_output {
        let output: Vec<_> = entities
            .iter()
            .map(|e| {
                serde_json::json!({
                    "kind": e.kind(),
                    "name": e.name(),
                    "type": e.type_name(),
                    "parent": e.parent().map(|p| p.name.as_str()),
                    "metadata": e.metadata(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
    } else {
        display::display_entities(&entities);
    }

    Ok(())
}
