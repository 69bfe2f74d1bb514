//! Get command - resolve a property or input path

use csarkit_core::{path, EntityQuery, RawValue, SeverityConfig, ServiceHelper, Template};
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::error::CliError;
use crate::util;

/// What a path starts from
pub enum Target {
    Node(String),
    Group(String),
    Input,
}

pub fn run(
    csar_path: &Path,
    config: &SeverityConfig,
    target: &Target,
    property_path: &str,
    within: Option<&str>,
    raw: bool,
) -> Result<()> {
    let parsed = util::parse_csar(csar_path, config)?;
    let value = resolve(&parsed.template, target, property_path, within)?;

    if raw {
        println!("{}", serde_json::to_string_pretty(&value.to_json()).into_diagnostic()?);
        return Ok(());
    }

    match value.leaf_string() {
        Some(leaf) => {
            println!("{}", leaf);
            Ok(())
        }
        None => Err(CliError::not_found_with_help(
            format!("'{}' resolves to a {}, not a leaf value", property_path, value.shape()),
            "pass --raw to print the whole value",
        )
        .into()),
    }
}

fn resolve<'t>(
    template: &'t Template,
    target: &Target,
    property_path: &str,
    within: Option<&str>,
) -> Result<&'t RawValue> {
    let helper = ServiceHelper::new(template);
    let parent = within
        .map(|name| util::nested_parent(template, name))
        .transpose()?;

    let resolved = match target {
        Target::Node(name) => {
            let node = helper
                .entities(&EntityQuery::node_templates(), parent)
                .into_iter()
                .filter_map(|e| e.as_node())
                .find(|n| &n.name == name)
                .ok_or_else(|| CliError::not_found(format!("No node template named '{}'", name)))?;
            path::try_resolve(property_path, &node.properties)
        }
        Target::Group(name) => {
            let group = helper
                .entities(&EntityQuery::groups(), parent)
                .into_iter()
                .filter_map(|e| e.as_group())
                .find(|g| &g.name == name)
                .ok_or_else(|| CliError::not_found(format!("No group named '{}'", name)))?;
            path::try_resolve(property_path, &group.properties)
        }
        Target::Input => {
            let inputs = match parent.and_then(|p| p.nested_template()) {
                Some(nested) => nested.inputs(),
                None => helper.service_inputs(),
            };
            path::try_resolve(property_path, inputs)
        }
    };

    resolved.map_err(|e| {
        CliError::not_found(format!("Path '{}' did not resolve: {}", property_path, e)).into()
    })
}
