//! Shared helpers for CLI commands

use csarkit_core::{CsarParser, NodeTemplate, ParsedCsar, SeverityConfig, Template};
use miette::{Result, WrapErr};
use std::path::Path;

use crate::error::CliError;

/// The severity configuration from `--config`, or the built-in one
pub fn load_config(path: Option<&Path>) -> Result<SeverityConfig> {
    match path {
        Some(path) => SeverityConfig::from_file(path)
            .map_err(CliError::from)
            .wrap_err_with(|| format!("Failed to load severity config from {}", path.display())),
        None => SeverityConfig::builtin()
            .map_err(CliError::from)
            .wrap_err("Built-in severity config is invalid"),
    }
}

/// Parse a CSAR, failing on structural errors and critical issues
pub fn parse_csar(path: &Path, config: &SeverityConfig) -> Result<ParsedCsar> {
    CsarParser::new(config)
        .parse_path(path)
        .map_err(CliError::from)
        .wrap_err_with(|| format!("Failed to parse CSAR {}", path.display()))
}

/// A service-level node template whose nested template is searched
pub fn nested_parent<'t>(template: &'t Template, name: &str) -> Result<&'t NodeTemplate> {
    let node = template.topology.node_template(name).ok_or_else(|| {
        CliError::not_found(format!("No service-level node template named '{}'", name))
    })?;
    if node.nested_template().is_none() {
        return Err(CliError::not_found_with_help(
            format!("Node template '{}' has no nested template", name),
            "only nodes whose type is substituted by another template can be searched",
        )
        .into());
    }
    Ok(node)
}

/// Split a `key=value` argument
pub fn parse_key_value(arg: &str) -> Result<(&str, &str)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => Err(CliError::input(format!("expected key=value, got '{}'", arg)).into()),
    }
}
