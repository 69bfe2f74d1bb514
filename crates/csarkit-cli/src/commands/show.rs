//! Show command - display the service template of a CSAR

use console::style;
use csarkit_core::{SeverityConfig, ServiceHelper};
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::display;
use crate::util;

pub fn run(csar_path: &Path, config: &SeverityConfig, json_output: bool) -> Result<()> {
    let parsed = util::parse_csar(csar_path, config)?;
    let template = &parsed.template;

    if json_output {
        println!("{}", serde_json::to_string_pretty(template).into_diagnostic()?);
        return Ok(());
    }

    let helper = ServiceHelper::new(template);
    let name = helper
        .service_metadata()
        .get_value("name")
        .unwrap_or_else(|| csar_path.display().to_string());

    println!("{}", style(&name).cyan().bold());
    println!("{}", style("=".repeat(name.chars().count())).dim());
    println!();

    if let Some(version) = &template.tosca_definitions_version {
        println!("{}: {}", style("TOSCA Version").bold(), version);
    }
    println!("{}: {}", style("Conformance Level").bold(), template.conformance_level);
    if let Some(node_type) = helper.substitution_mappings_type_name() {
        println!("{}: {}", style("Substitutes").bold(), node_type);
    }
    if let Some(desc) = &template.description {
        println!("{}: {}", style("Description").bold(), desc);
    }

    let metadata = helper.service_metadata_properties();
    if !metadata.is_empty() {
        println!();
        println!("{}:", style("Metadata").bold());
        for (key, value) in metadata {
            println!("  {}: {}", key, display::inline_value(value));
        }
    }

    let inputs = helper.service_inputs();
    if !inputs.is_empty() {
        println!();
        println!("{}:", style("Inputs").bold());
        for input in inputs.values() {
            let type_name = input.declared_type.as_deref().unwrap_or("-");
            match &input.default {
                Some(default) => println!(
                    "  - {} ({}) = {}",
                    input.name,
                    type_name,
                    display::inline_value(default)
                ),
                None => println!("  - {} ({})", input.name, type_name),
            }
        }
    }

    println!();
    println!("{}:", style("Topology").bold());
    display::display_topology(&template.topology, 0);

    if !parsed.report.warnings.is_empty() {
        println!();
        println!(
            "{} {} warning(s), run `csarkit validate` for details",
            style("⚠").yellow(),
            parsed.report.warnings.len()
        );
    }

    Ok(())
}
