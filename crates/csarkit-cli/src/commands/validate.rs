//! Validate command - parse a CSAR and report its issues by severity

use console::style;
use csarkit_core::{Csar, CsarParser, SeverityConfig};
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::Path;

use crate::display;
use crate::error::CliError;
use crate::exit_codes;

pub fn run(csar_path: &Path, config: &SeverityConfig, json_output: bool, strict: bool) -> Result<()> {
    let csar = Csar::open(csar_path)
        .map_err(CliError::from)
        .wrap_err_with(|| format!("Failed to load CSAR from {}", csar_path.display()))?;

    if !json_output {
        println!(
            "{} Validating {}",
            style("→").blue(),
            csar_path.display()
        );
    }

    // Every issue is reported, so critical ones must not abort the parse
    let (template, report) = CsarParser::new(config)
        .inspect(&csar)
        .map_err(CliError::from)?;

    let failed = report.has_critical() || (strict && !report.warnings.is_empty());

    if json_output {
        let output = serde_json::json!({
            "valid": !failed,
            "conformanceLevel": template.conformance_level,
            "critical": report.critical,
            "warnings": report.warnings,
            "notAnalyzed": report.not_analyzed,
        });
        println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
    } else {
        println!(
            "  {} Conformance level {}",
            style("→").blue(),
            template.conformance_level
        );
        display::display_report(&report);
        println!();
        display::print_summary(&report);
    }

    if failed {
        std::process::exit(exit_codes::VALIDATION_ERROR);
    }

    Ok(())
}
