//! Display formatting for CLI output
//!
//! Provides structured display for:
//! - Validation reports grouped by severity
//! - Template trees with nested templates indented
//! - Entity query results

use console::style;
use csarkit_core::{Entity, IssueReport, NodeTemplate, RawValue, Severity, TopologyTemplate};

const BUCKETS: [Severity; 3] = [Severity::Critical, Severity::Warning, Severity::NotAnalyzed];

/// Display issues grouped by severity bucket
pub fn display_report(report: &IssueReport) {
    for severity in BUCKETS {
        let issues = report.bucket(severity);
        if issues.is_empty() {
            continue;
        }

        println!();
        println!(
            "{} ({})",
            style(bucket_title(severity)).cyan().bold(),
            issues.len()
        );

        for issue in issues {
            let icon = match severity {
                Severity::Critical => style("✗").red(),
                Severity::Warning => style("⚠").yellow(),
                Severity::NotAnalyzed => style("·").dim(),
            };
            println!("  {} {} {}", icon, style(&issue.code).dim(), issue.message);
        }
    }
}

/// Print summary line
pub fn print_summary(report: &IssueReport) {
    let critical = report.critical.len();
    let warnings = report.warnings.len();
    if critical > 0 {
        println!(
            "{} Validation failed: {} critical issue(s), {} warning(s)",
            style("✗").red().bold(),
            critical,
            warnings
        );
    } else if warnings > 0 {
        println!(
            "{} Validation passed with {} warning(s)",
            style("⚠").yellow().bold(),
            warnings
        );
    } else {
        println!("{} Validation passed!", style("✓").green().bold());
    }
}

fn bucket_title(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "Critical",
        Severity::Warning => "Warnings",
        Severity::NotAnalyzed => "Not analyzed",
    }
}

/// Print node templates and groups of a scope, nested templates indented
pub fn display_topology(topology: &TopologyTemplate, depth: usize) {
    let indent = "  ".repeat(depth + 1);

    for node in &topology.node_templates {
        println!(
            "{}- {} {}",
            indent,
            style(&node.name).bold(),
            style(format!("({})", node.type_name)).dim()
        );
        if let Some(nested) = node.nested_template() {
            display_topology(nested.topology(), depth + 1);
        }
    }

    for group in &topology.groups {
        println!(
            "{}- {} {} [{}]",
            indent,
            style(&group.name).magenta(),
            style(format!("({})", group.type_name)).dim(),
            group.members.join(", ")
        );
    }
}

/// One line per entity: kind, name, type and the node it was found under
pub fn display_entities(entities: &[Entity<'_>]) {
    if entities.is_empty() {
        println!("{} No matching entities", style("⚠").yellow());
        return;
    }

    for entity in entities {
        let parent = entity
            .parent()
            .map(|p: &NodeTemplate| format!(" in {}", style(&p.name).dim()))
            .unwrap_or_default();
        println!(
            "  {:13} {:40} {}{}",
            entity.kind().to_string(),
            entity.name(),
            style(entity.type_name()).dim(),
            parent
        );
    }
    println!();
    println!("{} result(s)", entities.len());
}

/// Single-line rendering of a value for listings
pub fn inline_value(value: &RawValue) -> String {
    value
        .leaf_string()
        .unwrap_or_else(|| value.to_string())
}
