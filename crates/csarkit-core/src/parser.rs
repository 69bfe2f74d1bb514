//! CSAR parsing
//!
//! Loads the entry document and the other definitions of a [`Csar`], builds
//! the document model and classifies the issues met on the way against a
//! [`SeverityConfig`]. Structural failures (unreadable archive, missing entry
//! document, unsupported conformance level) return before classification.

use std::path::Path;
use tracing::{debug, info};

use crate::config::SeverityConfig;
use crate::conformance::ConformanceLevel;
use crate::csar::Csar;
use crate::error::Result;
use crate::issues::{IssueCollector, IssueReport};
use crate::model::{Template, TemplateBuilder, TypeCatalog};

/// A successfully parsed CSAR
#[derive(Debug, Clone)]
pub struct ParsedCsar {
    pub template: Template,
    /// Warnings and not-analyzed issues; never any critical issue
    pub report: IssueReport,
}

pub struct CsarParser<'c> {
    config: &'c SeverityConfig,
}

impl<'c> CsarParser<'c> {
    pub fn new(config: &'c SeverityConfig) -> Self {
        Self { config }
    }

    /// Open and parse a CSAR directory or tarball
    pub fn parse_path<P: AsRef<Path>>(&self, path: P) -> Result<ParsedCsar> {
        let csar = Csar::open(path)?;
        self.parse(&csar)
    }

    pub fn parse(&self, csar: &Csar) -> Result<ParsedCsar> {
        let level = self.conformance_level(csar)?;
        let (template, report) = self.build(csar, &level)?;
        let report = report.into_result()?;

        info!(
            conformance_level = %level,
            warnings = report.warnings.len(),
            not_analyzed = report.not_analyzed.len(),
            "parsed CSAR"
        );
        Ok(ParsedCsar { template, report })
    }

    /// Build and classify without failing on critical issues
    ///
    /// Structural errors still fail. Used to report every issue of a CSAR
    /// that does not parse.
    pub fn inspect(&self, csar: &Csar) -> Result<(Template, IssueReport)> {
        let level = self.conformance_level(csar)?;
        self.build(csar, &level)
    }

    /// Declared level, else the configured default, within the supported range
    pub fn conformance_level(&self, csar: &Csar) -> Result<ConformanceLevel> {
        let level = match csar.conformance_level() {
            Some(declared) => ConformanceLevel::parse(&declared)?,
            None => self.config.default_conformance_level().clone(),
        };
        self.config.check_supported(&level)?;
        Ok(level)
    }

    fn build(&self, csar: &Csar, level: &ConformanceLevel) -> Result<(Template, IssueReport)> {
        let (entry_path, document) = csar.entry_document()?;
        let mut issues = IssueCollector::new();

        let mut catalog = TypeCatalog::new();
        catalog.add_node_types(&document, &mut issues);
        for (path, definitions) in csar.definitions()? {
            catalog.add_node_types(&definitions, &mut issues);
            if let Some(node_type) = catalog.add_substitution(&definitions) {
                debug!(file = %path, node_type, "registered nested template");
            }
        }
        debug!(
            entry = %entry_path,
            node_types = catalog.len(),
            "loaded definitions"
        );

        let (template, issues) = TemplateBuilder::with_issues(&catalog, issues).build(
            &document,
            level.as_str(),
            csar.meta_files(),
        );

        Ok((template, issues.classify(self.config, level)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeverityRule;
    use crate::csar::{CSAR_META_PATH, TOSCA_META_PATH};
    use crate::error::CoreError;
    use crate::issues::{codes, Severity};

    const TOSCA_META: &str = "Entry-Definitions: Definitions/service.yml\n";

    /// A service whose only issue is an undeclared property
    const SERVICE: &str = r#"
tosca_definitions_version: tosca_simple_yaml_1_1
metadata:
  name: vFW
node_types:
  org.openecomp.resource.vf.Fw:
    derived_from: tosca.nodes.Root
    properties:
      nf_role:
        type: string
        required: false
topology_template:
  node_templates:
    fw 0:
      type: org.openecomp.resource.vf.Fw
      properties:
        vendor: acme
"#;

    fn csar(level: Option<&str>) -> Csar {
        let mut files = vec![
            (TOSCA_META_PATH.to_string(), TOSCA_META.to_string()),
            ("Definitions/service.yml".to_string(), SERVICE.to_string()),
        ];
        if let Some(level) = level {
            files.push((
                CSAR_META_PATH.to_string(),
                format!("SDC-TOSCA-Definitions-Version: {}\n", level),
            ));
        }
        Csar::from_files(files)
    }

    fn gated_config() -> SeverityConfig {
        let mut config = SeverityConfig::empty();
        config.add_rule(SeverityRule {
            code: codes::UNKNOWN_PROPERTY.to_string(),
            since_conformance_level: ConformanceLevel::new(4, 0),
            severity_below_threshold: Severity::Warning,
            severity_at_or_above_threshold: Severity::Critical,
        });
        config
    }

    #[test]
    fn test_below_threshold_parses_with_warning() {
        let config = gated_config();
        let parsed = CsarParser::new(&config).parse(&csar(Some("3.0"))).unwrap();

        assert!(parsed.report.critical.is_empty());
        assert_eq!(parsed.report.warnings.len(), 1);
        assert_eq!(parsed.report.warnings[0].code, codes::UNKNOWN_PROPERTY);
        assert_eq!(parsed.template.conformance_level, "3.0");
        assert!(parsed.template.topology.node_template("fw 0").is_some());
    }

    #[test]
    fn test_at_threshold_fails_with_critical() {
        let config = gated_config();
        let err = CsarParser::new(&config).parse(&csar(Some("4.0"))).unwrap_err();

        assert!(!err.is_structural());
        let report = err.report().unwrap();
        assert_eq!(report.critical.len(), 1);
        assert_eq!(report.critical[0].code, codes::UNKNOWN_PROPERTY);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_default_conformance_level() {
        let config = gated_config().with_default_conformance_level(ConformanceLevel::new(3, 5));
        let parsed = CsarParser::new(&config).parse(&csar(None)).unwrap();
        assert_eq!(parsed.template.conformance_level, "3.5");
    }

    #[test]
    fn test_inspect_keeps_critical_issues() {
        let config = gated_config();
        let (template, report) = CsarParser::new(&config).inspect(&csar(Some("4.0"))).unwrap();
        assert_eq!(report.critical.len(), 1);
        assert_eq!(template.metadata.get_value("name").as_deref(), Some("vFW"));
    }

    #[test]
    fn test_unsupported_and_invalid_levels() {
        let config = SeverityConfig::builtin().unwrap();
        let parser = CsarParser::new(&config);

        let err = parser.parse(&csar(Some("1.0"))).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedConformanceLevel { .. }));
        assert!(err.is_structural());

        let err = parser.parse(&csar(Some("four"))).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConformanceLevel { .. }));
    }

    #[test]
    fn test_structural_errors_bypass_classification() {
        let config = SeverityConfig::builtin().unwrap();
        let err = CsarParser::new(&config)
            .parse(&Csar::from_files([("readme.txt", "no yaml here")]))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidCsarFormat { .. }));
        assert!(err.report().is_none());
    }

    #[test]
    fn test_meta_files_kept_on_template() {
        let config = gated_config();
        let parsed = CsarParser::new(&config).parse(&csar(Some("3.0"))).unwrap();
        let csar_meta = parsed.template.meta_file(crate::model::CSAR_META).unwrap();
        assert_eq!(
            csar_meta.get_value("SDC-TOSCA-Definitions-Version").as_deref(),
            Some("3.0")
        );
    }
}
