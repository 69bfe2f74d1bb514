//! Severity configuration for validation issues
//!
//! Maps each issue code to the severity it takes below and at-or-above the
//! conformance level that introduced it. The table is an explicit value passed
//! to the parser; tests build their own without touching shared state.
//!
//! ```yaml
//! defaultConformanceLevel: "3.0"
//! supportedConformanceLevels:
//!   lowest: "3.0"
//!   highest: "9.0"
//! validationIssues:
//!   JE113:
//!     - sinceConformanceLevel: "4.0"
//!       below: WARNING
//!       atOrAbove: CRITICAL
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::conformance::ConformanceLevel;
use crate::error::{CoreError, Result};
use crate::issues::Severity;

/// Built-in table covering every code this crate raises
const BUILTIN_CONFIG: &str = include_str!("../config/validation-issues.yaml");

/// Severity of one issue code around a conformance threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityRule {
    pub code: String,
    pub since_conformance_level: ConformanceLevel,
    pub severity_below_threshold: Severity,
    pub severity_at_or_above_threshold: Severity,
}

/// Range of conformance levels a parse accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedLevels {
    pub lowest: ConformanceLevel,
    pub highest: ConformanceLevel,
}

impl SupportedLevels {
    pub fn contains(&self, level: &ConformanceLevel) -> bool {
        *level >= self.lowest && *level <= self.highest
    }
}

/// On-disk layout of the configuration file
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    #[serde(default = "default_conformance_level")]
    default_conformance_level: ConformanceLevel,

    #[serde(default)]
    supported_conformance_levels: Option<SupportedLevels>,

    #[serde(default)]
    validation_issues: IndexMap<String, Vec<RuleEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuleEntry {
    since_conformance_level: ConformanceLevel,
    below: Severity,
    at_or_above: Severity,
}

fn default_conformance_level() -> ConformanceLevel {
    ConformanceLevel::new(3, 0)
}

/// Code → severity rules, plus conformance level defaults
#[derive(Debug, Clone)]
pub struct SeverityConfig {
    default_conformance_level: ConformanceLevel,
    supported: Option<SupportedLevels>,
    /// Rules per code, sorted by ascending threshold
    rules: IndexMap<String, Vec<SeverityRule>>,
}

impl SeverityConfig {
    /// A table with no rules: every issue classifies as critical
    pub fn empty() -> Self {
        Self {
            default_conformance_level: default_conformance_level(),
            supported: None,
            rules: IndexMap::new(),
        }
    }

    /// The table shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_CONFIG)
    }

    /// Load a table from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse a table from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(yaml).map_err(|e| CoreError::InvalidConfig {
            message: e.to_string(),
        })?;

        if let Some(supported) = &file.supported_conformance_levels {
            if supported.lowest > supported.highest {
                return Err(CoreError::InvalidConfig {
                    message: format!(
                        "lowest supported level {} is above highest {}",
                        supported.lowest, supported.highest
                    ),
                });
            }
        }

        let mut config = Self {
            default_conformance_level: file.default_conformance_level,
            supported: file.supported_conformance_levels,
            rules: IndexMap::new(),
        };

        for (code, entries) in file.validation_issues {
            if entries.is_empty() {
                return Err(CoreError::InvalidConfig {
                    message: format!("issue {} has no severity entries", code),
                });
            }
            for entry in entries {
                config.add_rule(SeverityRule {
                    code: code.clone(),
                    since_conformance_level: entry.since_conformance_level,
                    severity_below_threshold: entry.below,
                    severity_at_or_above_threshold: entry.at_or_above,
                });
            }
        }

        Ok(config)
    }

    /// Add a rule, keeping the rules of its code ordered by threshold
    pub fn add_rule(&mut self, rule: SeverityRule) {
        let rules = self.rules.entry(rule.code.clone()).or_default();
        let at = rules
            .iter()
            .position(|r| r.since_conformance_level > rule.since_conformance_level)
            .unwrap_or(rules.len());
        rules.insert(at, rule);
    }

    #[must_use]
    pub fn with_default_conformance_level(mut self, level: ConformanceLevel) -> Self {
        self.default_conformance_level = level;
        self
    }

    #[must_use]
    pub fn with_supported_levels(mut self, supported: Option<SupportedLevels>) -> Self {
        self.supported = supported;
        self
    }

    /// Level assumed for a CSAR that declares none
    pub fn default_conformance_level(&self) -> &ConformanceLevel {
        &self.default_conformance_level
    }

    pub fn supported_levels(&self) -> Option<&SupportedLevels> {
        self.supported.as_ref()
    }

    /// Reject levels outside the supported range
    pub fn check_supported(&self, level: &ConformanceLevel) -> Result<()> {
        match &self.supported {
            Some(supported) if !supported.contains(level) => {
                Err(CoreError::UnsupportedConformanceLevel {
                    level: level.to_string(),
                    lowest: supported.lowest.to_string(),
                    highest: supported.highest.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    pub fn rules_for(&self, code: &str) -> &[SeverityRule] {
        self.rules.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rules(&self) -> impl Iterator<Item = &SeverityRule> {
        self.rules.values().flatten()
    }

    /// Severity of `code` for a document at `level`
    ///
    /// The rule with the highest threshold not above `level` applies its
    /// at-or-above severity. When `level` is below every threshold, the
    /// lowest rule's below severity applies. Unknown codes are critical.
    pub fn severity_for(&self, code: &str, level: &ConformanceLevel) -> Severity {
        let rules = self.rules_for(code);

        match rules
            .iter()
            .rev()
            .find(|r| r.since_conformance_level <= *level)
        {
            Some(rule) => rule.severity_at_or_above_threshold,
            None => rules
                .first()
                .map(|r| r.severity_below_threshold)
                .unwrap_or(Severity::Critical),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::codes;

    fn level(s: &str) -> ConformanceLevel {
        ConformanceLevel::parse(s).unwrap()
    }

    #[test]
    fn test_builtin_config_parses() {
        let config = SeverityConfig::builtin().unwrap();
        assert_eq!(config.default_conformance_level(), &level("3.0"));
        assert!(config.supported_levels().is_some());
    }

    #[test]
    fn test_builtin_config_covers_raised_codes() {
        let config = SeverityConfig::builtin().unwrap();
        for code in [
            codes::MISSING_DEFINITIONS_VERSION,
            codes::MISSING_REQUIRED_PROPERTY,
            codes::UNKNOWN_PROPERTY,
            codes::CONSTRAINT_VIOLATION,
            codes::UNKNOWN_CONSTRAINT,
            codes::MALFORMED_EQUAL,
            codes::MALFORMED_GREATER_THAN,
            codes::MALFORMED_GREATER_OR_EQUAL,
            codes::MALFORMED_LESS_THAN,
            codes::MALFORMED_LESS_OR_EQUAL,
            codes::MALFORMED_IN_RANGE,
            codes::MALFORMED_VALID_VALUES,
            codes::MALFORMED_LENGTH,
            codes::MALFORMED_MAX_LENGTH,
            codes::MALFORMED_MIN_LENGTH,
            codes::MALFORMED_PATTERN,
            codes::MALFORMED_SCHEMA,
            codes::UNKNOWN_GROUP_MEMBER,
            codes::MALFORMED_SECTION,
            codes::SUBSTITUTION_CYCLE,
        ] {
            assert!(!config.rules_for(code).is_empty(), "no rule for {}", code);
        }
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
defaultConformanceLevel: "4.0"
supportedConformanceLevels:
  lowest: "3.0"
  highest: "9.0"
validationIssues:
  JE006:
    - sinceConformanceLevel: 4.0
      below: WARNING
      atOrAbove: CRITICAL
"#;
        let config = SeverityConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.default_conformance_level(), &level("4.0"));
        assert_eq!(config.severity_for("JE006", &level("3.0")), Severity::Warning);
        assert_eq!(config.severity_for("JE006", &level("4.0")), Severity::Critical);
        assert_eq!(config.severity_for("JE999", &level("4.0")), Severity::Critical);
    }

    #[test]
    fn test_multiple_thresholds_per_code() {
        let yaml = r#"
validationIssues:
  JE006:
    - sinceConformanceLevel: "5.0"
      below: WARNING
      atOrAbove: CRITICAL
    - sinceConformanceLevel: "3.0"
      below: NOT_ANALYZED
      atOrAbove: WARNING
"#;
        let config = SeverityConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.severity_for("JE006", &level("2.0")), Severity::NotAnalyzed);
        assert_eq!(config.severity_for("JE006", &level("3.0")), Severity::Warning);
        assert_eq!(config.severity_for("JE006", &level("4.0")), Severity::Warning);
        assert_eq!(config.severity_for("JE006", &level("5.0")), Severity::Critical);
    }

    #[test]
    fn test_supported_range() {
        let config = SeverityConfig::builtin().unwrap();
        assert!(config.check_supported(&level("3.0")).is_ok());
        assert!(matches!(
            config.check_supported(&level("1.0")),
            Err(CoreError::UnsupportedConformanceLevel { .. })
        ));

        let unbounded = SeverityConfig::empty();
        assert!(unbounded.check_supported(&level("1.0")).is_ok());
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            SeverityConfig::from_yaml("validationIssues: { JE006: [] }"),
            Err(CoreError::InvalidConfig { .. })
        ));
        assert!(matches!(
            SeverityConfig::from_yaml(
                "supportedConformanceLevels: { lowest: \"9.0\", highest: \"3.0\" }"
            ),
            Err(CoreError::InvalidConfig { .. })
        ));
        assert!(SeverityConfig::from_yaml(
            "validationIssues: { JE006: [ { sinceConformanceLevel: x, below: WARNING, atOrAbove: CRITICAL } ] }"
        )
        .is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("issues.yaml");
        std::fs::write(
            &path,
            "validationIssues:\n  X:\n    - sinceConformanceLevel: \"1.0\"\n      below: WARNING\n      atOrAbove: WARNING\n",
        )
        .unwrap();

        let config = SeverityConfig::from_file(&path).unwrap();
        assert_eq!(config.severity_for("X", &level("3.0")), Severity::Warning);
    }
}
