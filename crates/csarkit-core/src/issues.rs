//! Validation issues and their classification
//!
//! Issues are collected while the document model is built and classified
//! exactly once afterwards. [`IssueCollector::classify`] consumes the
//! collector, so a run cannot be classified twice or collect after the fact.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::config::SeverityConfig;
use crate::conformance::ConformanceLevel;
use crate::error::{CoreError, Result};

/// Issue codes raised while building the document model
pub mod codes {
    pub const MISSING_DEFINITIONS_VERSION: &str = "JE002";
    pub const MISSING_REQUIRED_PROPERTY: &str = "JE003";
    pub const UNKNOWN_PROPERTY: &str = "JE006";
    pub const CONSTRAINT_VIOLATION: &str = "JE008";
    pub const UNKNOWN_CONSTRAINT: &str = "JE009";
    pub const MALFORMED_EQUAL: &str = "JE104";
    pub const MALFORMED_GREATER_THAN: &str = "JE105";
    pub const MALFORMED_GREATER_OR_EQUAL: &str = "JE106";
    pub const MALFORMED_LESS_THAN: &str = "JE107";
    pub const MALFORMED_LESS_OR_EQUAL: &str = "JE108";
    pub const MALFORMED_IN_RANGE: &str = "JE109";
    pub const MALFORMED_VALID_VALUES: &str = "JE110";
    pub const MALFORMED_LENGTH: &str = "JE111";
    pub const MALFORMED_MAX_LENGTH: &str = "JE112";
    pub const MALFORMED_MIN_LENGTH: &str = "JE113";
    pub const MALFORMED_PATTERN: &str = "JE114";
    pub const MALFORMED_SCHEMA: &str = "JE115";
    pub const UNKNOWN_GROUP_MEMBER: &str = "JE201";
    pub const MALFORMED_SECTION: &str = "JE203";
    pub const SUBSTITUTION_CYCLE: &str = "JE204";
}

/// Severity of a classified issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Fails the parse
    Critical,
    /// Reported, parse continues
    Warning,
    /// Raised by a check not yet in effect at the document's conformance level
    NotAnalyzed,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::NotAnalyzed => "not analyzed",
        };
        f.write_str(name)
    }
}

/// A problem detected while building the document model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub code: String,
    pub message: String,
    pub severity: Severity,
}

impl ValidationIssue {
    /// Create an unclassified issue (critical until classified)
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity: Severity::Critical,
        }
    }

    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Accumulates issues during document construction
#[derive(Debug, Default)]
pub struct IssueCollector {
    issues: Vec<ValidationIssue>,
}

impl IssueCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        debug!(code = %issue.code, "validation issue: {}", issue.message);
        self.issues.push(issue);
    }

    /// Record a new issue
    pub fn raise(&mut self, code: &str, message: impl Into<String>) {
        self.push(ValidationIssue::new(code, message));
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Classify every collected issue, ending the collecting phase
    pub fn classify(self, config: &SeverityConfig, level: &ConformanceLevel) -> IssueReport {
        classify_issues(&self.issues, config, level)
    }
}

/// Issues partitioned by severity, in the order they were raised
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueReport {
    pub not_analyzed: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub critical: Vec<ValidationIssue>,
}

impl IssueReport {
    pub fn is_clean(&self) -> bool {
        self.not_analyzed.is_empty() && self.warnings.is_empty() && self.critical.is_empty()
    }

    pub fn has_critical(&self) -> bool {
        !self.critical.is_empty()
    }

    pub fn total(&self) -> usize {
        self.not_analyzed.len() + self.warnings.len() + self.critical.len()
    }

    /// Issues of one bucket
    pub fn bucket(&self, severity: Severity) -> &[ValidationIssue] {
        match severity {
            Severity::Critical => &self.critical,
            Severity::Warning => &self.warnings,
            Severity::NotAnalyzed => &self.not_analyzed,
        }
    }

    /// Fail when at least one issue classified as critical
    pub fn into_result(self) -> Result<IssueReport> {
        if self.has_critical() {
            Err(CoreError::CriticalIssues { report: self })
        } else {
            Ok(self)
        }
    }
}

/// Partition issues by the severity their code has at `level`
pub fn classify_issues(
    issues: &[ValidationIssue],
    config: &SeverityConfig,
    level: &ConformanceLevel,
) -> IssueReport {
    let mut report = IssueReport::default();

    for issue in issues {
        let severity = config.severity_for(&issue.code, level);
        let classified = issue.clone().with_severity(severity);
        match severity {
            Severity::NotAnalyzed => report.not_analyzed.push(classified),
            Severity::Warning => report.warnings.push(classified),
            Severity::Critical => report.critical.push(classified),
        }
    }

    debug!(
        level = %level,
        not_analyzed = report.not_analyzed.len(),
        warnings = report.warnings.len(),
        critical = report.critical.len(),
        "classified validation issues"
    );

    report
}
