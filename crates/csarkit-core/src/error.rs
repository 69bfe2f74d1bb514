//! Core error types

use thiserror::Error;

use crate::issues::IssueReport;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Path is not valid: {path}")]
    PathNotValid { path: String },

    #[error("Invalid CSAR format: {message}")]
    InvalidCsarFormat { message: String },

    #[error("Entry definitions not found in CSAR: {path}")]
    EntryDefinitionsNotFound { path: String },

    #[error("Invalid template: {message}")]
    InvalidTemplate { message: String },

    #[error("Invalid conformance level '{level}'")]
    InvalidConformanceLevel { level: String },

    #[error("Conformance level {level} is outside the supported range {lowest} - {highest}")]
    UnsupportedConformanceLevel {
        level: String,
        lowest: String,
        highest: String,
    },

    #[error("Invalid severity configuration: {message}")]
    InvalidConfig { message: String },

    #[error("CSAR has {} critical validation issue(s)", report.critical.len())]
    CriticalIssues { report: IssueReport },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Structural errors abort parsing before any issue is classified
    pub fn is_structural(&self) -> bool {
        !matches!(self, CoreError::CriticalIssues { .. })
    }

    /// The classified issues carried by a critical failure
    pub fn report(&self) -> Option<&IssueReport> {
        match self {
            CoreError::CriticalIssues { report } => Some(report),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
