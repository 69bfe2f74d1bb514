//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use csarkit_core::CoreError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// The CSAR parsed with critical issues
    #[error("Validation failed: {message}")]
    #[diagnostic(code(csarkit::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// The CSAR could not be loaded
    #[error("CSAR error: {message}")]
    #[diagnostic(code(csarkit::cli::csar))]
    Csar {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// A node template, group or path did not resolve
    #[error("{message}")]
    #[diagnostic(code(csarkit::cli::not_found))]
    NotFound {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Invalid command line input
    #[error("Invalid input: {message}")]
    #[diagnostic(code(csarkit::cli::input))]
    Input { message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(csarkit::cli::io))]
    Io { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Csar { .. } => exit_codes::CSAR_ERROR,
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::Input { .. } => exit_codes::USAGE_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
        }
    }

    /// Create an input error (user provided invalid input)
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            help: None,
        }
    }

    /// Create a not-found error with help text
    pub fn not_found_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::CriticalIssues { report } => CliError::Validation {
                message: format!("{} critical issue(s)", report.critical.len()),
                help: Some("run `csarkit validate` to list every issue".to_string()),
            },
            CoreError::Io(e) => CliError::Io {
                message: e.to_string(),
            },
            CoreError::InvalidConfig { .. } => CliError::Input {
                message: err.to_string(),
            },
            CoreError::UnsupportedConformanceLevel { .. } => CliError::Csar {
                message: err.to_string(),
                help: Some("pass a --config whose supportedConformanceLevels covers it".to_string()),
            },
            other => CliError::Csar {
                message: other.to_string(),
                help: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csarkit_core::IssueReport;

    #[test]
    fn test_core_errors_map_to_exit_codes() {
        let err: CliError = CoreError::PathNotValid {
            path: "missing".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_codes::CSAR_ERROR);

        let err: CliError = CoreError::CriticalIssues {
            report: IssueReport::default(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_codes::VALIDATION_ERROR);

        let err: CliError = CoreError::InvalidConfig {
            message: "bad".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_codes::USAGE_ERROR);
    }

    #[test]
    fn test_not_found_message() {
        let err = CliError::not_found("No node template named 'x'");
        assert_eq!(err.to_string(), "No node template named 'x'");
        assert_eq!(err.exit_code(), exit_codes::NOT_FOUND);
    }
}
