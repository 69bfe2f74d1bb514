//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - the CSAR has critical issues
pub const VALIDATION_ERROR: i32 = 2;

/// Not found - a queried entity or path does not exist
pub const NOT_FOUND: i32 = 3;

/// CSAR error - unreadable archive, missing entry definitions, bad conformance level
pub const CSAR_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
