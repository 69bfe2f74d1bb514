//! csarkit Core - Parsing and querying of TOSCA service CSARs
//!
//! This crate provides the building blocks used by the `csarkit` CLI:
//! - `Csar`: A CSAR directory or tarball and its meta files
//! - `CsarParser`: Builds the document model and classifies validation issues
//! - `Template`: The parsed service, with nested templates expanded
//! - `EntityQuery`: Node template and group lookup by type and metadata
//! - `ServiceHelper`: SDC service-level queries
//! - `SeverityConfig`: Issue severities gated by conformance level

pub mod config;
pub mod conformance;
pub mod constraints;
pub mod csar;
pub mod error;
pub mod helper;
pub mod issues;
pub mod model;
pub mod parser;
pub mod path;
pub mod query;
pub mod value;

pub use config::{SeverityConfig, SeverityRule, SupportedLevels};
pub use conformance::ConformanceLevel;
pub use constraints::{Constraint, ConstraintKind};
pub use csar::Csar;
pub use error::{CoreError, Result};
pub use helper::{SdcType, ServiceHelper};
pub use issues::{IssueCollector, IssueReport, Severity, ValidationIssue};
pub use model::{
    Group, Input, Metadata, NodeTemplate, Property, Requirement, Template, TopologyTemplate,
    TypeCatalog,
};
pub use parser::{CsarParser, ParsedCsar};
pub use path::{PathError, PATH_DELIMITER};
pub use query::{Entity, EntityKind, EntityQuery, MetadataFilter};
pub use value::{RawValue, Scalar, ValueShape};
