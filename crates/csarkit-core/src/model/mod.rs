//! Document model
//!
//! The model is plain owned data built once by [`TemplateBuilder`] and read
//! afterwards. Nested composition is an owned tree: a [`NodeTemplate`] owns
//! the [`SubstitutionMappings`] behind it, with no back-references.

mod builder;
mod group;
mod metadata;
mod node_template;
mod property;
mod template;
mod topology;
mod types;

pub use builder::TemplateBuilder;
pub use group::Group;
pub use metadata::Metadata;
pub use node_template::{NodeTemplate, Requirement};
pub use property::{Input, Property};
pub use template::{Template, CSAR_META, TOSCA_META};
pub use topology::{Substitution, SubstitutionMappings, TopologyTemplate};
pub use types::{NodeTypeDef, PropertyDef, ResolvedProperties, TypeCatalog, ROOT_NODE_TYPE};
