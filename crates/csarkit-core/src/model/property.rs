//! Properties and inputs

use serde::Serialize;

use crate::constraints::Constraint;
use crate::value::RawValue;

/// A property assigned on a node template or group
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub name: String,

    /// Type from the node type definition, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<String>,

    pub value: RawValue,
}

impl Property {
    pub fn new(name: impl Into<String>, value: RawValue) -> Self {
        Self {
            name: name.into(),
            declared_type: None,
            value,
        }
    }

    #[must_use]
    pub fn with_type(mut self, declared_type: Option<String>) -> Self {
        self.declared_type = declared_type;
        self
    }
}

/// A topology input parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    pub name: String,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// TOSCA `required`, true unless declared otherwise
    pub required: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<RawValue>,

    /// Well-formed constraints declared on the input
    #[serde(skip)]
    pub constraints: Vec<Constraint>,
}

impl Input {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: None,
            description: None,
            required: true,
            default: None,
            constraints: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_default(mut self, default: RawValue) -> Self {
        self.default = Some(default);
        self
    }
}
