//! Raw values handed over by the YAML layer
//!
//! Every property, input default, metadata entry and constraint operand is a
//! [`RawValue`]: a closed tagged union over the shapes a TOSCA document can
//! produce. Intrinsic function calls (`get_input`, `concat`, ...) are kept as
//! their own variant and are never evaluated.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::error::Result;

/// TOSCA intrinsic functions recognized as unresolved function calls
pub const INTRINSIC_FUNCTIONS: &[&str] = &[
    "get_input",
    "get_property",
    "get_attribute",
    "get_operation_output",
    "get_nodes_of_type",
    "get_artifact",
    "concat",
    "token",
];

/// A leaf value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Integer(i) => write!(f, "{}", i),
            // Keep the fractional part so 2.0 renders as "2.0", not "2"
            Scalar::Float(x) => write!(f, "{:?}", x),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

/// An intrinsic function call left unresolved at parse time
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    /// Function name, e.g. `get_input`
    pub name: String,
    /// Arguments exactly as written in the document
    pub args: Box<RawValue>,
}

/// A deserialized document value
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Scalar(Scalar),
    Mapping(IndexMap<String, RawValue>),
    Sequence(Vec<RawValue>),
    Function(FunctionCall),
}

/// The shape of a value, used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Null,
    Bool,
    Integer,
    Float,
    String,
    Mapping,
    Sequence,
    Function,
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueShape::Null => "null",
            ValueShape::Bool => "boolean",
            ValueShape::Integer => "integer",
            ValueShape::Float => "float",
            ValueShape::String => "string",
            ValueShape::Mapping => "map",
            ValueShape::Sequence => "list",
            ValueShape::Function => "function",
        };
        f.write_str(name)
    }
}

impl RawValue {
    pub fn null() -> Self {
        RawValue::Scalar(Scalar::Null)
    }

    pub fn string(s: impl Into<String>) -> Self {
        RawValue::Scalar(Scalar::String(s.into()))
    }

    pub fn integer(i: i64) -> Self {
        RawValue::Scalar(Scalar::Integer(i))
    }

    /// Parse a YAML document into a raw value
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        Ok(Self::from_yaml(&value))
    }

    /// Convert a `serde_yaml` value, detecting intrinsic function calls
    pub fn from_yaml(value: &serde_yaml::Value) -> Self {
        use serde_yaml::Value as Y;

        match value {
            Y::Null => RawValue::null(),
            Y::Bool(b) => RawValue::Scalar(Scalar::Bool(*b)),
            Y::Number(n) => {
                if let Some(i) = n.as_i64() {
                    RawValue::integer(i)
                } else {
                    RawValue::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            Y::String(s) => RawValue::string(s.as_str()),
            Y::Sequence(items) => RawValue::Sequence(items.iter().map(Self::from_yaml).collect()),
            Y::Mapping(map) => {
                let entries: IndexMap<String, RawValue> = map
                    .iter()
                    .map(|(k, v)| (yaml_key(k), Self::from_yaml(v)))
                    .collect();
                Self::mapping_or_function(entries)
            }
            Y::Tagged(tagged) => Self::from_yaml(&tagged.value),
        }
    }

    fn mapping_or_function(mut entries: IndexMap<String, RawValue>) -> Self {
        if entries.len() == 1 {
            let is_function = entries
                .keys()
                .next()
                .map(|k| INTRINSIC_FUNCTIONS.contains(&k.as_str()))
                .unwrap_or(false);
            if is_function {
                if let Some((name, args)) = entries.pop() {
                    return RawValue::Function(FunctionCall {
                        name,
                        args: Box::new(args),
                    });
                }
            }
        }
        RawValue::Mapping(entries)
    }

    pub fn shape(&self) -> ValueShape {
        match self {
            RawValue::Scalar(Scalar::Null) => ValueShape::Null,
            RawValue::Scalar(Scalar::Bool(_)) => ValueShape::Bool,
            RawValue::Scalar(Scalar::Integer(_)) => ValueShape::Integer,
            RawValue::Scalar(Scalar::Float(_)) => ValueShape::Float,
            RawValue::Scalar(Scalar::String(_)) => ValueShape::String,
            RawValue::Mapping(_) => ValueShape::Mapping,
            RawValue::Sequence(_) => ValueShape::Sequence,
            RawValue::Function(_) => ValueShape::Function,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Scalar(Scalar::Null))
    }

    pub fn is_function(&self) -> bool {
        matches!(self, RawValue::Function(_))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            RawValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RawValue::Scalar(Scalar::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of integers and floats
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Scalar(Scalar::Integer(i)) => Some(*i as f64),
            RawValue::Scalar(Scalar::Float(x)) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RawValue::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, RawValue>> {
        match self {
            RawValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[RawValue]> {
        match self {
            RawValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a key when this value is a mapping
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// String rendering of a scalar (`None` for null and non-scalars)
    pub fn leaf_string(&self) -> Option<String> {
        match self {
            RawValue::Scalar(Scalar::Null) => None,
            RawValue::Scalar(s) => Some(s.to_string()),
            _ => None,
        }
    }

    /// Convert to JSON, keeping function calls as `{name: args}`
    pub fn to_json(&self) -> JsonValue {
        match self {
            RawValue::Scalar(Scalar::Null) => JsonValue::Null,
            RawValue::Scalar(Scalar::Bool(b)) => JsonValue::Bool(*b),
            RawValue::Scalar(Scalar::Integer(i)) => JsonValue::from(*i),
            RawValue::Scalar(Scalar::Float(x)) => serde_json::Number::from_f64(*x)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            RawValue::Scalar(Scalar::String(s)) => JsonValue::String(s.clone()),
            RawValue::Mapping(m) => JsonValue::Object(
                m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            RawValue::Sequence(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
            RawValue::Function(call) => {
                let mut obj = serde_json::Map::new();
                obj.insert(call.name.clone(), call.args.to_json());
                JsonValue::Object(obj)
            }
        }
    }
}

fn yaml_key(key: &serde_yaml::Value) -> String {
    match RawValue::from_yaml(key) {
        RawValue::Scalar(s) => s.to_string(),
        other => other.to_string(),
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Scalar(s) => write!(f, "{}", s),
            RawValue::Mapping(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
            RawValue::Sequence(items) => {
                f.write_str("[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str("]")
            }
            RawValue::Function(call) => write!(f, "{{{}: {}}}", call.name, call.args),
        }
    }
}

impl Serialize for RawValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::string(s)
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::string(s)
    }
}

impl From<i64> for RawValue {
    fn from(i: i64) -> Self {
        RawValue::integer(i)
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Scalar(Scalar::Bool(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_yaml_shapes() {
        let value = RawValue::from_yaml_str(
            r#"
name: vfw
count: 3
ratio: 0.5
enabled: true
nothing: ~
tags: [a, b]
"#,
        )
        .unwrap();

        assert_eq!(value.get("name").unwrap().as_str(), Some("vfw"));
        assert_eq!(value.get("count").unwrap().as_i64(), Some(3));
        assert_eq!(value.get("ratio").unwrap().as_f64(), Some(0.5));
        assert_eq!(value.get("enabled").unwrap().as_bool(), Some(true));
        assert!(value.get("nothing").unwrap().is_null());
        assert_eq!(value.get("tags").unwrap().shape(), ValueShape::Sequence);
    }

    #[test]
    fn test_intrinsic_function_detected() {
        let value = RawValue::from_yaml_str("network_role: { get_input: role }").unwrap();
        let role = value.get("network_role").unwrap();

        match role {
            RawValue::Function(call) => {
                assert_eq!(call.name, "get_input");
                assert_eq!(call.args.as_str(), Some("role"));
            }
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_single_key_mapping_is_not_function() {
        let value = RawValue::from_yaml_str("port: { number: 8080 }").unwrap();
        assert_eq!(value.get("port").unwrap().shape(), ValueShape::Mapping);
    }

    #[test]
    fn test_non_string_keys_are_rendered() {
        let value = RawValue::from_yaml_str("{1: one, true: yes}").unwrap();
        let map = value.as_mapping().unwrap();
        assert!(map.contains_key("1"));
        assert!(map.contains_key("true"));
    }

    #[test]
    fn test_leaf_string() {
        assert_eq!(RawValue::integer(42).leaf_string(), Some("42".to_string()));
        assert_eq!(RawValue::from(true).leaf_string(), Some("true".to_string()));
        assert_eq!(
            RawValue::Scalar(Scalar::Float(2.0)).leaf_string(),
            Some("2.0".to_string())
        );
        assert_eq!(RawValue::null().leaf_string(), None);
        assert_eq!(RawValue::Sequence(vec![]).leaf_string(), None);
    }

    #[test]
    fn test_display() {
        let value = RawValue::from_yaml_str("{a: 1, b: [x, y], c: {get_input: z}}").unwrap();
        assert_eq!(value.to_string(), "{a: 1, b: [x, y], c: {get_input: z}}");
    }

    #[test]
    fn test_to_json_keeps_functions() {
        let value = RawValue::from_yaml_str("{b: 1, a: {get_input: x}}").unwrap();
        let json = value.to_json();
        assert_eq!(json["b"], 1);
        assert_eq!(json["a"]["get_input"], "x");
    }
}
