//! Property and input path resolution
//!
//! A path is a `#`-separated list of segments. The first segment names a
//! property or input; inputs must then select `default`. Each following
//! segment steps into a mapping entry. A list met on the way is replaced by
//! its first element and the same segment is tried again, so
//! `port#ip_requirements#ip_version` reaches into the first element of an
//! `ip_requirements` list.

use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, error};

use crate::model::{Input, Property};
use crate::value::{RawValue, ValueShape};

/// Segment separator of the path syntax
pub const PATH_DELIMITER: char = '#';

/// Second segment required by input paths
pub const DEFAULT_SELECTOR: &str = "default";

/// Why a path did not resolve
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Path is empty")]
    EmptyPath,

    #[error("No property or input named '{name}'")]
    RootNotFound { name: String },

    #[error("Input path '{path}' must select 'default' as its second segment")]
    MissingDefaultSelector { path: String },

    #[error("'{name}' has no value to start from")]
    NoStartValue { name: String },

    #[error("Path not found at segment '{segment}'")]
    SegmentNotFound { segment: String },

    #[error("Found an unexpected {shape} at segment '{segment}' where a complex type was expected")]
    UnexpectedLeaf { segment: String, shape: ValueShape },

    #[error("Empty list met at segment '{segment}'")]
    EmptySequence { segment: String },
}

/// Something a path can start from
pub trait PathRoot {
    /// The value traversal starts from, and how many of `selectors` (the
    /// segments after the name) were consumed choosing it
    fn traversal_root<'s>(
        &'s self,
        path: &str,
        selectors: &[&str],
    ) -> Result<(&'s RawValue, usize), PathError>;
}

impl PathRoot for Property {
    fn traversal_root<'s>(
        &'s self,
        _path: &str,
        _selectors: &[&str],
    ) -> Result<(&'s RawValue, usize), PathError> {
        if self.value.is_null() {
            return Err(PathError::NoStartValue {
                name: self.name.clone(),
            });
        }
        Ok((&self.value, 0))
    }
}

impl PathRoot for Input {
    fn traversal_root<'s>(
        &'s self,
        path: &str,
        selectors: &[&str],
    ) -> Result<(&'s RawValue, usize), PathError> {
        if selectors.first() != Some(&DEFAULT_SELECTOR) {
            return Err(PathError::MissingDefaultSelector {
                path: path.to_string(),
            });
        }
        match &self.default {
            Some(default) => Ok((default, 1)),
            None => Err(PathError::NoStartValue {
                name: self.name.clone(),
            }),
        }
    }
}

/// Resolve `path`, telling why it failed
pub fn try_resolve<'r, R: PathRoot>(
    path: &str,
    roots: &'r IndexMap<String, R>,
) -> Result<&'r RawValue, PathError> {
    if path.is_empty() {
        return Err(PathError::EmptyPath);
    }

    let mut segments: Vec<&str> = path.split(PATH_DELIMITER).collect();
    // A trailing delimiter selects nothing
    while segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }
    let (name, selectors) = match segments.split_first() {
        Some((name, selectors)) => (*name, selectors),
        None => return Err(PathError::EmptyPath),
    };

    let root = roots.get(name).ok_or_else(|| PathError::RootNotFound {
        name: name.to_string(),
    })?;
    let (mut current, consumed) = root.traversal_root(path, selectors)?;

    let remaining = &selectors[consumed..];
    let mut index = 0;
    while let Some(segment) = remaining.get(index) {
        match current {
            RawValue::Mapping(entries) => {
                current = entries
                    .get(*segment)
                    .ok_or_else(|| PathError::SegmentNotFound {
                        segment: segment.to_string(),
                    })?;
                index += 1;
            }
            // Lists unwrap to their first element; the segment is retried
            RawValue::Sequence(items) => {
                current = items.first().ok_or_else(|| PathError::EmptySequence {
                    segment: segment.to_string(),
                })?;
            }
            leaf => {
                return Err(PathError::UnexpectedLeaf {
                    segment: segment.to_string(),
                    shape: leaf.shape(),
                });
            }
        }
    }

    if current.is_null() {
        let segment = remaining.last().copied().unwrap_or(name);
        return Err(PathError::SegmentNotFound {
            segment: segment.to_string(),
        });
    }

    Ok(current)
}

/// Resolve `path` to a value; every failure is absent
pub fn resolve<'r, R: PathRoot>(path: &str, roots: &'r IndexMap<String, R>) -> Option<&'r RawValue> {
    match try_resolve(path, roots) {
        Ok(value) => Some(value),
        Err(
            e @ (PathError::EmptyPath
            | PathError::MissingDefaultSelector { .. }
            | PathError::RootNotFound { .. }),
        ) => {
            error!(path, "invalid path: {}", e);
            None
        }
        Err(e) => {
            debug!(path, "path did not resolve: {}", e);
            None
        }
    }
}

/// Resolve `path` to the string form of a scalar
///
/// Mappings, lists and unresolved function calls have no leaf form.
pub fn resolve_leaf<R: PathRoot>(path: &str, roots: &IndexMap<String, R>) -> Option<String> {
    resolve(path, roots).and_then(RawValue::leaf_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties(yaml: &str) -> IndexMap<String, Property> {
        let raw = RawValue::from_yaml_str(yaml).unwrap();
        raw.as_mapping()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), Property::new(k.clone(), v.clone())))
            .collect()
    }

    fn inputs() -> IndexMap<String, Input> {
        let mut inputs = IndexMap::new();
        inputs.insert(
            "vnf_config".to_string(),
            Input::new("vnf_config").with_default(
                RawValue::from_yaml_str("{image: ubuntu, flavors: [{name: m1.small}]}").unwrap(),
            ),
        );
        inputs.insert("no_default".to_string(), Input::new("no_default"));
        inputs
    }

    const PROPS: &str = r#"
nf_role: vFW
max_instances: 3
enabled: true
ratio: 1.5
network_role: { get_input: role }
nf_naming:
  ecomp_generated_naming: true
  naming_policy: ""
ip_requirements:
  - ip_version: 4
    ip_count_required:
      is_required: false
empty: []
nothing: ~
"#;

    #[test]
    fn test_resolve_leaf_scalars() {
        let props = properties(PROPS);

        assert_eq!(resolve_leaf("nf_role", &props).as_deref(), Some("vFW"));
        assert_eq!(resolve_leaf("max_instances", &props).as_deref(), Some("3"));
        assert_eq!(resolve_leaf("enabled", &props).as_deref(), Some("true"));
        assert_eq!(resolve_leaf("ratio", &props).as_deref(), Some("1.5"));
        assert_eq!(
            resolve_leaf("nf_naming#ecomp_generated_naming", &props).as_deref(),
            Some("true")
        );
        assert_eq!(resolve_leaf("nf_naming#naming_policy", &props).as_deref(), Some(""));
    }

    #[test]
    fn test_resolve_leaf_non_scalars() {
        let props = properties(PROPS);

        assert!(resolve("network_role", &props).unwrap().is_function());
        assert_eq!(resolve_leaf("network_role", &props), None);
        assert!(resolve("nf_naming", &props).unwrap().as_mapping().is_some());
        assert_eq!(resolve_leaf("nf_naming", &props), None);
    }

    #[test]
    fn test_sequences_unwrap_to_first_element() {
        let props = properties(PROPS);

        assert_eq!(
            resolve_leaf("ip_requirements#ip_version", &props).as_deref(),
            Some("4")
        );
        assert_eq!(
            resolve_leaf("ip_requirements#ip_count_required#is_required", &props).as_deref(),
            Some("false")
        );
        // An index token is just a missing key of the first element
        assert_eq!(
            try_resolve("ip_requirements#1", &props),
            Err(PathError::SegmentNotFound {
                segment: "1".to_string()
            })
        );
    }

    #[test]
    fn test_nested_sequence_layers_unwrap_like_their_element() {
        let element = "{a: {b: leaf}}";
        for depth in 0..4 {
            let wrapped = (0..depth).fold(element.to_string(), |acc, _| format!("[{}]", acc));
            let props = properties(&format!("p: {}", wrapped));
            assert_eq!(
                resolve_leaf("p#a#b", &props).as_deref(),
                Some("leaf"),
                "depth {}",
                depth
            );
        }
    }

    #[test]
    fn test_failures() {
        let props = properties(PROPS);

        assert_eq!(try_resolve("", &props), Err(PathError::EmptyPath));
        assert_eq!(
            try_resolve("missing", &props),
            Err(PathError::RootNotFound {
                name: "missing".to_string()
            })
        );
        assert!(matches!(
            try_resolve("nf_role#sub", &props),
            Err(PathError::UnexpectedLeaf {
                shape: ValueShape::String,
                ..
            })
        ));
        assert!(matches!(
            try_resolve("network_role#x", &props),
            Err(PathError::UnexpectedLeaf {
                shape: ValueShape::Function,
                ..
            })
        ));
        assert!(matches!(
            try_resolve("empty#x", &props),
            Err(PathError::EmptySequence { .. })
        ));
        assert!(matches!(
            try_resolve("nothing", &props),
            Err(PathError::NoStartValue { .. })
        ));
        assert!(matches!(
            try_resolve("nf_naming#missing", &props),
            Err(PathError::SegmentNotFound { .. })
        ));
        assert_eq!(resolve("nf_naming#missing", &props), None);
        assert_eq!(resolve("", &props), None);
        assert_eq!(resolve("missing", &props), None);
    }

    #[test]
    fn test_trailing_delimiters_are_ignored() {
        let props = properties(PROPS);

        assert_eq!(resolve_leaf("nf_role#", &props).as_deref(), Some("vFW"));
        assert_eq!(
            resolve_leaf("nf_naming#ecomp_generated_naming##", &props).as_deref(),
            Some("true")
        );
        assert_eq!(try_resolve("#", &props), Err(PathError::EmptyPath));
        // Inner empty segments still select the empty key
        assert!(matches!(
            try_resolve("nf_naming##naming_policy", &props),
            Err(PathError::SegmentNotFound { .. })
        ));

        let inputs = inputs();
        assert_eq!(
            resolve_leaf("vnf_config#default#image#", &inputs).as_deref(),
            Some("ubuntu")
        );
    }

    #[test]
    fn test_input_paths_require_default() {
        let inputs = inputs();

        assert_eq!(
            resolve_leaf("vnf_config#default#image", &inputs).as_deref(),
            Some("ubuntu")
        );
        assert_eq!(
            resolve_leaf("vnf_config#default#flavors#name", &inputs).as_deref(),
            Some("m1.small")
        );
        assert!(resolve("vnf_config#default", &inputs).is_some());

        for path in ["vnf_config", "vnf_config#image", "vnf_config#value#image"] {
            assert!(matches!(
                try_resolve(path, &inputs),
                Err(PathError::MissingDefaultSelector { .. })
            ));
            assert_eq!(resolve(path, &inputs), None);
        }

        assert_eq!(
            try_resolve("no_default#default", &inputs),
            Err(PathError::NoStartValue {
                name: "no_default".to_string()
            })
        );
    }

    #[test]
    fn test_null_leaf_is_absent() {
        let props = properties("p: { a: ~ }");
        assert_eq!(
            try_resolve("p#a", &props),
            Err(PathError::SegmentNotFound {
                segment: "a".to_string()
            })
        );
    }
}
