//! Property constraints
//!
//! A constraint is declared in a property or input schema as a single-entry
//! mapping, e.g. `{min_length: 3}`. Every operator follows the same contract:
//! the operand shape is checked once when the schema is parsed
//! ([`Constraint::well_formed`]) and each value is checked by a predicate that
//! dispatches on the value's shape ([`Constraint::validate`]).

use regex::Regex;
use std::fmt;

use crate::issues::{codes, ValidationIssue};
use crate::value::RawValue;

/// Upper bound keyword accepted by `in_range`
const UNBOUNDED: &str = "UNBOUNDED";

/// Constraint operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Equal,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    InRange,
    ValidValues,
    Length,
    MinLength,
    MaxLength,
    Pattern,
    Schema,
}

impl ConstraintKind {
    pub const ALL: [ConstraintKind; 12] = [
        ConstraintKind::Equal,
        ConstraintKind::GreaterThan,
        ConstraintKind::GreaterOrEqual,
        ConstraintKind::LessThan,
        ConstraintKind::LessOrEqual,
        ConstraintKind::InRange,
        ConstraintKind::ValidValues,
        ConstraintKind::Length,
        ConstraintKind::MinLength,
        ConstraintKind::MaxLength,
        ConstraintKind::Pattern,
        ConstraintKind::Schema,
    ];

    /// Operator name as written in TOSCA
    pub fn key(&self) -> &'static str {
        match self {
            ConstraintKind::Equal => "equal",
            ConstraintKind::GreaterThan => "greater_than",
            ConstraintKind::GreaterOrEqual => "greater_or_equal",
            ConstraintKind::LessThan => "less_than",
            ConstraintKind::LessOrEqual => "less_or_equal",
            ConstraintKind::InRange => "in_range",
            ConstraintKind::ValidValues => "valid_values",
            ConstraintKind::Length => "length",
            ConstraintKind::MinLength => "min_length",
            ConstraintKind::MaxLength => "max_length",
            ConstraintKind::Pattern => "pattern",
            ConstraintKind::Schema => "schema",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.key() == key)
    }

    /// Issue code raised when the operand has the wrong shape
    pub fn malformed_code(&self) -> &'static str {
        match self {
            ConstraintKind::Equal => codes::MALFORMED_EQUAL,
            ConstraintKind::GreaterThan => codes::MALFORMED_GREATER_THAN,
            ConstraintKind::GreaterOrEqual => codes::MALFORMED_GREATER_OR_EQUAL,
            ConstraintKind::LessThan => codes::MALFORMED_LESS_THAN,
            ConstraintKind::LessOrEqual => codes::MALFORMED_LESS_OR_EQUAL,
            ConstraintKind::InRange => codes::MALFORMED_IN_RANGE,
            ConstraintKind::ValidValues => codes::MALFORMED_VALID_VALUES,
            ConstraintKind::Length => codes::MALFORMED_LENGTH,
            ConstraintKind::MinLength => codes::MALFORMED_MIN_LENGTH,
            ConstraintKind::MaxLength => codes::MALFORMED_MAX_LENGTH,
            ConstraintKind::Pattern => codes::MALFORMED_PATTERN,
            ConstraintKind::Schema => codes::MALFORMED_SCHEMA,
        }
    }

    fn expected_operand(&self) -> &'static str {
        match self {
            ConstraintKind::Equal => "a value",
            ConstraintKind::GreaterThan
            | ConstraintKind::GreaterOrEqual
            | ConstraintKind::LessThan
            | ConstraintKind::LessOrEqual => "a number",
            ConstraintKind::InRange => "a list of two numbers",
            ConstraintKind::ValidValues => "a list",
            ConstraintKind::Length | ConstraintKind::MinLength | ConstraintKind::MaxLength => {
                "an integer"
            }
            ConstraintKind::Pattern => "a valid regular expression",
            ConstraintKind::Schema => "a JSON schema map",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A constraint bound to the property it was declared on
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    kind: ConstraintKind,
    property_name: String,
    property_type: Option<String>,
    operand: RawValue,
}

impl Constraint {
    pub fn new(
        kind: ConstraintKind,
        property_name: impl Into<String>,
        property_type: Option<String>,
        operand: RawValue,
    ) -> Self {
        Self {
            kind,
            property_name: property_name.into(),
            property_type,
            operand,
        }
    }

    /// Read a `{operator: operand}` declaration
    ///
    /// Only the declaration's structure is checked here; call
    /// [`Constraint::well_formed`] for the operand.
    pub fn parse(
        property_name: &str,
        property_type: Option<&str>,
        declared: &RawValue,
    ) -> Result<Self, ValidationIssue> {
        let entry = declared
            .as_mapping()
            .filter(|m| m.len() == 1)
            .and_then(|m| m.first());

        let Some((key, operand)) = entry else {
            return Err(ValidationIssue::new(
                codes::UNKNOWN_CONSTRAINT,
                format!(
                    "InvalidSchemaError: Invalid constraint schema \"{}\" of property \"{}\"",
                    declared, property_name
                ),
            ));
        };

        let kind = ConstraintKind::from_key(key).ok_or_else(|| {
            ValidationIssue::new(
                codes::UNKNOWN_CONSTRAINT,
                format!(
                    "InvalidSchemaError: Invalid property \"{}\" in constraint of property \"{}\"",
                    key, property_name
                ),
            )
        })?;

        Ok(Self::new(
            kind,
            property_name,
            property_type.map(str::to_string),
            operand.clone(),
        ))
    }

    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    pub fn operand(&self) -> &RawValue {
        &self.operand
    }

    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    pub fn property_type(&self) -> Option<&str> {
        self.property_type.as_deref()
    }

    /// Check the operand's shape against what the operator accepts
    pub fn well_formed(&self) -> Result<(), ValidationIssue> {
        let op = &self.operand;
        let ok = match self.kind {
            ConstraintKind::Equal => !op.is_function() && !op.is_null(),
            ConstraintKind::GreaterThan
            | ConstraintKind::GreaterOrEqual
            | ConstraintKind::LessThan
            | ConstraintKind::LessOrEqual => op.as_f64().is_some(),
            ConstraintKind::InRange => range_bounds(op).is_some(),
            ConstraintKind::ValidValues => op.as_sequence().is_some(),
            ConstraintKind::Length | ConstraintKind::MinLength | ConstraintKind::MaxLength => {
                op.as_i64().is_some()
            }
            ConstraintKind::Pattern => op.as_str().map(|p| full_match(p).is_ok()).unwrap_or(false),
            ConstraintKind::Schema => {
                op.as_mapping().is_some() && jsonschema::validator_for(&op.to_json()).is_ok()
            }
        };

        if ok {
            Ok(())
        } else {
            Err(ValidationIssue::new(
                self.kind.malformed_code(),
                format!(
                    "InvalidSchemaError: The property \"{}\" expects {}",
                    self.kind.key(),
                    self.kind.expected_operand()
                ),
            ))
        }
    }

    /// Check a property value
    ///
    /// Unresolved function calls always pass: they have no value at parse time.
    pub fn validate(&self, value: &RawValue) -> Result<(), ValidationIssue> {
        if value.is_function() || self.is_satisfied_by(value) {
            Ok(())
        } else {
            Err(ValidationIssue::new(
                codes::CONSTRAINT_VIOLATION,
                format!("ValidationError: {}", self.violation_message(value)),
            ))
        }
    }

    fn is_satisfied_by(&self, value: &RawValue) -> bool {
        let op = &self.operand;
        match self.kind {
            ConstraintKind::Equal => values_equal(value, op),
            ConstraintKind::GreaterThan => compare(value, op, |v, o| v > o),
            ConstraintKind::GreaterOrEqual => compare(value, op, |v, o| v >= o),
            ConstraintKind::LessThan => compare(value, op, |v, o| v < o),
            ConstraintKind::LessOrEqual => compare(value, op, |v, o| v <= o),
            ConstraintKind::InRange => match (value.as_f64(), range_bounds(op)) {
                (Some(v), Some((low, high))) => v >= low && v <= high,
                _ => false,
            },
            ConstraintKind::ValidValues => {
                let Some(allowed) = op.as_sequence() else {
                    return false;
                };
                let listed = |v: &RawValue| allowed.iter().any(|a| values_equal(v, a));
                match value {
                    RawValue::Sequence(items) => items.iter().all(listed),
                    other => listed(other),
                }
            }
            ConstraintKind::Length => match (sized_len(value, true), op.as_i64()) {
                (Some(len), Some(n)) => len as i64 == n,
                _ => false,
            },
            ConstraintKind::MinLength => match (sized_len(value, false), op.as_i64()) {
                (Some(len), Some(n)) => len as i64 >= n,
                _ => false,
            },
            ConstraintKind::MaxLength => match (sized_len(value, false), op.as_i64()) {
                (Some(len), Some(n)) => len as i64 <= n,
                _ => false,
            },
            ConstraintKind::Pattern => match (value.as_str(), op.as_str()) {
                (Some(v), Some(p)) => full_match(p).map(|re| re.is_match(v)).unwrap_or(false),
                _ => false,
            },
            ConstraintKind::Schema => match jsonschema::validator_for(&op.to_json()) {
                Ok(validator) => validator.is_valid(&value.to_json()),
                Err(_) => false,
            },
        }
    }

    fn violation_message(&self, value: &RawValue) -> String {
        let name = &self.property_name;
        let op = &self.operand;
        match self.kind {
            ConstraintKind::Equal => format!(
                "The value \"{}\" of property \"{}\" is not equal to \"{}\".",
                value, name, op
            ),
            ConstraintKind::GreaterThan => format!(
                "The value \"{}\" of property \"{}\" must be greater than \"{}\".",
                value, name, op
            ),
            ConstraintKind::GreaterOrEqual => format!(
                "The value \"{}\" of property \"{}\" must be greater than or equal to \"{}\".",
                value, name, op
            ),
            ConstraintKind::LessThan => format!(
                "The value \"{}\" of property \"{}\" must be less than \"{}\".",
                value, name, op
            ),
            ConstraintKind::LessOrEqual => format!(
                "The value \"{}\" of property \"{}\" must be less than or equal to \"{}\".",
                value, name, op
            ),
            ConstraintKind::InRange => {
                let (low, high) = match op.as_sequence() {
                    Some([low, high]) => (low.to_string(), high.to_string()),
                    _ => (op.to_string(), String::new()),
                };
                format!(
                    "The value \"{}\" of property \"{}\" is out of range \"(min:{}, max:{})\".",
                    value, name, low, high
                )
            }
            ConstraintKind::ValidValues => format!(
                "The value \"{}\" of property \"{}\" is not valid. Expected a value from \"{}\".",
                value, name, op
            ),
            ConstraintKind::Length => format!(
                "Length of value \"{}\" of property \"{}\" must be equal to \"{}\".",
                value, name, op
            ),
            ConstraintKind::MinLength => format!(
                "Length of value \"{}\" of property \"{}\" must be at least \"{}\".",
                value, name, op
            ),
            ConstraintKind::MaxLength => format!(
                "Length of value \"{}\" of property \"{}\" must be no greater than \"{}\".",
                value, name, op
            ),
            ConstraintKind::Pattern => format!(
                "The value \"{}\" of property \"{}\" does not match pattern \"{}\".",
                value, name, op
            ),
            ConstraintKind::Schema => format!(
                "The value \"{}\" of property \"{}\" does not conform to schema \"{}\".",
                value, name, op
            ),
        }
    }
}

/// Numeric equality across integers and floats, structural otherwise
fn values_equal(a: &RawValue, b: &RawValue) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn compare(value: &RawValue, operand: &RawValue, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (value.as_f64(), operand.as_f64()) {
        (Some(v), Some(o)) => cmp(v, o),
        _ => false,
    }
}

/// `[low, high]`, where `high` may be `UNBOUNDED`
fn range_bounds(operand: &RawValue) -> Option<(f64, f64)> {
    match operand.as_sequence()? {
        [low, high] => {
            let low = low.as_f64()?;
            let high = match high.as_str() {
                Some(UNBOUNDED) => f64::INFINITY,
                _ => high.as_f64()?,
            };
            Some((low, high))
        }
        _ => None,
    }
}

/// Length of a string (in characters) or a map; lists only when `with_lists`
fn sized_len(value: &RawValue, with_lists: bool) -> Option<usize> {
    match value {
        RawValue::Scalar(crate::value::Scalar::String(s)) => Some(s.chars().count()),
        RawValue::Mapping(m) => Some(m.len()),
        RawValue::Sequence(items) if with_lists => Some(items.len()),
        _ => None,
    }
}

fn full_match(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", pattern))
}
