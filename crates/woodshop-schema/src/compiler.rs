// crates/woodshop-schema/src/compiler.rs
// ============================================================================
// Module: Schema Compiler
// Description: Compilation of resolved schemas into value validators.
// Purpose: Check tool payloads structurally and inject declared defaults.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! [`CompiledValidator`] is built once from a [`ResolvedSchema`] and then used
//! as a pure function from a JSON value to either the validated value (with
//! defaults filled in) or a non-empty list of [`Issue`]s.
//!
//! Object schemas are flattened into a per-property decision table sorted by
//! property name. Each property has exactly one presence mode:
//! - `Required`: absent values are reported as `Required`.
//! - `WithDefault`: absent values are replaced by the default, which is then
//!   validated like any supplied value. A declared default takes this mode
//!   even when the property is also listed as required.
//! - `Optional`: absent values are skipped.
//!
//! Keys not named in `properties` follow the object's unknown-key policy.
//! When `additionalProperties` is absent or `true` they are accepted but left
//! out of the validated value, so handlers and input hashes only ever see
//! declared keys. A schema-valued policy keeps them after validation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Number;
use serde_json::Value;

use crate::error::SchemaError;
use crate::issue::Issue;
use crate::issue::IssuePath;
use crate::node::AdditionalProperties;
use crate::node::NumericBounds;
use crate::node::ObjectSchema;
use crate::node::SchemaKind;
use crate::node::SchemaNode;
use crate::resolver::ResolvedSchema;

// ============================================================================
// SECTION: Compiled Model
// ============================================================================

/// Runtime validator compiled from a resolved schema.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledValidator {
    /// Root check.
    root: Check,
}

/// Compiled check for one schema position.
#[derive(Debug, Clone, PartialEq)]
enum Check {
    /// Accepts any value (a required name with no property schema).
    Any,
    /// String type plus UTF-16 length bounds.
    String {
        /// Inclusive minimum length.
        min_length: Option<u64>,
        /// Inclusive maximum length.
        max_length: Option<u64>,
    },
    /// Whole-number check plus range.
    Integer(Range),
    /// Number check plus range.
    Number(Range),
    /// Boolean type.
    Boolean,
    /// Null type.
    Null,
    /// Array type, element check, and count bounds.
    Array {
        /// Element check; `None` accepts any element.
        items: Option<Box<Check>>,
        /// Inclusive minimum element count.
        min_items: Option<u64>,
        /// Inclusive maximum element count.
        max_items: Option<u64>,
    },
    /// Object decision table.
    Object(ObjectCheck),
    /// Single-literal equality.
    Literal(Value),
    /// Membership in a literal set.
    Enum(Vec<Value>),
    /// First matching branch wins.
    Union(Vec<Check>),
}

/// Inclusive numeric range.
#[derive(Debug, Clone, Default, PartialEq)]
struct Range {
    /// Lower bound.
    minimum: Option<Bound>,
    /// Upper bound.
    maximum: Option<Bound>,
}

/// A numeric bound with its source rendering for messages.
#[derive(Debug, Clone, PartialEq)]
struct Bound {
    /// Comparison value.
    value: f64,
    /// Bound as written in the schema.
    text: String,
}

/// Flattened object validation table.
#[derive(Debug, Clone, PartialEq)]
struct ObjectCheck {
    /// Declared fields, sorted by name.
    fields: Vec<FieldRule>,
    /// Policy for undeclared keys.
    unknown: UnknownKeys,
}

/// Validation rule for one declared property.
#[derive(Debug, Clone, PartialEq)]
struct FieldRule {
    /// Property name.
    name: String,
    /// Behavior when the property is absent.
    presence: Presence,
    /// Check applied to the supplied or defaulted value.
    check: Check,
}

/// Presence mode of a declared property.
#[derive(Debug, Clone, PartialEq)]
enum Presence {
    /// Must be supplied.
    Required,
    /// Substituted when absent.
    WithDefault(Value),
    /// Skipped when absent.
    Optional,
}

/// Policy for keys not named in `properties`.
#[derive(Debug, Clone, PartialEq)]
enum UnknownKeys {
    /// Accepted and dropped from the output.
    Strip,
    /// Reported as unrecognized.
    Reject,
    /// Validated against a schema.
    Validate(Box<Check>),
}

// ============================================================================
// SECTION: Compilation
// ============================================================================

impl CompiledValidator {
    /// Compiles any resolved schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Unresolved`] if a reference or composition is
    /// encountered.
    pub fn compile(schema: &ResolvedSchema) -> Result<Self, SchemaError> {
        Ok(Self {
            root: compile_node(schema.node())?,
        })
    }

    /// Compiles a tool-level schema, which must describe an object.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::NotAnObjectSchema`] when the root is not an object
    /// schema, or any error from [`CompiledValidator::compile`].
    pub fn compile_object(schema: &ResolvedSchema) -> Result<Self, SchemaError> {
        let kind = &schema.node().kind;
        if !matches!(kind, SchemaKind::Object(_)) {
            return Err(SchemaError::NotAnObjectSchema(kind.name().to_string()));
        }
        Self::compile(schema)
    }

    /// Returns true when the root check is an object check.
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self.root, Check::Object(_))
    }

    /// Validates a value, returning it with defaults injected.
    ///
    /// # Errors
    ///
    /// Returns every [`Issue`] found; the list is never empty.
    pub fn validate(&self, value: &Value) -> Result<Value, Vec<Issue>> {
        let mut issues = Vec::new();
        let validated = apply(&self.root, value, &IssuePath::root(), &mut issues);
        if issues.is_empty() { Ok(validated) } else { Err(issues) }
    }
}

/// Compiles one node.
fn compile_node(node: &SchemaNode) -> Result<Check, SchemaError> {
    compile_kind(&node.kind)
}

/// Compiles one variant.
fn compile_kind(kind: &SchemaKind) -> Result<Check, SchemaError> {
    match kind {
        SchemaKind::String(bounds) => Ok(Check::String {
            min_length: bounds.min_length,
            max_length: bounds.max_length,
        }),
        SchemaKind::Integer(bounds) => Ok(Check::Integer(compile_range(bounds))),
        SchemaKind::Number(bounds) => Ok(Check::Number(compile_range(bounds))),
        SchemaKind::Boolean => Ok(Check::Boolean),
        SchemaKind::Null => Ok(Check::Null),
        SchemaKind::Array(array) => Ok(Check::Array {
            items: match &array.items {
                Some(items) => Some(Box::new(compile_node(items)?)),
                None => None,
            },
            min_items: array.min_items,
            max_items: array.max_items,
        }),
        SchemaKind::Object(object) => compile_object_check(object).map(Check::Object),
        SchemaKind::Enum(values) => match values.as_slice() {
            [single] => Ok(Check::Literal(single.clone())),
            _ => Ok(Check::Enum(values.clone())),
        },
        SchemaKind::Union(kinds) => {
            kinds.iter().map(compile_kind).collect::<Result<Vec<_>, _>>().map(Check::Union)
        }
        SchemaKind::Reference(_) | SchemaKind::AllOf(_) => Err(SchemaError::Unresolved(kind.name())),
    }
}

/// Builds the sorted per-property decision table.
fn compile_object_check(object: &ObjectSchema) -> Result<ObjectCheck, SchemaError> {
    let mut fields = Vec::with_capacity(object.properties.len());
    for (name, node) in &object.properties {
        let presence = match &node.default {
            Some(default) => Presence::WithDefault(default.clone()),
            None if object.required.contains(name) => Presence::Required,
            None => Presence::Optional,
        };
        fields.push(FieldRule {
            name: name.clone(),
            presence,
            check: compile_node(node)?,
        });
    }
    for name in &object.required {
        if !object.properties.contains_key(name) {
            fields.push(FieldRule {
                name: name.clone(),
                presence: Presence::Required,
                check: Check::Any,
            });
        }
    }
    fields.sort_by(|left, right| left.name.cmp(&right.name));

    let unknown = match &object.additional {
        AdditionalProperties::Unspecified | AdditionalProperties::Allow => UnknownKeys::Strip,
        AdditionalProperties::Deny => UnknownKeys::Reject,
        AdditionalProperties::Schema(schema) => {
            UnknownKeys::Validate(Box::new(compile_node(schema)?))
        }
    };
    Ok(ObjectCheck {
        fields,
        unknown,
    })
}

/// Converts schema bounds into comparable ranges.
fn compile_range(bounds: &NumericBounds) -> Range {
    let bound = |number: &Option<Number>| {
        number.as_ref().and_then(|number| {
            number.as_f64().map(|value| Bound {
                value,
                text: number.to_string(),
            })
        })
    };
    Range {
        minimum: bound(&bounds.minimum),
        maximum: bound(&bounds.maximum),
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Applies a check, recording issues and returning the validated value.
fn apply(check: &Check, value: &Value, path: &IssuePath, issues: &mut Vec<Issue>) -> Value {
    match check {
        Check::Any => value.clone(),
        Check::String {
            min_length,
            max_length,
        } => {
            let Value::String(text) = value else {
                issues.push(type_issue(path, "string", value));
                return value.clone();
            };
            let length = u64::try_from(text.encode_utf16().count()).unwrap_or(u64::MAX);
            if let Some(min) = min_length
                && length < *min
            {
                issues.push(Issue::new(
                    path,
                    format!("String must contain at least {min} character(s)"),
                ));
            }
            if let Some(max) = max_length
                && length > *max
            {
                issues.push(Issue::new(
                    path,
                    format!("String must contain at most {max} character(s)"),
                ));
            }
            value.clone()
        }
        Check::Integer(range) => {
            let Some(number) = value.as_f64() else {
                issues.push(type_issue(path, "number", value));
                return value.clone();
            };
            if !is_whole(value) {
                issues.push(Issue::new(path, "Expected integer, received float"));
                return value.clone();
            }
            check_range(range, number, path, issues);
            value.clone()
        }
        Check::Number(range) => {
            let Some(number) = value.as_f64() else {
                issues.push(type_issue(path, "number", value));
                return value.clone();
            };
            check_range(range, number, path, issues);
            value.clone()
        }
        Check::Boolean => {
            if !value.is_boolean() {
                issues.push(type_issue(path, "boolean", value));
            }
            value.clone()
        }
        Check::Null => {
            if !value.is_null() {
                issues.push(type_issue(path, "null", value));
            }
            value.clone()
        }
        Check::Array {
            items,
            min_items,
            max_items,
        } => apply_array(items.as_deref(), *min_items, *max_items, value, path, issues),
        Check::Object(object) => apply_object(object, value, path, issues),
        Check::Literal(expected) => {
            if !literal_eq(expected, value) {
                issues.push(Issue::new(
                    path,
                    format!("Invalid literal value, expected {}", render(expected)),
                ));
            }
            value.clone()
        }
        Check::Enum(options) => {
            if !options.iter().any(|option| literal_eq(option, value)) {
                let expected = options.iter().map(render).collect::<Vec<_>>().join(" | ");
                issues.push(Issue::new(
                    path,
                    format!("Invalid enum value. Expected {expected}, received {}", render(value)),
                ));
            }
            value.clone()
        }
        Check::Union(branches) => apply_union(branches, value, path, issues),
    }
}

/// Validates an array and its elements.
fn apply_array(
    items: Option<&Check>,
    min_items: Option<u64>,
    max_items: Option<u64>,
    value: &Value,
    path: &IssuePath,
    issues: &mut Vec<Issue>,
) -> Value {
    let Value::Array(elements) = value else {
        issues.push(type_issue(path, "array", value));
        return value.clone();
    };
    let count = u64::try_from(elements.len()).unwrap_or(u64::MAX);
    if let Some(min) = min_items
        && count < min
    {
        issues.push(Issue::new(path, format!("Array must contain at least {min} element(s)")));
    }
    if let Some(max) = max_items
        && count > max
    {
        issues.push(Issue::new(path, format!("Array must contain at most {max} element(s)")));
    }
    let Some(items) = items else {
        return value.clone();
    };
    let validated = elements
        .iter()
        .enumerate()
        .map(|(index, element)| apply(items, element, &path.index(index), issues))
        .collect();
    Value::Array(validated)
}

/// Validates an object against its decision table.
fn apply_object(
    object: &ObjectCheck,
    value: &Value,
    path: &IssuePath,
    issues: &mut Vec<Issue>,
) -> Value {
    let Value::Object(entries) = value else {
        issues.push(type_issue(path, "object", value));
        return value.clone();
    };
    let mut output = Map::new();
    for field in &object.fields {
        let field_path = path.key(&field.name);
        match (entries.get(&field.name), &field.presence) {
            (Some(supplied), _) => {
                output.insert(field.name.clone(), apply(&field.check, supplied, &field_path, issues));
            }
            (None, Presence::WithDefault(default)) => {
                output.insert(field.name.clone(), apply(&field.check, default, &field_path, issues));
            }
            (None, Presence::Required) => issues.push(Issue::new(&field_path, "Required")),
            (None, Presence::Optional) => {}
        }
    }

    let mut unrecognized = Vec::new();
    for (key, supplied) in entries {
        if object.fields.iter().any(|field| &field.name == key) {
            continue;
        }
        match &object.unknown {
            UnknownKeys::Strip => {}
            UnknownKeys::Reject => unrecognized.push(format!("'{key}'")),
            UnknownKeys::Validate(check) => {
                output.insert(key.clone(), apply(check, supplied, &path.key(key), issues));
            }
        }
    }
    if !unrecognized.is_empty() {
        issues.push(Issue::new(
            path,
            format!("Unrecognized key(s) in object: {}", unrecognized.join(", ")),
        ));
    }
    Value::Object(output)
}

/// Tries each branch in order; the first clean branch wins.
fn apply_union(
    branches: &[Check],
    value: &Value,
    path: &IssuePath,
    issues: &mut Vec<Issue>,
) -> Value {
    let mut typed_failures = Vec::new();
    for branch in branches {
        let mut branch_issues = Vec::new();
        let validated = apply(branch, value, path, &mut branch_issues);
        if branch_issues.is_empty() {
            return validated;
        }
        if accepts_type(branch, value) {
            typed_failures.push(branch_issues);
        }
    }
    // A single branch of the right type explains the failure better than a
    // generic union message.
    if typed_failures.len() == 1 {
        issues.extend(typed_failures.remove(0));
    } else {
        issues.push(Issue::new(path, "Invalid input"));
    }
    value.clone()
}

/// Checks inclusive numeric bounds.
fn check_range(range: &Range, number: f64, path: &IssuePath, issues: &mut Vec<Issue>) {
    if let Some(min) = &range.minimum
        && number < min.value
    {
        issues.push(Issue::new(
            path,
            format!("Number must be greater than or equal to {}", min.text),
        ));
    }
    if let Some(max) = &range.maximum
        && number > max.value
    {
        issues.push(Issue::new(path, format!("Number must be less than or equal to {}", max.text)));
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true when the value has the JSON type a check expects.
fn accepts_type(check: &Check, value: &Value) -> bool {
    match check {
        Check::Any | Check::Literal(_) | Check::Enum(_) => true,
        Check::String { .. } => value.is_string(),
        Check::Integer(_) => is_whole(value),
        Check::Number(_) => value.is_number(),
        Check::Boolean => value.is_boolean(),
        Check::Null => value.is_null(),
        Check::Array { .. } => value.is_array(),
        Check::Object(_) => value.is_object(),
        Check::Union(branches) => branches.iter().any(|branch| accepts_type(branch, value)),
    }
}

/// Returns true for JSON numbers with no fractional part.
fn is_whole(value: &Value) -> bool {
    match value {
        Value::Number(number) if number.is_i64() || number.is_u64() => true,
        Value::Number(number) => number.as_f64().is_some_and(|float| float.fract() == 0.0),
        _ => false,
    }
}

/// Compares literals, treating numerically equal numbers as equal.
#[allow(clippy::float_cmp, reason = "Literal matching is exact numeric equality.")]
fn literal_eq(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(left), Value::Number(right)) => match (left.as_f64(), right.as_f64()) {
            (Some(left), Some(right)) => left == right,
            _ => left == right,
        },
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len() && left.iter().zip(right).all(|(l, r)| literal_eq(l, r))
        }
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left.iter().all(|(key, l)| right.get(key).is_some_and(|r| literal_eq(l, r)))
        }
        _ => expected == actual,
    }
}

/// Builds the standard type mismatch issue.
fn type_issue(path: &IssuePath, expected: &str, value: &Value) -> Issue {
    Issue::new(path, format!("Expected {expected}, received {}", received(value)))
}

/// Names the JSON type of a received value.
const fn received(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Renders a literal for messages: strings single-quoted, others as JSON.
fn render(value: &Value) -> String {
    match value {
        Value::String(text) => format!("'{text}'"),
        other => other.to_string(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
