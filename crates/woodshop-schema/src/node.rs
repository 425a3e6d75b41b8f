// crates/woodshop-schema/src/node.rs
// ============================================================================
// Module: Schema Nodes
// Description: Typed representation of JSON Schema documents.
// Purpose: Replace ad hoc keyword probing with an exhaustive variant model.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! A [`SchemaNode`] is exactly one [`SchemaKind`] plus an optional default and
//! the keywords the kind does not interpret. The uninterpreted keywords
//! (including `type` itself) are kept verbatim so [`SchemaNode::to_value`]
//! reproduces an equivalent JSON document; `allOf` merging operates on that
//! JSON form.
//!
//! Variant selection, in priority order: `$ref` (siblings ignored), `allOf`
//! (siblings kept for a final merge), `enum`, then `type`. A node with no
//! `type` is an object schema.
//!
//! [`SchemaKind::Reference`] and [`SchemaKind::AllOf`] only exist before
//! resolution; see [`crate::SchemaResolver`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Map;
use serde_json::Number;
use serde_json::Value;

use crate::error::SchemaError;
use crate::reference::SchemaReference;

// ============================================================================
// SECTION: Keyword Tables
// ============================================================================

/// Keywords interpreted by string schemas.
const STRING_KEYWORDS: &[&str] = &["minLength", "maxLength"];
/// Keywords interpreted by integer and number schemas.
const NUMERIC_KEYWORDS: &[&str] = &["minimum", "maximum"];
/// Keywords interpreted by array schemas.
const ARRAY_KEYWORDS: &[&str] = &["items", "minItems", "maxItems"];
/// Keywords interpreted by object schemas.
const OBJECT_KEYWORDS: &[&str] = &["properties", "required", "additionalProperties"];

// ============================================================================
// SECTION: Node Model
// ============================================================================

/// A parsed schema node.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    /// The node's variant and variant-specific constraints.
    pub kind: SchemaKind,
    /// Value substituted when the described field is absent.
    pub default: Option<Value>,
    /// Keywords not interpreted by `kind`, preserved verbatim.
    pub keywords: Map<String, Value>,
}

/// Variant of a schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    /// `type: "string"`.
    String(StringBounds),
    /// `type: "integer"`.
    Integer(NumericBounds),
    /// `type: "number"`.
    Number(NumericBounds),
    /// `type: "boolean"`.
    Boolean,
    /// `type: "null"`.
    Null,
    /// `type: "array"`.
    Array(ArraySchema),
    /// `type: "object"` or no `type` at all.
    Object(ObjectSchema),
    /// `enum` literal set.
    Enum(Vec<Value>),
    /// `type` given as an array of type names.
    Union(Vec<SchemaKind>),
    /// `$ref` to another node.
    Reference(SchemaReference),
    /// `allOf` composition.
    AllOf(AllOfSchema),
}

/// Length bounds for string schemas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringBounds {
    /// `minLength`.
    pub min_length: Option<u64>,
    /// `maxLength`.
    pub max_length: Option<u64>,
}

/// Inclusive range bounds for numeric schemas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumericBounds {
    /// `minimum`.
    pub minimum: Option<Number>,
    /// `maximum`.
    pub maximum: Option<Number>,
}

/// Array schema constraints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArraySchema {
    /// Element schema; `None` accepts any element.
    pub items: Option<Box<SchemaNode>>,
    /// `minItems`.
    pub min_items: Option<u64>,
    /// `maxItems`.
    pub max_items: Option<u64>,
}

/// Object schema constraints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    /// Declared properties keyed by name.
    pub properties: BTreeMap<String, SchemaNode>,
    /// Required property names in declaration order, without duplicates.
    pub required: Vec<String>,
    /// Policy for keys not named in `properties`.
    pub additional: AdditionalProperties,
}

/// `additionalProperties` policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AdditionalProperties {
    /// Keyword absent.
    #[default]
    Unspecified,
    /// `additionalProperties: true`.
    Allow,
    /// `additionalProperties: false`.
    Deny,
    /// `additionalProperties: { ... }`.
    Schema(Box<SchemaNode>),
}

/// `allOf` composition awaiting resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct AllOfSchema {
    /// Branches merged left to right.
    pub branches: Vec<SchemaNode>,
    /// Keywords of the containing node, merged last.
    pub siblings: Option<Box<SchemaNode>>,
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

impl SchemaNode {
    /// Parses a JSON value into a schema node.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the value is not an object, a keyword has
    /// the wrong shape, or a `type` name is unsupported.
    pub fn parse(value: &Value) -> Result<Self, SchemaError> {
        parse_at(value, "#")
    }

    /// Returns true when no reference or composition remains in the tree.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.kind.is_resolved()
    }

    /// Serializes the node back to JSON Schema.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = self.keywords.clone();
        self.kind.write_keywords(&mut map);
        if let Some(default) = &self.default {
            map.insert("default".to_string(), default.clone());
        }
        Value::Object(map)
    }
}

/// Parses a node, using `location` in error messages.
fn parse_at(value: &Value, location: &str) -> Result<SchemaNode, SchemaError> {
    let Value::Object(source) = value else {
        return Err(SchemaError::NotAnObject(location.to_string()));
    };
    let mut keywords = source.clone();

    if let Some(reference) = keywords.get("$ref") {
        let Value::String(raw) = reference else {
            return Err(SchemaError::keyword("$ref", "must be a string"));
        };
        return Ok(SchemaNode {
            kind: SchemaKind::Reference(SchemaReference::parse(raw)?),
            default: None,
            keywords: Map::new(),
        });
    }

    if let Some(all_of) = keywords.remove("allOf") {
        let Value::Array(items) = all_of else {
            return Err(SchemaError::keyword("allOf", "must be an array"));
        };
        let branches = items
            .iter()
            .enumerate()
            .map(|(index, item)| parse_at(item, &format!("{location}/allOf/{index}")))
            .collect::<Result<Vec<_>, _>>()?;
        let siblings = if keywords.is_empty() {
            None
        } else {
            Some(Box::new(parse_at(&Value::Object(keywords), location)?))
        };
        return Ok(SchemaNode {
            kind: SchemaKind::AllOf(AllOfSchema {
                branches,
                siblings,
            }),
            default: None,
            keywords: Map::new(),
        });
    }

    let default = keywords.remove("default");

    if let Some(literals) = keywords.remove("enum") {
        let Value::Array(values) = literals else {
            return Err(SchemaError::keyword("enum", "must be an array"));
        };
        if values.is_empty() {
            return Err(SchemaError::keyword("enum", "must list at least one value"));
        }
        return Ok(SchemaNode {
            kind: SchemaKind::Enum(values),
            default,
            keywords,
        });
    }

    let names = type_names(keywords.get("type"))?;
    let mut kinds = names
        .iter()
        .map(|name| parse_kind(name, source, location))
        .collect::<Result<Vec<_>, _>>()?;
    for name in &names {
        for keyword in keywords_for(name) {
            keywords.remove(*keyword);
        }
    }
    let kind = if kinds.len() == 1 {
        kinds.remove(0)
    } else {
        SchemaKind::Union(kinds)
    };
    Ok(SchemaNode {
        kind,
        default,
        keywords,
    })
}

/// Reads the `type` keyword as a list of names (object when absent).
fn type_names(value: Option<&Value>) -> Result<Vec<String>, SchemaError> {
    match value {
        None => Ok(vec!["object".to_string()]),
        Some(Value::String(name)) => Ok(vec![name.clone()]),
        Some(Value::Array(items)) if !items.is_empty() => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| SchemaError::keyword("type", "array entries must be strings"))
            })
            .collect(),
        Some(_) => Err(SchemaError::keyword("type", "must be a string or non-empty array")),
    }
}

/// Returns the keywords a type name interprets.
fn keywords_for(name: &str) -> &'static [&'static str] {
    match name {
        "string" => STRING_KEYWORDS,
        "integer" | "number" => NUMERIC_KEYWORDS,
        "array" => ARRAY_KEYWORDS,
        "object" => OBJECT_KEYWORDS,
        _ => &[],
    }
}

/// Builds the kind for one type name from the source keywords.
fn parse_kind(
    name: &str,
    source: &Map<String, Value>,
    location: &str,
) -> Result<SchemaKind, SchemaError> {
    match name {
        "string" => Ok(SchemaKind::String(StringBounds {
            min_length: read_count(source, "minLength")?,
            max_length: read_count(source, "maxLength")?,
        })),
        "integer" => Ok(SchemaKind::Integer(read_numeric(source)?)),
        "number" => Ok(SchemaKind::Number(read_numeric(source)?)),
        "boolean" => Ok(SchemaKind::Boolean),
        "null" => Ok(SchemaKind::Null),
        "array" => {
            let items = match source.get("items") {
                Some(items) => Some(Box::new(parse_at(items, &format!("{location}/items"))?)),
                None => None,
            };
            Ok(SchemaKind::Array(ArraySchema {
                items,
                min_items: read_count(source, "minItems")?,
                max_items: read_count(source, "maxItems")?,
            }))
        }
        "object" => parse_object(source, location).map(SchemaKind::Object),
        other => Err(SchemaError::UnsupportedType(other.to_string())),
    }
}

/// Builds object constraints from the source keywords.
fn parse_object(
    source: &Map<String, Value>,
    location: &str,
) -> Result<ObjectSchema, SchemaError> {
    let mut properties = BTreeMap::new();
    match source.get("properties") {
        None => {}
        Some(Value::Object(entries)) => {
            for (name, schema) in entries {
                let node = parse_at(schema, &format!("{location}/properties/{name}"))?;
                properties.insert(name.clone(), node);
            }
        }
        Some(_) => return Err(SchemaError::keyword("properties", "must be an object")),
    }

    let mut required: Vec<String> = Vec::new();
    match source.get("required") {
        None => {}
        Some(Value::Array(names)) => {
            for name in names {
                let Some(name) = name.as_str() else {
                    return Err(SchemaError::keyword("required", "entries must be strings"));
                };
                if !required.iter().any(|existing| existing == name) {
                    required.push(name.to_string());
                }
            }
        }
        Some(_) => return Err(SchemaError::keyword("required", "must be an array")),
    }

    let additional = match source.get("additionalProperties") {
        None => AdditionalProperties::Unspecified,
        Some(Value::Bool(true)) => AdditionalProperties::Allow,
        Some(Value::Bool(false)) => AdditionalProperties::Deny,
        Some(schema @ Value::Object(_)) => AdditionalProperties::Schema(Box::new(parse_at(
            schema,
            &format!("{location}/additionalProperties"),
        )?)),
        Some(_) => {
            return Err(SchemaError::keyword(
                "additionalProperties",
                "must be a boolean or schema object",
            ));
        }
    };

    Ok(ObjectSchema {
        properties,
        required,
        additional,
    })
}

/// Reads a non-negative integer keyword.
fn read_count(source: &Map<String, Value>, keyword: &str) -> Result<Option<u64>, SchemaError> {
    match source.get(keyword) {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .map(Some)
            .ok_or_else(|| SchemaError::keyword(keyword, "must be a non-negative integer")),
    }
}

/// Reads `minimum` and `maximum`.
fn read_numeric(source: &Map<String, Value>) -> Result<NumericBounds, SchemaError> {
    let read = |keyword: &str| match source.get(keyword) {
        None => Ok(None),
        Some(Value::Number(number)) => Ok(Some(number.clone())),
        Some(_) => Err(SchemaError::keyword(keyword, "must be a number")),
    };
    Ok(NumericBounds {
        minimum: read("minimum")?,
        maximum: read("maximum")?,
    })
}

// ============================================================================
// SECTION: Serialization
// ============================================================================

impl SchemaKind {
    /// Returns a short name for diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Number(_) => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Enum(_) => "enum",
            Self::Union(_) => "union",
            Self::Reference(_) => "reference",
            Self::AllOf(_) => "allOf",
        }
    }

    /// Returns true when no reference or composition remains below this kind.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        match self {
            Self::Reference(_) | Self::AllOf(_) => false,
            Self::Array(array) => array.items.as_ref().is_none_or(|items| items.is_resolved()),
            Self::Object(object) => {
                object.properties.values().all(SchemaNode::is_resolved)
                    && match &object.additional {
                        AdditionalProperties::Schema(schema) => schema.is_resolved(),
                        _ => true,
                    }
            }
            Self::Union(kinds) => kinds.iter().all(Self::is_resolved),
            _ => true,
        }
    }

    /// Writes the keywords this kind interprets into `map`.
    fn write_keywords(&self, map: &mut Map<String, Value>) {
        match self {
            Self::String(bounds) => {
                put(map, "minLength", bounds.min_length.map(Value::from));
                put(map, "maxLength", bounds.max_length.map(Value::from));
            }
            Self::Integer(bounds) | Self::Number(bounds) => {
                put(map, "minimum", bounds.minimum.clone().map(Value::Number));
                put(map, "maximum", bounds.maximum.clone().map(Value::Number));
            }
            Self::Boolean | Self::Null => {}
            Self::Array(array) => {
                put(map, "items", array.items.as_ref().map(|items| items.to_value()));
                put(map, "minItems", array.min_items.map(Value::from));
                put(map, "maxItems", array.max_items.map(Value::from));
            }
            Self::Object(object) => {
                if !object.properties.is_empty() {
                    let properties = object
                        .properties
                        .iter()
                        .map(|(name, node)| (name.clone(), node.to_value()))
                        .collect();
                    map.insert("properties".to_string(), Value::Object(properties));
                }
                if !object.required.is_empty() {
                    let required = object.required.iter().cloned().map(Value::String).collect();
                    map.insert("required".to_string(), Value::Array(required));
                }
                let additional = match &object.additional {
                    AdditionalProperties::Unspecified => None,
                    AdditionalProperties::Allow => Some(Value::Bool(true)),
                    AdditionalProperties::Deny => Some(Value::Bool(false)),
                    AdditionalProperties::Schema(schema) => Some(schema.to_value()),
                };
                put(map, "additionalProperties", additional);
            }
            Self::Enum(values) => {
                map.insert("enum".to_string(), Value::Array(values.clone()));
            }
            Self::Union(kinds) => {
                for kind in kinds {
                    kind.write_keywords(map);
                }
            }
            Self::Reference(reference) => {
                map.insert("$ref".to_string(), Value::String(reference.as_str().to_string()));
            }
            Self::AllOf(all_of) => {
                if let Some(Value::Object(siblings)) =
                    all_of.siblings.as_ref().map(|node| node.to_value())
                {
                    map.extend(siblings);
                }
                let branches = all_of.branches.iter().map(SchemaNode::to_value).collect();
                map.insert("allOf".to_string(), Value::Array(branches));
            }
        }
    }
}

/// Inserts a keyword when a value is present.
fn put(map: &mut Map<String, Value>, keyword: &str, value: Option<Value>) {
    if let Some(value) = value {
        map.insert(keyword.to_string(), value);
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
