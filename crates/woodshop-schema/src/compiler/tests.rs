// crates/woodshop-schema/src/compiler/tests.rs
// ============================================================================
// Module: Schema Compiler Unit Tests
// Description: Unit tests for compiled checks, defaults, and issue reporting.
// Purpose: Pin accept/reject behavior and issue wording.
// Dependencies: woodshop-schema, serde_json
// ============================================================================

//! ## Overview
//! Schemas are resolved from an in-memory document and compiled; tests then
//! assert on validated values and issue lists.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions favor direct unwraps for clarity."
)]

use serde_json::Value;
use serde_json::json;

use super::*;
use crate::SchemaDocuments;
use crate::SchemaResolver;

/// Resolves and compiles a schema without the object requirement.
fn compile(schema: Value) -> CompiledValidator {
    let documents = SchemaDocuments::new().with("test.json", schema).unwrap();
    let resolved = SchemaResolver::new(documents).resolve_document("test.json").unwrap();
    CompiledValidator::compile(&resolved).unwrap()
}

/// Returns `(path, message)` pairs for a rejected value.
fn issues(validator: &CompiledValidator, value: &Value) -> Vec<(String, String)> {
    validator
        .validate(value)
        .expect_err("value should be rejected")
        .into_iter()
        .map(|issue| (issue.path, issue.message))
        .collect()
}

#[test]
fn seed_scenario_reports_missing_and_bounds() {
    let validator = compile(json!({
        "type": "object",
        "required": ["seed"],
        "properties": {"seed": {"type": "integer", "minimum": 0}}
    }));
    assert_eq!(issues(&validator, &json!({})), vec![("seed".into(), "Required".into())]);
    assert_eq!(
        issues(&validator, &json!({"seed": -1})),
        vec![("seed".into(), "Number must be greater than or equal to 0".into())]
    );
    assert_eq!(validator.validate(&json!({"seed": 3})).unwrap(), json!({"seed": 3}));
}

#[test]
fn integer_rejects_fractions_and_accepts_whole_floats() {
    let validator = compile(json!({"type": "integer"}));
    assert_eq!(issues(&validator, &json!(1.5)), vec![(String::new(), "Expected integer, received float".into())]);
    assert!(validator.validate(&json!(2.0)).is_ok());
    assert_eq!(
        issues(&validator, &json!("2")),
        vec![(String::new(), "Expected number, received string".into())]
    );
}

#[test]
fn string_length_counts_utf16_units() {
    let validator = compile(json!({"type": "string", "minLength": 2, "maxLength": 3}));
    assert!(validator.validate(&json!("ab")).is_ok());
    assert!(validator.validate(&json!("\u{1F332}")).is_ok());
    assert_eq!(
        issues(&validator, &json!("a")),
        vec![(String::new(), "String must contain at least 2 character(s)".into())]
    );
    assert_eq!(
        issues(&validator, &json!("abcd")),
        vec![(String::new(), "String must contain at most 3 character(s)".into())]
    );
}

#[test]
fn defaults_fill_absent_fields() {
    let validator = compile(json!({
        "type": "object",
        "required": ["units"],
        "properties": {
            "units": {"type": "string", "enum": ["mm", "in"], "default": "mm"},
            "seed": {"type": "integer", "default": 0},
            "note": {"type": "string"}
        }
    }));
    let validated = validator.validate(&json!({})).unwrap();
    assert_eq!(validated, json!({"units": "mm", "seed": 0}));
}

#[test]
fn invalid_default_is_reported_at_field() {
    let validator = compile(json!({
        "properties": {"count": {"type": "integer", "minimum": 1, "default": 0}}
    }));
    assert_eq!(
        issues(&validator, &json!({})),
        vec![("count".into(), "Number must be greater than or equal to 1".into())]
    );
}

#[test]
fn additional_properties_policies() {
    let strict = compile(json!({
        "additionalProperties": false,
        "properties": {"a": {"type": "string"}}
    }));
    assert_eq!(
        issues(&strict, &json!({"a": "x", "b": 1, "c": 2})),
        vec![(String::new(), "Unrecognized key(s) in object: 'b', 'c'".into())]
    );

    let typed = compile(json!({"additionalProperties": {"type": "number"}}));
    assert!(typed.validate(&json!({"x": 1.5})).is_ok());
    assert_eq!(
        issues(&typed, &json!({"x": "no"})),
        vec![("x".into(), "Expected number, received string".into())]
    );

    let open = compile(json!({"properties": {"a": {"type": "string"}}}));
    assert_eq!(open.validate(&json!({"a": "x", "extra": [1]})).unwrap(), json!({"a": "x"}));
    let allowed = compile(json!({
        "additionalProperties": true,
        "properties": {"a": {"type": "integer"}}
    }));
    assert_eq!(allowed.validate(&json!({"a": 1, "b": {"c": 2}})).unwrap(), json!({"a": 1}));
    assert_eq!(typed.validate(&json!({"x": 1.5})).unwrap(), json!({"x": 1.5}));
}

#[test]
fn nested_paths_include_array_indices() {
    let validator = compile(json!({
        "properties": {
            "parts": {
                "type": "array",
                "items": {
                    "required": ["species"],
                    "properties": {"species": {"type": "string"}}
                }
            }
        }
    }));
    assert_eq!(
        issues(&validator, &json!({"parts": [{"species": "oak"}, {"species": 4}, {}]})),
        vec![
            ("parts.1.species".into(), "Expected string, received number".into()),
            ("parts.2.species".into(), "Required".into()),
        ]
    );
}

#[test]
fn array_bounds() {
    let validator = compile(json!({"type": "array", "minItems": 1, "maxItems": 2}));
    assert!(validator.validate(&json!([null, "anything"])).is_ok());
    assert_eq!(
        issues(&validator, &json!([])),
        vec![(String::new(), "Array must contain at least 1 element(s)".into())]
    );
    assert_eq!(
        issues(&validator, &json!([1, 2, 3])),
        vec![(String::new(), "Array must contain at most 2 element(s)".into())]
    );
}

#[test]
fn enum_and_literal_messages() {
    let single = compile(json!({"enum": ["proj"]}));
    assert_eq!(
        issues(&single, &json!("other")),
        vec![(String::new(), "Invalid literal value, expected 'proj'".into())]
    );
    let many = compile(json!({"enum": ["mm", "in"]}));
    assert_eq!(
        issues(&many, &json!("cm")),
        vec![(String::new(), "Invalid enum value. Expected 'mm' | 'in', received 'cm'".into())]
    );
    let numeric = compile(json!({"enum": [1, 2]}));
    assert!(numeric.validate(&json!(1.0)).is_ok());
}

#[test]
fn union_accepts_any_branch_and_default_applies_to_whole() {
    let validator = compile(json!({
        "properties": {"template": {"type": ["string", "null"], "default": null}}
    }));
    assert_eq!(validator.validate(&json!({})).unwrap(), json!({"template": null}));
    assert!(validator.validate(&json!({"template": "cabinet"})).is_ok());
    assert_eq!(
        issues(&validator, &json!({"template": 3})),
        vec![("template".into(), "Invalid input".into())]
    );
}

#[test]
fn union_reports_the_only_branch_of_matching_type() {
    let validator = compile(json!({"type": ["string", "null"], "minLength": 3}));
    assert_eq!(
        issues(&validator, &json!("ab")),
        vec![(String::new(), "String must contain at least 3 character(s)".into())]
    );
}

#[test]
fn required_name_without_property_schema_accepts_anything() {
    let validator = compile(json!({"required": ["blob"]}));
    assert!(validator.validate(&json!({"blob": [1, {"a": null}]})).is_ok());
    assert_eq!(issues(&validator, &json!({})), vec![("blob".into(), "Required".into())]);
}

#[test]
fn compile_object_rejects_non_object_roots() {
    let documents = SchemaDocuments::new().with("list.json", json!({"type": "array"})).unwrap();
    let resolved = SchemaResolver::new(documents).resolve_document("list.json").unwrap();
    let err = CompiledValidator::compile_object(&resolved).unwrap_err();
    assert_eq!(err, SchemaError::NotAnObjectSchema("array".to_string()));
}

#[test]
fn compile_object_accepts_untyped_root() {
    let documents = SchemaDocuments::new().with("obj.json", json!({"title": "Input"})).unwrap();
    let resolved = SchemaResolver::new(documents).resolve_document("obj.json").unwrap();
    let validator = CompiledValidator::compile_object(&resolved).unwrap();
    assert!(validator.is_object());
    assert_eq!(
        issues(&validator, &json!([])),
        vec![(String::new(), "Expected object, received array".into())]
    );
}
