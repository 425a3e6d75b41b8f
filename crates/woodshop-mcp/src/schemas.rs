// crates/woodshop-mcp/src/schemas.rs
// ============================================================================
// Module: Built-in Schema Documents
// Description: JSON Schema documents shipped with the built-in tools.
// Purpose: Load every contract document into one store at startup.
// Dependencies: serde_json, woodshop-schema
// ============================================================================

//! ## Overview
//! The documents are compiled into the binary and keyed by file name, so
//! `./common.schema.json` references resolve against the same store the
//! tools are built from.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use woodshop_schema::SchemaDocuments;

use crate::tools::CatalogBuildError;

// ============================================================================
// SECTION: Documents
// ============================================================================

/// Shared definitions document key.
pub const COMMON_SCHEMA: &str = "common.schema.json";

/// Every built-in document as `(key, source)`.
const DOCUMENTS: &[(&str, &str)] = &[
    (COMMON_SCHEMA, include_str!("../schemas/common.schema.json")),
    (
        "create_project.input.schema.json",
        include_str!("../schemas/create_project.input.schema.json"),
    ),
    (
        "create_project.output.schema.json",
        include_str!("../schemas/create_project.output.schema.json"),
    ),
    (
        "extract_cutlist.input.schema.json",
        include_str!("../schemas/extract_cutlist.input.schema.json"),
    ),
    (
        "extract_cutlist.output.schema.json",
        include_str!("../schemas/extract_cutlist.output.schema.json"),
    ),
    (
        "nest_parts.input.schema.json",
        include_str!("../schemas/nest_parts.input.schema.json"),
    ),
    (
        "nest_parts.output.schema.json",
        include_str!("../schemas/nest_parts.output.schema.json"),
    ),
    (
        "wood_movement_check.input.schema.json",
        include_str!("../schemas/wood_movement_check.input.schema.json"),
    ),
    (
        "wood_movement_check.output.schema.json",
        include_str!("../schemas/wood_movement_check.output.schema.json"),
    ),
];

/// Returns the input document key for a tool.
#[must_use]
pub fn input_key(tool: &str) -> String {
    format!("{tool}.input.schema.json")
}

/// Returns the output document key for a tool.
#[must_use]
pub fn output_key(tool: &str) -> String {
    format!("{tool}.output.schema.json")
}

/// Parses the built-in documents into a store.
///
/// # Errors
///
/// Returns [`CatalogBuildError::Document`] when a document is not valid JSON
/// and [`CatalogBuildError::Schema`] on a repeated key.
pub fn builtin_documents() -> Result<SchemaDocuments, CatalogBuildError> {
    let mut documents = SchemaDocuments::new();
    for (key, source) in DOCUMENTS {
        let document: Value =
            serde_json::from_str(source).map_err(|err| CatalogBuildError::Document {
                key: (*key).to_string(),
                reason: err.to_string(),
            })?;
        documents.insert(key, document)?;
    }
    Ok(documents)
}
