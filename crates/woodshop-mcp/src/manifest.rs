// crates/woodshop-mcp/src/manifest.rs
// ============================================================================
// Module: Registry Manifest
// Description: Machine-readable listing of registered tools and schema ids.
// Purpose: Let clients and CI discover which contracts a build ships.
// Dependencies: serde, time, woodshop-core
// ============================================================================

//! ## Overview
//! The manifest names every tool in the catalog with the `$id` of its input
//! and output schema (or `null` when a schema has none), plus a `schemas`
//! index sorted by tool name. `generated_at` is an RFC 3339 UTC timestamp.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use woodshop_core::ToolCatalog;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Server name reported in the manifest and `initialize`.
pub const SERVER_NAME: &str = "woodshop-mcp";
/// Server version reported in the manifest and `initialize`.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Registry manifest document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryManifest {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
    /// Generation time (RFC 3339).
    pub generated_at: String,
    /// One entry per tool, in name order.
    pub tools: Vec<ManifestTool>,
    /// Schema ids per tool, in name order.
    pub schemas: Vec<ManifestSchemas>,
}

/// Tool entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestTool {
    /// Tool name.
    pub name: String,
    /// Display title.
    pub title: String,
    /// Display description.
    pub description: String,
    /// Input schema `$id`.
    pub input_schema: Option<String>,
    /// Output schema `$id`.
    pub output_schema: Option<String>,
}

/// Schema index entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSchemas {
    /// Tool name.
    pub name: String,
    /// Input schema `$id`.
    pub input_id: Option<String>,
    /// Output schema `$id`.
    pub output_id: Option<String>,
}

// ============================================================================
// SECTION: Builder
// ============================================================================

impl RegistryManifest {
    /// Builds the manifest for a catalog, stamped with the current time.
    #[must_use]
    pub fn from_catalog(catalog: &ToolCatalog) -> Self {
        let generated_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| OffsetDateTime::UNIX_EPOCH.to_string());
        Self::with_timestamp(catalog, generated_at)
    }

    /// Builds the manifest with a fixed timestamp.
    #[must_use]
    pub fn with_timestamp(catalog: &ToolCatalog, generated_at: String) -> Self {
        let tools: Vec<ManifestTool> = catalog
            .iter()
            .map(|tool| ManifestTool {
                name: tool.name().to_string(),
                title: tool.title().to_string(),
                description: tool.description().to_string(),
                input_schema: schema_id(tool.input_schema()),
                output_schema: schema_id(tool.output_schema()),
            })
            .collect();
        let schemas = tools
            .iter()
            .map(|tool| ManifestSchemas {
                name: tool.name.clone(),
                input_id: tool.input_schema.clone(),
                output_id: tool.output_schema.clone(),
            })
            .collect();
        Self {
            name: SERVER_NAME.to_string(),
            version: SERVER_VERSION.to_string(),
            generated_at,
            tools,
            schemas,
        }
    }
}

/// Reads a schema's `$id`.
fn schema_id(schema: &Value) -> Option<String> {
    schema.get("$id").and_then(Value::as_str).map(str::to_string)
}
