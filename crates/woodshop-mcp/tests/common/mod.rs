// crates/woodshop-mcp/tests/common/mod.rs
// ============================================================================
// Module: MCP Test Helpers
// Description: Shared catalog, router, and fixture helpers.
// Purpose: Keep integration tests focused on behavior.
// Dependencies: woodshop-core, woodshop-mcp, serde_json
// ============================================================================

#![allow(dead_code, reason = "Helpers are shared across multiple integration tests.")]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use woodshop_core::NoopObserver;
use woodshop_core::PipelineObserver;
use woodshop_core::ProcessMetadata;
use woodshop_core::ToolCatalog;
use woodshop_mcp::ToolRouter;
use woodshop_mcp::builtin_catalog;

/// Revision id stamped by test catalogs.
pub const TEST_REVISION: &str = "rev-integration";

/// Builds the built-in catalog with fixed metadata.
pub fn catalog() -> Result<ToolCatalog, String> {
    let versions = BTreeMap::from([("wood".to_string(), "0.0.0".to_string())]);
    let metadata = ProcessMetadata::new(versions, TEST_REVISION).shared();
    let observer: Arc<dyn PipelineObserver> = Arc::new(NoopObserver);
    builtin_catalog(&metadata, &observer).map_err(|err| err.to_string())
}

/// Builds a router over the built-in catalog.
pub fn router() -> Result<ToolRouter, String> {
    catalog().map(ToolRouter::new)
}

/// Directory holding contract fixtures.
pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

/// A fixture file parsed from its name.
#[derive(Debug)]
pub struct Fixture {
    /// Tool name.
    pub tool: String,
    /// `input` or `output`.
    pub role: String,
    /// Whether the payload should validate.
    pub valid: bool,
    /// File name, for messages.
    pub file: String,
    /// Parsed payload.
    pub payload: Value,
}

/// Loads every `<tool>.<role>.<valid|invalid>[.variant].json` fixture.
pub fn fixtures() -> Result<Vec<Fixture>, String> {
    let mut entries: Vec<PathBuf> = fs::read_dir(fixtures_dir())
        .map_err(|err| err.to_string())?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    entries.sort();
    entries.iter().map(|path| load_fixture(path)).collect()
}

fn load_fixture(path: &Path) -> Result<Fixture, String> {
    let file = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| format!("unreadable fixture name: {}", path.display()))?
        .to_string();
    let parts: Vec<&str> = file.trim_end_matches(".json").split('.').collect();
    let [tool, role, verdict, ..] = parts.as_slice() else {
        return Err(format!("fixture name has too few segments: {file}"));
    };
    let valid = match *verdict {
        "valid" => true,
        "invalid" => false,
        other => return Err(format!("fixture {file} has unknown verdict {other}")),
    };
    let text = fs::read_to_string(path).map_err(|err| err.to_string())?;
    let payload = serde_json::from_str(&text).map_err(|err| format!("{file}: {err}"))?;
    Ok(Fixture {
        tool: (*tool).to_string(),
        role: (*role).to_string(),
        valid,
        file,
        payload,
    })
}

/// Removes root identity keywords the oracle engine would treat as base URIs.
pub fn strip_identity(schema: &Value) -> Value {
    let mut schema = schema.clone();
    if let Some(map) = schema.as_object_mut() {
        map.remove("$id");
        map.remove("$schema");
    }
    schema
}
