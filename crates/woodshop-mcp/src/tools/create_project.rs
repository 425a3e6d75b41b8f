// crates/woodshop-mcp/src/tools/create_project.rs
// ============================================================================
// Module: create_project Tool
// Description: Initializes a woodworking project with deterministic defaults.
// Purpose: Derive a stable project id from units, template, and seed.
// Dependencies: async-trait, serde, serde_json, woodshop-core
// ============================================================================

//! ## Overview
//! The project id is `proj_` followed by the first twelve hex characters of
//! the canonical hash of `{units, template, seed}`; a missing template hashes
//! as `null`. Equal inputs therefore always name the same project.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use woodshop_core::ExecutionContext;
use woodshop_core::HandlerError;
use woodshop_core::SchemaSource;
use woodshop_core::ToolDefinition;
use woodshop_core::ToolHandler;
use woodshop_core::canonical_hash;
use woodshop_core::output_object;

use crate::schemas::input_key;
use crate::schemas::output_key;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Tool name.
pub const NAME: &str = "create_project";
/// Prefix of every project id.
const PROJECT_ID_PREFIX: &str = "proj_";
/// Hex characters of the hash kept in a project id.
const PROJECT_ID_HASH_CHARS: usize = 12;

/// Stock materials every new project starts with.
const DEFAULT_MATERIALS: [Material; 3] = [
    Material {
        name: "Birch Ply 18mm",
        thickness_mm: 18,
        grain: "length",
    },
    Material {
        name: "Solid Oak 20mm",
        thickness_mm: 20,
        grain: "length",
    },
    Material {
        name: "Backer Ply 6mm",
        thickness_mm: 6,
        grain: "width",
    },
];

// ============================================================================
// SECTION: Payloads
// ============================================================================

/// Validated input.
#[derive(Debug, Deserialize)]
struct CreateProjectInput {
    /// Measurement units.
    units: String,
    /// Optional starting template.
    #[serde(default)]
    template: Option<String>,
}

/// Stock material entry.
#[derive(Debug, Clone, Copy, Serialize)]
struct Material {
    /// Display name.
    name: &'static str,
    /// Sheet or board thickness.
    thickness_mm: u32,
    /// Grain direction.
    grain: &'static str,
}

/// Handler result before provenance is merged.
#[derive(Debug, Serialize)]
struct CreateProjectOutput {
    /// Derived project id.
    project_id: String,
    /// Measurement units.
    units: String,
    /// Template or `null`.
    template: Option<String>,
    /// Default materials.
    materials: Vec<Material>,
}

// ============================================================================
// SECTION: Handler
// ============================================================================

/// `create_project` business logic.
struct CreateProject;

#[async_trait]
impl ToolHandler for CreateProject {
    async fn handle(
        &self,
        input: &Value,
        context: &ExecutionContext,
    ) -> Result<Map<String, Value>, HandlerError> {
        let input: CreateProjectInput = serde_json::from_value(input.clone())?;
        let project_id = project_id(&input.units, input.template.as_deref(), context.seed())?;
        output_object(&CreateProjectOutput {
            project_id,
            units: input.units,
            template: input.template,
            materials: DEFAULT_MATERIALS.to_vec(),
        })
    }
}

/// Derives the project id.
///
/// # Errors
///
/// Returns [`HandlerError::Unexpected`] when the signature cannot be hashed.
pub fn project_id(units: &str, template: Option<&str>, seed: i64) -> Result<String, HandlerError> {
    let signature = json!({
        "units": units,
        "template": template,
        "seed": seed,
    });
    let digest = canonical_hash(&signature).map_err(HandlerError::unexpected)?;
    let prefix = digest.get(..PROJECT_ID_HASH_CHARS).unwrap_or(&digest);
    Ok(format!("{PROJECT_ID_PREFIX}{prefix}"))
}

/// Success summary.
fn summarize(output: &Value, _context: &ExecutionContext) -> String {
    let project_id = output["project_id"].as_str().unwrap_or_default();
    let units = output["units"].as_str().unwrap_or_default();
    format!("Project {project_id} created with units {units}.")
}

/// Returns the tool definition.
#[must_use]
pub fn definition() -> ToolDefinition {
    ToolDefinition::new(
        NAME,
        SchemaSource::Document(input_key(NAME)),
        SchemaSource::Document(output_key(NAME)),
        CreateProject,
    )
    .with_title("Create Project")
    .with_description("Initialize a woodworking project with deterministic defaults.")
    .with_summary(summarize)
}
