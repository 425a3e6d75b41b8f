// crates/woodshop-mcp/src/tools.rs
// ============================================================================
// Module: Built-in Tools
// Description: Woodshop tool definitions and the catalog they are built into.
// Purpose: Assemble every built-in tool behind the validated pipeline.
// Dependencies: thiserror, woodshop-core, woodshop-schema
// ============================================================================

//! ## Overview
//! Each built-in tool lives in its own submodule and exposes a
//! [`ToolDefinition`]. [`builtin_catalog`] resolves the shipped schema
//! documents once and builds every definition against them, so all tools share
//! one resolver cache and one set of process metadata.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;
use woodshop_core::CatalogError;
use woodshop_core::PipelineObserver;
use woodshop_core::ProcessMetadata;
use woodshop_core::RegistrationError;
use woodshop_core::ToolCatalog;
use woodshop_core::ToolDefinition;
use woodshop_core::ValidatedTool;
use woodshop_schema::SchemaError;
use woodshop_schema::SchemaResolver;

use crate::schemas::builtin_documents;

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod create_project;
pub mod extract_cutlist;
pub mod nest_parts;
pub mod wood_movement;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failures while assembling the built-in catalog.
#[derive(Debug, Error)]
pub enum CatalogBuildError {
    /// A shipped schema document is not valid JSON.
    #[error("schema document `{key}` is not valid json: {reason}")]
    Document {
        /// Document key.
        key: String,
        /// Parse failure.
        reason: String,
    },
    /// Document store rejected a document.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// A tool failed to build.
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    /// Two tools share a name.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

// ============================================================================
// SECTION: Catalog Assembly
// ============================================================================

/// Returns every built-in tool definition.
#[must_use]
pub fn builtin_definitions() -> Vec<ToolDefinition> {
    vec![
        create_project::definition(),
        extract_cutlist::definition(),
        nest_parts::definition(),
        wood_movement::definition(),
    ]
}

/// Builds the built-in tools into a catalog.
///
/// # Errors
///
/// Returns [`CatalogBuildError`] when a schema fails to load or resolve, or a
/// tool fails to register.
pub fn builtin_catalog(
    metadata: &Arc<ProcessMetadata>,
    observer: &Arc<dyn PipelineObserver>,
) -> Result<ToolCatalog, CatalogBuildError> {
    let mut resolver = SchemaResolver::new(builtin_documents()?);
    let mut catalog = ToolCatalog::new();
    for definition in builtin_definitions() {
        let tool = ValidatedTool::build(
            definition,
            &mut resolver,
            Arc::clone(metadata),
            Arc::clone(observer),
        )?;
        Arc::new(tool).register(&mut catalog)?;
    }
    Ok(catalog)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
