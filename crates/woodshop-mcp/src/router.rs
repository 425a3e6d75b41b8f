// crates/woodshop-mcp/src/router.rs
// ============================================================================
// Module: Tool Router
// Description: Dispatches protocol tool requests to the catalog.
// Purpose: Give every transport one lookup and call path.
// Dependencies: serde_json, thiserror, woodshop-core
// ============================================================================

//! ## Overview
//! [`ToolRouter`] wraps a shared [`ToolCatalog`]. Unknown tool names are the
//! only router-level failure; once a tool is found, the call always yields a
//! [`CallToolResult`] envelope.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use woodshop_core::CallToolResult;
use woodshop_core::ToolCatalog;
use woodshop_core::ToolDescriptor;

use crate::manifest::RegistryManifest;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Router failures surfaced as protocol errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// No tool is registered under the name.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Shared dispatcher over the tool catalog.
#[derive(Clone)]
pub struct ToolRouter {
    /// Registered tools.
    catalog: Arc<ToolCatalog>,
}

impl ToolRouter {
    /// Creates a router over a catalog.
    #[must_use]
    pub fn new(catalog: ToolCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    /// Returns the catalog.
    #[must_use]
    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Lists tool descriptors in name order.
    #[must_use]
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.catalog.descriptors()
    }

    /// Builds the registry manifest.
    #[must_use]
    pub fn manifest(&self) -> RegistryManifest {
        RegistryManifest::from_catalog(&self.catalog)
    }

    /// Calls a tool by name.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::UnknownTool`] when no tool has the name.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<CallToolResult, RouterError> {
        let tool =
            self.catalog.get(name).ok_or_else(|| RouterError::UnknownTool(name.to_string()))?;
        Ok(tool.call(arguments).await)
    }
}
