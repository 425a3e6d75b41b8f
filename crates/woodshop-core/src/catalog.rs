// crates/woodshop-core/src/catalog.rs
// ============================================================================
// Module: Tool Catalog
// Description: Name-keyed set of validated tools.
// Purpose: Provide the host seam tools register with and are looked up from.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`ToolHost`] is what [`ValidatedTool::register`] attaches to. The
//! in-process [`ToolCatalog`] is the default host: tools are unique by name
//! and listed in name order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use thiserror::Error;

use crate::pipeline::ToolDescriptor;
use crate::pipeline::ValidatedTool;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Catalog registration failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// A tool with this name is already registered.
    #[error("tool `{0}` is already registered")]
    Duplicate(String),
}

// ============================================================================
// SECTION: Host Trait
// ============================================================================

/// Anything a validated tool can be registered with.
pub trait ToolHost {
    /// Attaches a tool under its name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Duplicate`] when the name is taken.
    fn attach(&mut self, tool: Arc<ValidatedTool>) -> Result<(), CatalogError>;
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// In-process tool registry.
#[derive(Default)]
pub struct ToolCatalog {
    /// Tools keyed by name.
    tools: BTreeMap<String, Arc<ValidatedTool>>,
}

impl ToolCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<ValidatedTool>> {
        self.tools.get(name).cloned()
    }

    /// Iterates tools in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ValidatedTool>> {
        self.tools.values()
    }

    /// Returns tool names in order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Returns listing entries in name order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(|tool| tool.descriptor()).collect()
    }

    /// Returns the number of tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns true when no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl ToolHost for ToolCatalog {
    fn attach(&mut self, tool: Arc<ValidatedTool>) -> Result<(), CatalogError> {
        match self.tools.entry(tool.name().to_string()) {
            Entry::Occupied(entry) => Err(CatalogError::Duplicate(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(tool);
                Ok(())
            }
        }
    }
}
