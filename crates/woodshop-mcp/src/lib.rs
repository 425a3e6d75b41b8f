// crates/woodshop-mcp/src/lib.rs
// ============================================================================
// Module: Woodshop MCP Library
// Description: Built-in woodworking tools served over JSON-RPC.
// Purpose: Wire configuration, provenance discovery, and the tool catalog into
// stdio and HTTP transports.
// Dependencies: axum, serde, serde_json, time, tokio, woodshop-config,
// woodshop-core, woodshop-schema
// ============================================================================

//! ## Overview
//! [`McpServer::from_config`] validates configuration, discovers process
//! metadata, selects the pipeline observer, and builds the built-in catalog.
//! Every request then goes through [`ToolRouter`], which never bypasses the
//! validated pipeline.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod logging;
pub mod manifest;
pub mod metadata;
pub mod router;
pub mod schemas;
pub mod server;
pub mod tools;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use manifest::RegistryManifest;
pub use router::RouterError;
pub use router::ToolRouter;
pub use server::JsonRpcError;
pub use server::JsonRpcResponse;
pub use server::McpServer;
pub use server::McpServerError;
pub use tools::CatalogBuildError;
pub use tools::builtin_catalog;
