// crates/woodshop-core/src/lib.rs
// ============================================================================
// Module: Woodshop Core Library
// Description: Validated tool execution pipeline and its supporting types.
// Purpose: Wrap tool handlers with contracts, provenance, and error taxonomy.
// Dependencies: async-trait, serde, serde_jcs, serde_json, sha2, thiserror, tokio
// ============================================================================

//! ## Overview
//! A tool is declared once as a [`ToolDefinition`] and turned into a
//! [`ValidatedTool`] at startup. Every call then runs the same fixed sequence:
//! input validation, [`ExecutionContext`] construction, the handler, the
//! provenance merge, and output validation. Failures at any stage become a
//! [`ToolError`] whose `code` classifies where the call failed.
//!
//! Two surfaces share that sequence: [`ValidatedTool::run`] returns the
//! validated output or the error, and [`ValidatedTool::call`] always returns
//! a protocol envelope ([`CallToolResult`]).
//!
//! Process-wide inputs ([`ProcessMetadata`]) are frozen before the first tool
//! is built and shared by reference; nothing in a call mutates shared state.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod catalog;
pub mod error;
pub mod hashing;
pub mod observe;
pub mod pipeline;
pub mod provenance;
pub mod tool;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use catalog::CatalogError;
pub use catalog::ToolCatalog;
pub use catalog::ToolHost;
pub use error::ErrorClass;
pub use error::HandlerError;
pub use error::ToolError;
pub use error::codes;
pub use hashing::HashError;
pub use hashing::canonical_hash;
pub use hashing::sha256_hex;
pub use observe::FileObserver;
pub use observe::NoopObserver;
pub use observe::PipelineEvent;
pub use observe::PipelineObserver;
pub use observe::PipelineStage;
pub use observe::StageOutcome;
pub use observe::StderrObserver;
pub use pipeline::CallToolResult;
pub use pipeline::RegistrationError;
pub use pipeline::ToolContent;
pub use pipeline::ToolDescriptor;
pub use pipeline::ValidatedTool;
pub use provenance::ExecutionContext;
pub use provenance::ProcessMetadata;
pub use provenance::Provenance;
pub use provenance::attach_provenance;
pub use tool::FnHandler;
pub use tool::SchemaSource;
pub use tool::Summarizer;
pub use tool::ToolDefinition;
pub use tool::ToolHandler;
pub use tool::handler_fn;
pub use tool::output_object;
