// crates/woodshop-schema/src/lib.rs
// ============================================================================
// Module: Woodshop Schema Library
// Description: JSON Schema resolution and compilation into value validators.
// Purpose: Turn tool schema documents into reference-free validators.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Tool contracts are authored as JSON Schema documents that may reference
//! each other through `$ref` and compose through `allOf`. This crate loads
//! those documents into a [`SchemaDocuments`] store, expands them into
//! reference-free [`ResolvedSchema`] trees with [`SchemaResolver`], and
//! compiles the result into a [`CompiledValidator`] that checks JSON values,
//! fills declared defaults, and reports path-addressed [`Issue`]s.
//!
//! Resolution and compilation happen once at startup; validation is pure and
//! safe to share across threads.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod compiler;
pub mod documents;
pub mod error;
pub mod issue;
pub mod node;
pub mod reference;
pub mod resolver;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use compiler::CompiledValidator;
pub use documents::SchemaDocuments;
pub use error::SchemaError;
pub use issue::Issue;
pub use issue::IssuePath;
pub use node::AdditionalProperties;
pub use node::ArraySchema;
pub use node::NumericBounds;
pub use node::ObjectSchema;
pub use node::SchemaKind;
pub use node::SchemaNode;
pub use node::StringBounds;
pub use reference::SchemaReference;
pub use resolver::ResolvedSchema;
pub use resolver::SchemaResolver;
