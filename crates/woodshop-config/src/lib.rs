// crates/woodshop-config/src/lib.rs
// ============================================================================
// Module: Woodshop Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for woodshop.toml semantics.
// Dependencies: serde, thiserror, toml
// ============================================================================

//! ## Overview
//! `woodshop-config` defines the configuration model for the Woodshop server:
//! transport selection, the pipeline event sink, and provenance overrides.
//! Loading is fail-closed; anything that does not validate is an error.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
