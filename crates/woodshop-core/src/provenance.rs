// crates/woodshop-core/src/provenance.rs
// ============================================================================
// Module: Provenance Context
// Description: Process metadata and per-call execution context.
// Purpose: Give every handler a deterministic seed and input hash.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! [`ProcessMetadata`] is computed once at startup (engine versions and the
//! source revision) and shared by `Arc`. [`ExecutionContext`] is built fresh
//! for each call from the validated input and that shared metadata; it is
//! never mutated afterwards.
//!
//! The seed is `input.seed` when it is a number, else `0`. Provenance echoes
//! that number exactly as supplied; handlers read it through
//! [`ExecutionContext::seed`], which truncates fractions toward zero. The
//! input hash covers the entire validated input.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Number;
use serde_json::Value;

use crate::hashing::HashError;
use crate::hashing::canonical_hash;

// ============================================================================
// SECTION: Process Metadata
// ============================================================================

/// Frozen process-wide provenance inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessMetadata {
    /// Engine name to version.
    engine_versions: BTreeMap<String, String>,
    /// Source revision identifier.
    revision_id: String,
}

impl ProcessMetadata {
    /// Creates process metadata.
    #[must_use]
    pub fn new(engine_versions: BTreeMap<String, String>, revision_id: impl Into<String>) -> Self {
        Self {
            engine_versions,
            revision_id: revision_id.into(),
        }
    }

    /// Returns the engine version map.
    #[must_use]
    pub const fn engine_versions(&self) -> &BTreeMap<String, String> {
        &self.engine_versions
    }

    /// Returns the revision identifier.
    #[must_use]
    pub fn revision_id(&self) -> &str {
        &self.revision_id
    }

    /// Freezes the metadata for sharing.
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

// ============================================================================
// SECTION: Execution Context
// ============================================================================

/// Per-call provenance context handed to handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionContext {
    /// Seed as an integer for handlers.
    seed: i64,
    /// Seed exactly as supplied, for provenance.
    seed_number: Number,
    /// Hex SHA-256 of the canonical input.
    inputs_hash: String,
    /// Shared process metadata.
    metadata: Arc<ProcessMetadata>,
    /// Validated input.
    input: Value,
}

impl ExecutionContext {
    /// Builds the context for a validated input.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when the input cannot be canonicalized.
    pub fn build(input: Value, metadata: Arc<ProcessMetadata>) -> Result<Self, HashError> {
        let inputs_hash = canonical_hash(&input)?;
        let seed_number = match input.get("seed") {
            Some(Value::Number(number)) => number.clone(),
            _ => Number::from(0),
        };
        Ok(Self {
            seed: integer_seed(&seed_number),
            seed_number,
            inputs_hash,
            metadata,
            input,
        })
    }

    /// Returns the seed, truncated toward zero when fractional.
    #[must_use]
    pub const fn seed(&self) -> i64 {
        self.seed
    }

    /// Returns the canonical input hash.
    #[must_use]
    pub fn inputs_hash(&self) -> &str {
        &self.inputs_hash
    }

    /// Returns the engine version map.
    #[must_use]
    pub fn engine_versions(&self) -> &BTreeMap<String, String> {
        self.metadata.engine_versions()
    }

    /// Returns the revision identifier.
    #[must_use]
    pub fn revision_id(&self) -> &str {
        self.metadata.revision_id()
    }

    /// Returns the validated input.
    #[must_use]
    pub const fn input(&self) -> &Value {
        &self.input
    }

    /// Returns the provenance fields attached to every output.
    #[must_use]
    pub fn provenance(&self) -> Provenance {
        Provenance {
            seed: self.seed_number.clone(),
            engine_versions: self.engine_versions().clone(),
            revision_id: self.revision_id().to_string(),
            inputs_hash: self.inputs_hash.clone(),
        }
    }
}

/// Converts the supplied seed to the integer handlers use.
#[allow(
    clippy::cast_possible_truncation,
    reason = "Fractional seeds truncate toward zero and saturate at the i64 range."
)]
fn integer_seed(number: &Number) -> i64 {
    if let Some(seed) = number.as_i64() {
        return seed;
    }
    if number.is_u64() {
        return i64::MAX;
    }
    match number.as_f64() {
        Some(seed) if seed.is_finite() => seed.trunc() as i64,
        _ => 0,
    }
}

// ============================================================================
// SECTION: Provenance Fields
// ============================================================================

/// Provenance fields merged into every tool output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Seed as supplied to the call.
    pub seed: Number,
    /// Engine versions in effect.
    pub engine_versions: BTreeMap<String, String>,
    /// Source revision.
    pub revision_id: String,
    /// Canonical input hash.
    pub inputs_hash: String,
}

impl Provenance {
    /// Returns the fields as a JSON map.
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        let engine_versions = self
            .engine_versions
            .iter()
            .map(|(name, version)| (name.clone(), Value::String(version.clone())))
            .collect();
        let mut map = Map::new();
        map.insert("seed".to_string(), Value::Number(self.seed.clone()));
        map.insert("engine_versions".to_string(), Value::Object(engine_versions));
        map.insert("revision_id".to_string(), Value::String(self.revision_id.clone()));
        map.insert("inputs_hash".to_string(), Value::String(self.inputs_hash.clone()));
        map
    }
}

/// Shallow-merges provenance into a handler result; provenance keys win.
#[must_use]
pub fn attach_provenance(mut output: Map<String, Value>, context: &ExecutionContext) -> Value {
    output.extend(context.provenance().to_map());
    Value::Object(output)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
