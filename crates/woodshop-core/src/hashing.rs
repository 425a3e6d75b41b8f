// crates/woodshop-core/src/hashing.rs
// ============================================================================
// Module: Woodshop Input Hashing
// Description: Canonical SHA-256 fingerprints of tool payloads.
// Purpose: Provide the `inputs_hash` every call records and derived ids.
// Dependencies: serde, serde_jcs, sha2, thiserror
// ============================================================================

//! ## Overview
//! A payload is fingerprinted by serializing it as RFC 8785 (JCS) JSON and
//! taking the lowercase hex SHA-256 of those bytes. Key order and whitespace
//! never change a fingerprint, so a reordered request maps to the same
//! `inputs_hash` and the same `proj_…` id.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write;

use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// The payload could not be rendered as canonical JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to canonicalize json: {0}")]
pub struct HashError(String);

// ============================================================================
// SECTION: Fingerprints
// ============================================================================

/// Returns the hex SHA-256 of a payload's canonical JSON form.
///
/// # Errors
///
/// Returns [`HashError`] when the payload cannot be serialized, for example a
/// map with non-string keys.
pub fn canonical_hash<T: Serialize + ?Sized>(payload: &T) -> Result<String, HashError> {
    let canonical = serde_jcs::to_vec(payload).map_err(|err| HashError(err.to_string()))?;
    Ok(sha256_hex(&canonical))
}

/// Returns the lowercase hex SHA-256 of raw bytes.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes).iter().fold(String::with_capacity(64), |mut hex, byte| {
        let _ = write!(hex, "{byte:02x}");
        hex
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
