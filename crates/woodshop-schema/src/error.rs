// crates/woodshop-schema/src/error.rs
// ============================================================================
// Module: Schema Errors
// Description: Configuration errors raised while resolving or compiling schemas.
// Purpose: Fail startup closed when a tool contract cannot be built.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every error in this module is a startup-time configuration error. None of
//! them can be produced while validating a value; value problems are reported
//! as [`crate::Issue`]s instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading, resolving, or compiling schema documents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A document with the same normalized key was already registered.
    #[error("schema document already registered: {0}")]
    DuplicateDocument(String),
    /// A reference named a document that is not registered.
    #[error("unknown schema document `{document}` referenced by `{reference}`")]
    UnknownDocument {
        /// Document key taken from the reference.
        document: String,
        /// Full reference string.
        reference: String,
    },
    /// A reference pointer did not locate a value in its document.
    #[error("unresolved schema reference `{0}`")]
    UnresolvedPointer(String),
    /// A reference string or pointer was malformed.
    #[error("invalid schema reference `{reference}`: {reason}")]
    InvalidReference {
        /// Reference string as written.
        reference: String,
        /// Human-readable failure reason.
        reason: String,
    },
    /// A reference chain required its own expansion.
    #[error("cyclic schema reference `{0}`")]
    CyclicReference(String),
    /// A schema position held something other than a JSON object.
    #[error("schema at `{0}` must be a JSON object")]
    NotAnObject(String),
    /// A keyword held a value of the wrong shape.
    #[error("invalid `{keyword}` keyword: {reason}")]
    InvalidKeyword {
        /// Keyword name.
        keyword: String,
        /// Human-readable failure reason.
        reason: String,
    },
    /// A `type` keyword named a type the compiler does not support.
    #[error("unsupported schema type `{0}`")]
    UnsupportedType(String),
    /// A tool-level schema did not compile to an object validator.
    #[error("top-level schema must describe an object, found {0}")]
    NotAnObjectSchema(String),
    /// A reference or composition survived into compilation.
    #[error("schema contains an unresolved {0}")]
    Unresolved(&'static str),
}

impl SchemaError {
    /// Builds an [`SchemaError::InvalidKeyword`] for the keyword.
    pub(crate) fn keyword(keyword: &str, reason: impl Into<String>) -> Self {
        Self::InvalidKeyword {
            keyword: keyword.to_string(),
            reason: reason.into(),
        }
    }
}
