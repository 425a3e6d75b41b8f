// crates/woodshop-schema/src/reference.rs
// ============================================================================
// Module: Schema References
// Description: Parsing of `$ref` strings into document keys and JSON pointers.
// Purpose: Address schema fragments within and across documents.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! A reference has the form `[document]#[pointer]`. The document part is a
//! relative key into [`crate::SchemaDocuments`]; when it is empty the
//! reference targets the document it appears in. The pointer is an
//! RFC 6901 JSON pointer: `/`-separated tokens where `~1` decodes to `/` and
//! `~0` decodes to `~`. An empty pointer addresses the whole document.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::documents::normalize_key;
use crate::error::SchemaError;

// ============================================================================
// SECTION: Schema Reference
// ============================================================================

/// Parsed `$ref` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaReference {
    /// Reference string as written.
    raw: String,
    /// Normalized document key, or `None` for same-document references.
    document: Option<String>,
    /// Pointer text after `#` (without the `#`).
    pointer: String,
    /// Decoded pointer tokens.
    tokens: Vec<String>,
}

impl SchemaReference {
    /// Parses a reference string.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidReference`] when the pointer does not start
    /// with `/` or contains an invalid `~` escape.
    pub fn parse(raw: &str) -> Result<Self, SchemaError> {
        let (document, pointer) = match raw.split_once('#') {
            Some((document, pointer)) => (document, pointer),
            None => (raw, ""),
        };
        let document = if document.is_empty() { None } else { Some(normalize_key(document)) };
        let tokens = decode_pointer(raw, pointer)?;
        Ok(Self {
            raw: raw.to_string(),
            document,
            pointer: pointer.to_string(),
            tokens,
        })
    }

    /// Returns the reference string as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the target document key, falling back to `current`.
    #[must_use]
    pub fn document_or<'a>(&'a self, current: &'a str) -> &'a str {
        self.document.as_deref().unwrap_or(current)
    }

    /// Returns the raw pointer text.
    #[must_use]
    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    /// Returns the decoded pointer tokens.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Walks the pointer through a document.
    #[must_use]
    pub fn locate<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        let mut current = document;
        for token in &self.tokens {
            current = match current {
                Value::Object(map) => map.get(token)?,
                Value::Array(items) => items.get(parse_index(token)?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Splits and unescapes a pointer into tokens.
fn decode_pointer(raw: &str, pointer: &str) -> Result<Vec<String>, SchemaError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = pointer.strip_prefix('/') else {
        return Err(SchemaError::InvalidReference {
            reference: raw.to_string(),
            reason: "pointer must start with `/`".to_string(),
        });
    };
    rest.split('/').map(|token| decode_token(raw, token)).collect()
}

/// Unescapes one pointer token.
fn decode_token(raw: &str, token: &str) -> Result<String, SchemaError> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(ch) = chars.next() {
        if ch != '~' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => {
                return Err(SchemaError::InvalidReference {
                    reference: raw.to_string(),
                    reason: "`~` must be followed by `0` or `1`".to_string(),
                });
            }
        }
    }
    Ok(out)
}

/// Parses an array index token (no leading zeros, no sign).
fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || (token.len() > 1 && token.starts_with('0')) {
        return None;
    }
    if !token.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
