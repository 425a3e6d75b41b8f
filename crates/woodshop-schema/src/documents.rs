// crates/woodshop-schema/src/documents.rs
// ============================================================================
// Module: Schema Document Store
// Description: Keyed collection of raw JSON Schema documents.
// Purpose: Provide the lookup table cross-document references resolve against.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Documents are addressed by relative path strings such as
//! `./common.schema.json`. Keys are normalized by stripping leading `./`
//! segments so both spellings address the same document. The store is built
//! once at startup and never mutated afterwards.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::SchemaError;

// ============================================================================
// SECTION: Document Store
// ============================================================================

/// Immutable-after-startup map of schema documents.
#[derive(Debug, Clone, Default)]
pub struct SchemaDocuments {
    /// Documents keyed by normalized relative path.
    documents: BTreeMap<String, Value>,
}

impl SchemaDocuments {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a document under a relative key.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateDocument`] when the normalized key is
    /// already taken.
    pub fn insert(&mut self, key: &str, document: Value) -> Result<(), SchemaError> {
        let key = normalize_key(key);
        if self.documents.contains_key(&key) {
            return Err(SchemaError::DuplicateDocument(key));
        }
        self.documents.insert(key, document);
        Ok(())
    }

    /// Builder-style variant of [`SchemaDocuments::insert`].
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateDocument`] when the key is taken.
    pub fn with(mut self, key: &str, document: Value) -> Result<Self, SchemaError> {
        self.insert(key, document)?;
        Ok(self)
    }

    /// Returns the document stored under a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.documents.get(&normalize_key(key))
    }

    /// Returns true when a document is stored under a key.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates over normalized keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    /// Returns the number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns true when no documents are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Strips leading `./` segments from a document key.
pub(crate) fn normalize_key(key: &str) -> String {
    let mut trimmed = key.trim();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    trimmed.to_string()
}
