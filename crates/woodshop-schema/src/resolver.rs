// crates/woodshop-schema/src/resolver.rs
// ============================================================================
// Module: Schema Resolver
// Description: Expansion of `$ref` and `allOf` into reference-free schemas.
// Purpose: Produce trees the compiler can match exhaustively.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! [`SchemaResolver`] walks a [`SchemaNode`] and replaces every reference with
//! the node it points at and every `allOf` with the merge of its branches.
//! References resolve relative to the document they appear in, so a chain
//! that hops across documents keeps resolving inside each target document.
//!
//! `allOf` merge rules, applied left to right and then once more for the
//! keywords sitting next to `allOf`:
//! - `properties`: shallow key union; the later definition of a key wins.
//! - `required`: set union, first-seen order.
//! - every other keyword (`type`, `enum`, `default`, `additionalProperties`,
//!   annotations): the later value replaces the earlier one.
//!
//! Expanded targets are cached per `(document, pointer)`. A reference whose
//! expansion needs itself is rejected as cyclic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;

use serde_json::Map;
use serde_json::Value;

use crate::documents::SchemaDocuments;
use crate::documents::normalize_key;
use crate::error::SchemaError;
use crate::node::AdditionalProperties;
use crate::node::AllOfSchema;
use crate::node::SchemaKind;
use crate::node::SchemaNode;
use crate::reference::SchemaReference;

// ============================================================================
// SECTION: Resolved Schema
// ============================================================================

/// A schema tree containing no references and no compositions.
///
/// # Invariants
/// - Only [`SchemaResolver`] constructs values of this type.
/// - `node.is_resolved()` holds for the wrapped tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSchema {
    /// Fully expanded root node.
    node: SchemaNode,
}

impl ResolvedSchema {
    /// Returns the root node.
    #[must_use]
    pub const fn node(&self) -> &SchemaNode {
        &self.node
    }

    /// Serializes the expanded schema to JSON.
    #[must_use]
    pub fn to_value(&self) -> Value {
        self.node.to_value()
    }
}

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Cache key: normalized document key plus raw pointer text.
type TargetKey = (String, String);

/// Expands references and compositions against a document store.
#[derive(Debug, Default)]
pub struct SchemaResolver {
    /// Documents references may target.
    documents: SchemaDocuments,
    /// Expanded reference targets.
    cache: HashMap<TargetKey, SchemaNode>,
    /// Targets currently being expanded, for cycle detection.
    in_progress: Vec<TargetKey>,
}

impl SchemaResolver {
    /// Creates a resolver over a document store.
    #[must_use]
    pub fn new(documents: SchemaDocuments) -> Self {
        Self {
            documents,
            cache: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    /// Returns the document store.
    #[must_use]
    pub const fn documents(&self) -> &SchemaDocuments {
        &self.documents
    }

    /// Registers an additional document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateDocument`] when the key is taken.
    pub fn insert_document(&mut self, key: &str, document: Value) -> Result<(), SchemaError> {
        self.documents.insert(key, document)
    }

    /// Returns the number of cached reference targets.
    #[must_use]
    pub fn cached_targets(&self) -> usize {
        self.cache.len()
    }

    /// Resolves a whole registered document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the document is unknown or any reference
    /// inside it cannot be resolved.
    pub fn resolve_document(&mut self, key: &str) -> Result<ResolvedSchema, SchemaError> {
        let key = normalize_key(key);
        let reference = SchemaReference::parse(&format!("{key}#"))?;
        let node = self.expand_reference(&reference, &key)?;
        Ok(ResolvedSchema {
            node,
        })
    }

    /// Resolves a node that lives in `document`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when any reference cannot be resolved.
    pub fn resolve(
        &mut self,
        node: &SchemaNode,
        document: &str,
    ) -> Result<ResolvedSchema, SchemaError> {
        let node = self.expand(node, &normalize_key(document))?;
        Ok(ResolvedSchema {
            node,
        })
    }

    /// Expands one node.
    fn expand(&mut self, node: &SchemaNode, document: &str) -> Result<SchemaNode, SchemaError> {
        match &node.kind {
            SchemaKind::Reference(reference) => self.expand_reference(reference, document),
            SchemaKind::AllOf(all_of) => self.expand_all_of(all_of, document),
            kind => Ok(SchemaNode {
                kind: self.expand_kind(kind, document)?,
                default: node.default.clone(),
                keywords: node.keywords.clone(),
            }),
        }
    }

    /// Expands the nested nodes of a concrete kind.
    fn expand_kind(&mut self, kind: &SchemaKind, document: &str) -> Result<SchemaKind, SchemaError> {
        match kind {
            SchemaKind::Array(array) => {
                let mut array = array.clone();
                if let Some(items) = array.items.as_mut() {
                    **items = self.expand(items, document)?;
                }
                Ok(SchemaKind::Array(array))
            }
            SchemaKind::Object(object) => {
                let mut object = object.clone();
                for node in object.properties.values_mut() {
                    *node = self.expand(node, document)?;
                }
                if let AdditionalProperties::Schema(schema) = &mut object.additional {
                    **schema = self.expand(schema, document)?;
                }
                Ok(SchemaKind::Object(object))
            }
            SchemaKind::Union(kinds) => kinds
                .iter()
                .map(|kind| self.expand_kind(kind, document))
                .collect::<Result<Vec<_>, _>>()
                .map(SchemaKind::Union),
            SchemaKind::Reference(_) | SchemaKind::AllOf(_) => {
                Err(SchemaError::Unresolved(kind.name()))
            }
            other => Ok(other.clone()),
        }
    }

    /// Expands a reference target, consulting the cache first.
    fn expand_reference(
        &mut self,
        reference: &SchemaReference,
        document: &str,
    ) -> Result<SchemaNode, SchemaError> {
        let target_document = reference.document_or(document).to_string();
        let key = (target_document.clone(), reference.pointer().to_string());
        if let Some(node) = self.cache.get(&key) {
            return Ok(node.clone());
        }
        if self.in_progress.contains(&key) {
            return Err(SchemaError::CyclicReference(reference.as_str().to_string()));
        }

        let Some(source) = self.documents.get(&target_document) else {
            return Err(SchemaError::UnknownDocument {
                document: target_document,
                reference: reference.as_str().to_string(),
            });
        };
        let Some(target) = reference.locate(source) else {
            return Err(SchemaError::UnresolvedPointer(reference.as_str().to_string()));
        };
        if !target.is_object() {
            return Err(SchemaError::NotAnObject(reference.as_str().to_string()));
        }
        let parsed = SchemaNode::parse(target)?;

        self.in_progress.push(key.clone());
        let expanded = self.expand(&parsed, &target_document);
        self.in_progress.pop();
        let expanded = expanded?;

        self.cache.insert(key, expanded.clone());
        Ok(expanded)
    }

    /// Resolves every branch, merges them, then merges the siblings on top.
    fn expand_all_of(
        &mut self,
        all_of: &AllOfSchema,
        document: &str,
    ) -> Result<SchemaNode, SchemaError> {
        let mut merged = Map::new();
        for branch in &all_of.branches {
            let resolved = self.expand(branch, document)?;
            merge_into(&mut merged, resolved.to_value());
        }
        if let Some(siblings) = &all_of.siblings {
            let resolved = self.expand(siblings, document)?;
            merge_into(&mut merged, resolved.to_value());
        }
        let node = SchemaNode::parse(&Value::Object(merged))?;
        self.expand(&node, document)
    }
}

// ============================================================================
// SECTION: Merge Rules
// ============================================================================

/// Merges one resolved branch into the accumulator.
fn merge_into(accumulator: &mut Map<String, Value>, branch: Value) {
    let Value::Object(branch) = branch else {
        return;
    };
    for (keyword, value) in branch {
        let replacement = match (keyword.as_str(), accumulator.get_mut(&keyword), value) {
            ("properties", Some(Value::Object(existing)), Value::Object(incoming)) => {
                existing.extend(incoming);
                None
            }
            ("required", Some(Value::Array(existing)), Value::Array(incoming)) => {
                for name in incoming {
                    if !existing.contains(&name) {
                        existing.push(name);
                    }
                }
                None
            }
            (_, _, value) => Some(value),
        };
        if let Some(value) = replacement {
            accumulator.insert(keyword, value);
        }
    }
}

/// Merges raw, reference-free schema objects with the `allOf` rules.
#[must_use]
pub fn merge_schemas(branches: &[Value]) -> Value {
    let mut merged = Map::new();
    for branch in branches {
        merge_into(&mut merged, branch.clone());
    }
    Value::Object(merged)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
