// crates/woodshop-core/src/error.rs
// ============================================================================
// Module: Tool Error Taxonomy
// Description: Caller-visible failure payload and handler failure type.
// Purpose: Classify every failed call by where in the pipeline it stopped.
// Dependencies: serde, serde_json, thiserror, woodshop-schema
// ============================================================================

//! ## Overview
//! [`ToolError`] is the only failure a caller ever sees. Its `code` is one of:
//! - `INVALID_INPUT`: the caller's payload broke the input contract; the
//!   handler never ran.
//! - `INVALID_OUTPUT`: the handler's payload broke the output contract; this
//!   is a tool defect.
//! - a tool-specific code such as `UNKNOWN_SPECIES`, raised on purpose by a
//!   handler and passed through unchanged.
//! - `UNEXPECTED_ERROR`: anything else, carrying the original message and
//!   empty details.
//!
//! Handlers fail with [`HandlerError`], which either already is a
//! [`ToolError`] or is an arbitrary message to be wrapped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;
use woodshop_schema::Issue;

// ============================================================================
// SECTION: Codes
// ============================================================================

/// Pipeline-owned error codes.
pub mod codes {
    /// Input failed the input schema.
    pub const INVALID_INPUT: &str = "INVALID_INPUT";
    /// Handler output failed the output schema.
    pub const INVALID_OUTPUT: &str = "INVALID_OUTPUT";
    /// Any failure that was not a deliberate tool error.
    pub const UNEXPECTED_ERROR: &str = "UNEXPECTED_ERROR";
}

/// Message attached to input validation failures.
const INVALID_INPUT_MESSAGE: &str = "Request failed schema validation.";
/// Message attached to output validation failures.
const INVALID_OUTPUT_MESSAGE: &str = "Tool produced data that failed schema validation.";

/// Coarse classification of a [`ToolError`] code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller payload rejected.
    InvalidInput,
    /// Tool payload rejected.
    InvalidOutput,
    /// Deliberate business-rule failure.
    ToolSpecific,
    /// Wrapped unexpected failure.
    Unexpected,
}

impl ErrorClass {
    /// Returns a stable label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::InvalidOutput => "invalid_output",
            Self::ToolSpecific => "tool_specific",
            Self::Unexpected => "unexpected",
        }
    }
}

// ============================================================================
// SECTION: Tool Error
// ============================================================================

/// Caller-visible failure payload.
///
/// # Invariants
/// - Created once at a failure boundary and propagated unchanged.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ToolError {
    /// Machine-readable failure code.
    pub code: String,
    /// Human-readable message, safe to render as-is.
    pub message: String,
    /// Structured diagnostics.
    #[serde(default)]
    pub details: Value,
}

impl ToolError {
    /// Creates an error with empty details.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Value::Object(Map::new()),
        }
    }

    /// Replaces the details payload.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Builds an `INVALID_INPUT` error from validation issues.
    #[must_use]
    pub fn invalid_input(issues: &[Issue]) -> Self {
        Self::new(codes::INVALID_INPUT, INVALID_INPUT_MESSAGE).with_details(issues_details(issues))
    }

    /// Builds an `INVALID_OUTPUT` error from validation issues.
    #[must_use]
    pub fn invalid_output(issues: &[Issue]) -> Self {
        Self::new(codes::INVALID_OUTPUT, INVALID_OUTPUT_MESSAGE)
            .with_details(issues_details(issues))
    }

    /// Builds an `UNEXPECTED_ERROR` carrying the original message.
    #[must_use]
    pub fn unexpected(message: impl fmt::Display) -> Self {
        Self::new(codes::UNEXPECTED_ERROR, message.to_string())
    }

    /// Classifies the error code.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self.code.as_str() {
            codes::INVALID_INPUT => ErrorClass::InvalidInput,
            codes::INVALID_OUTPUT => ErrorClass::InvalidOutput,
            codes::UNEXPECTED_ERROR => ErrorClass::Unexpected,
            _ => ErrorClass::ToolSpecific,
        }
    }

    /// Returns the validation issues carried in `details.issues`, if any.
    #[must_use]
    pub fn issues(&self) -> Option<Vec<Issue>> {
        let issues = self.details.get("issues")?;
        serde_json::from_value(issues.clone()).ok()
    }

    /// Returns the `{code, message, details}` payload.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("code".to_string(), Value::String(self.code.clone()));
        map.insert("message".to_string(), Value::String(self.message.clone()));
        map.insert("details".to_string(), self.details.clone());
        Value::Object(map)
    }
}

/// Wraps issues as `{"issues": [{path, message}, ...]}`.
fn issues_details(issues: &[Issue]) -> Value {
    let entries = issues
        .iter()
        .map(|issue| {
            let mut entry = Map::new();
            entry.insert("path".to_string(), Value::String(issue.path.clone()));
            entry.insert("message".to_string(), Value::String(issue.message.clone()));
            Value::Object(entry)
        })
        .collect();
    let mut details = Map::new();
    details.insert("issues".to_string(), Value::Array(entries));
    Value::Object(details)
}

// ============================================================================
// SECTION: Handler Error
// ============================================================================

/// Failure returned by a tool handler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HandlerError {
    /// Deliberate tool error, passed through unchanged.
    #[error(transparent)]
    Tool(ToolError),
    /// Any other failure, wrapped as `UNEXPECTED_ERROR`.
    #[error("{0}")]
    Unexpected(String),
}

impl HandlerError {
    /// Wraps any displayable failure.
    #[must_use]
    pub fn unexpected(error: impl fmt::Display) -> Self {
        Self::Unexpected(error.to_string())
    }

    /// Converts into the caller-visible error.
    #[must_use]
    pub fn into_tool_error(self) -> ToolError {
        match self {
            Self::Tool(error) => error,
            Self::Unexpected(message) => ToolError::unexpected(message),
        }
    }
}

impl From<ToolError> for HandlerError {
    fn from(error: ToolError) -> Self {
        Self::Tool(error)
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(error: serde_json::Error) -> Self {
        Self::unexpected(error)
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(error: std::io::Error) -> Self {
        Self::unexpected(error)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
