// crates/woodshop-core/src/tool.rs
// ============================================================================
// Module: Tool Definitions
// Description: Handler trait and the declaration a tool registers with.
// Purpose: Describe a tool once so the pipeline can wrap it uniformly.
// Dependencies: async-trait, serde, serde_json
// ============================================================================

//! ## Overview
//! A [`ToolDefinition`] names a tool, points at its input and output schemas,
//! and supplies a [`ToolHandler`]. Handlers receive the validated input and
//! the call's [`ExecutionContext`] and return a JSON object; provenance is
//! merged in by the pipeline, not by the handler.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::error::HandlerError;
use crate::provenance::ExecutionContext;

// ============================================================================
// SECTION: Handler Trait
// ============================================================================

/// Business logic of a tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Handles one validated call.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Tool`] for deliberate business-rule failures and
    /// [`HandlerError::Unexpected`] for anything else.
    async fn handle(
        &self,
        input: &Value,
        context: &ExecutionContext,
    ) -> Result<Map<String, Value>, HandlerError>;
}

/// Adapter turning an async closure into a [`ToolHandler`].
pub struct FnHandler<F> {
    /// Wrapped closure.
    func: F,
}

/// Wraps an async closure as a handler.
pub const fn handler_fn<F, Fut>(func: F) -> FnHandler<F>
where
    F: Fn(Value, ExecutionContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Map<String, Value>, HandlerError>> + Send,
{
    FnHandler {
        func,
    }
}

#[async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(Value, ExecutionContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Map<String, Value>, HandlerError>> + Send,
{
    async fn handle(
        &self,
        input: &Value,
        context: &ExecutionContext,
    ) -> Result<Map<String, Value>, HandlerError> {
        (self.func)(input.clone(), context.clone()).await
    }
}

/// Serializes a typed handler result into the object the pipeline expects.
///
/// # Errors
///
/// Returns [`HandlerError::Unexpected`] when the value does not serialize to a
/// JSON object.
pub fn output_object<T: Serialize>(value: &T) -> Result<Map<String, Value>, HandlerError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(HandlerError::unexpected(format!(
            "handler result must be an object, got {}",
            json_type(&other)
        ))),
    }
}

/// Names the JSON type of a value.
const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// SECTION: Definition
// ============================================================================

/// Formats the success summary from the validated output and context.
pub type Summarizer = Arc<dyn Fn(&Value, &ExecutionContext) -> String + Send + Sync>;

/// Where a tool schema comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaSource {
    /// A document already registered with the resolver.
    Document(String),
    /// A schema supplied directly; registered under a tool-derived key.
    Inline(Value),
}

/// Declaration of a tool before it is compiled.
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Display title.
    pub title: String,
    /// Display description.
    pub description: String,
    /// Input contract.
    pub input_schema: SchemaSource,
    /// Output contract.
    pub output_schema: SchemaSource,
    /// Business logic.
    pub handler: Arc<dyn ToolHandler>,
    /// Optional success summary formatter.
    pub summarize: Option<Summarizer>,
}

impl ToolDefinition {
    /// Creates a definition whose title defaults to the name.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        input_schema: SchemaSource,
        output_schema: SchemaSource,
        handler: impl ToolHandler + 'static,
    ) -> Self {
        let name = name.into();
        Self {
            title: name.clone(),
            name,
            description: String::new(),
            input_schema,
            output_schema,
            handler: Arc::new(handler),
            summarize: None,
        }
    }

    /// Sets the display title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the display description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the success summary formatter.
    #[must_use]
    pub fn with_summary(
        mut self,
        summarize: impl Fn(&Value, &ExecutionContext) -> String + Send + Sync + 'static,
    ) -> Self {
        self.summarize = Some(Arc::new(summarize));
        self
    }
}
