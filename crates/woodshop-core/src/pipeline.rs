// crates/woodshop-core/src/pipeline.rs
// ============================================================================
// Module: Tool Execution Pipeline
// Description: Validated wrapper that runs a tool handler under its contracts.
// Purpose: Apply one fixed call sequence to every tool.
// Dependencies: serde, serde_json, thiserror, tokio, woodshop-schema
// ============================================================================

//! ## Overview
//! [`ValidatedTool`] is built once per tool. Each call moves forward through
//! these stages and stops at the first failure:
//! 1. validate the raw input (`null` is treated as `{}`) -> `INVALID_INPUT`
//! 2. build the [`ExecutionContext`]
//! 3. run the handler on its own task; a [`ToolError`] passes through, any
//!    other failure (including a panic) becomes `UNEXPECTED_ERROR`
//! 4. shallow-merge provenance over the handler result
//! 5. validate the merged output -> `INVALID_OUTPUT`
//!
//! [`ValidatedTool::run`] returns the validated output or the error.
//! [`ValidatedTool::call`] packages the same outcome as a [`CallToolResult`]
//! and never fails.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::panic::catch_unwind;
use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;
use woodshop_schema::CompiledValidator;
use woodshop_schema::SchemaError;
use woodshop_schema::SchemaResolver;

use crate::catalog::CatalogError;
use crate::catalog::ToolHost;
use crate::error::ToolError;
use crate::observe::PipelineEvent;
use crate::observe::PipelineObserver;
use crate::observe::PipelineStage;
use crate::observe::emit;
use crate::provenance::ExecutionContext;
use crate::provenance::ProcessMetadata;
use crate::provenance::attach_provenance;
use crate::tool::SchemaSource;
use crate::tool::Summarizer;
use crate::tool::ToolDefinition;
use crate::tool::ToolHandler;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum tool name length.
const MAX_TOOL_NAME_LENGTH: usize = 64;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while building a tool at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// Tool name is empty, too long, or not `[a-z0-9_]`.
    #[error("invalid tool name `{0}`")]
    InvalidName(String),
    /// A contract schema could not be resolved or compiled.
    #[error("tool `{tool}` {role} schema: {source}")]
    Schema {
        /// Tool name.
        tool: String,
        /// `input` or `output`.
        role: &'static str,
        /// Underlying schema error.
        #[source]
        source: SchemaError,
    },
}

// ============================================================================
// SECTION: Protocol Envelope
// ============================================================================

/// Content block of a protocol result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolContent {
    /// Plain text block.
    Text {
        /// Text body.
        text: String,
    },
}

/// Protocol result returned by [`ValidatedTool::call`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    /// Set on failure; omitted on success.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
    /// Human-readable content blocks.
    pub content: Vec<ToolContent>,
    /// Validated output on success; `{code, message, details}` on failure.
    pub structured_content: Value,
}

impl CallToolResult {
    /// Builds a success envelope.
    #[must_use]
    pub fn success(summary: String, output: Value) -> Self {
        Self {
            is_error: false,
            content: vec![ToolContent::Text {
                text: summary,
            }],
            structured_content: output,
        }
    }

    /// Builds a failure envelope.
    #[must_use]
    pub fn failure(tool: &str, error: &ToolError) -> Self {
        Self {
            is_error: true,
            content: vec![ToolContent::Text {
                text: format!("{tool} failed: {}", error.message),
            }],
            structured_content: error.to_value(),
        }
    }

    /// Returns the first text block.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.content.iter().map(|ToolContent::Text { text }| text.as_str()).next()
    }
}

/// Listing entry for a registered tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Tool name.
    pub name: String,
    /// Display title.
    pub title: String,
    /// Display description.
    pub description: String,
    /// Resolved input schema.
    pub input_schema: Value,
    /// Resolved output schema.
    pub output_schema: Value,
}

// ============================================================================
// SECTION: Validated Tool
// ============================================================================

/// A tool wrapped with compiled contracts.
///
/// # Invariants
/// - Immutable after [`ValidatedTool::build`]; safe to share across calls.
pub struct ValidatedTool {
    /// Unique tool name.
    name: String,
    /// Display title.
    title: String,
    /// Display description.
    description: String,
    /// Resolved input schema JSON.
    input_schema: Value,
    /// Resolved output schema JSON.
    output_schema: Value,
    /// Compiled input contract.
    input: CompiledValidator,
    /// Compiled output contract.
    output: CompiledValidator,
    /// Business logic.
    handler: Arc<dyn ToolHandler>,
    /// Optional success summary formatter.
    summarize: Option<Summarizer>,
    /// Frozen process metadata.
    metadata: Arc<ProcessMetadata>,
    /// Stage event sink.
    observer: Arc<dyn PipelineObserver>,
}

impl ValidatedTool {
    /// Resolves and compiles a tool definition.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] when the name is invalid or either schema
    /// fails to resolve or does not describe an object.
    pub fn build(
        definition: ToolDefinition,
        resolver: &mut SchemaResolver,
        metadata: Arc<ProcessMetadata>,
        observer: Arc<dyn PipelineObserver>,
    ) -> Result<Self, RegistrationError> {
        validate_tool_name(&definition.name)?;
        let (input_schema, input) =
            compile_contract(resolver, &definition.name, "input", definition.input_schema)?;
        let (output_schema, output) =
            compile_contract(resolver, &definition.name, "output", definition.output_schema)?;
        Ok(Self {
            name: definition.name,
            title: definition.title,
            description: definition.description,
            input_schema,
            output_schema,
            input,
            output,
            handler: definition.handler,
            summarize: definition.summarize,
            metadata,
            observer,
        })
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the display title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the display description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the resolved input schema.
    #[must_use]
    pub const fn input_schema(&self) -> &Value {
        &self.input_schema
    }

    /// Returns the resolved output schema.
    #[must_use]
    pub const fn output_schema(&self) -> &Value {
        &self.output_schema
    }

    /// Returns the listing entry for this tool.
    #[must_use]
    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
            output_schema: self.output_schema.clone(),
        }
    }

    /// Attaches the tool to a host under its name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the host rejects the tool.
    pub fn register(self: Arc<Self>, host: &mut dyn ToolHost) -> Result<(), CatalogError> {
        host.attach(self)
    }

    /// Direct invocation: returns the validated output or the failure.
    ///
    /// # Errors
    ///
    /// Returns the [`ToolError`] of the first failing stage.
    pub async fn run(&self, raw_input: Value) -> Result<Value, ToolError> {
        self.evaluate(raw_input).await.map(|(_, output)| output)
    }

    /// Protocol invocation: always returns an envelope.
    pub async fn call(&self, raw_input: Value) -> CallToolResult {
        match self.evaluate(raw_input).await {
            Ok((context, output)) => {
                let summary = self.summary(&output, &context);
                CallToolResult::success(summary, output)
            }
            Err(error) => CallToolResult::failure(&self.name, &error),
        }
    }

    /// Runs stages 1-5.
    async fn evaluate(&self, raw_input: Value) -> Result<(ExecutionContext, Value), ToolError> {
        let raw_input = if raw_input.is_null() { Value::Object(Map::new()) } else { raw_input };

        let started = Instant::now();
        let input =
            self.input.validate(&raw_input).map_err(|issues| ToolError::invalid_input(&issues));
        let input = self.observe(PipelineStage::ValidateInput, None, started, input)?;

        let started = Instant::now();
        let context = ExecutionContext::build(input, Arc::clone(&self.metadata))
            .map_err(ToolError::unexpected);
        let context = self.observe(PipelineStage::BuildContext, None, started, context)?;
        let inputs_hash = context.inputs_hash().to_string();

        let started = Instant::now();
        let handled = self.invoke_handler(context).await;
        let (result, context) =
            self.observe(PipelineStage::Handler, Some(&inputs_hash), started, handled)?;

        let merged = attach_provenance(result, &context);

        let started = Instant::now();
        let output =
            self.output.validate(&merged).map_err(|issues| ToolError::invalid_output(&issues));
        let output =
            self.observe(PipelineStage::ValidateOutput, Some(&inputs_hash), started, output)?;
        Ok((context, output))
    }

    /// Runs the handler on its own task so a panic is contained.
    async fn invoke_handler(
        &self,
        context: ExecutionContext,
    ) -> Result<(Map<String, Value>, ExecutionContext), ToolError> {
        let handler = Arc::clone(&self.handler);
        let task = tokio::spawn(async move {
            let result = handler.handle(context.input(), &context).await;
            (result, context)
        });
        match task.await {
            Ok((Ok(output), context)) => Ok((output, context)),
            Ok((Err(error), _)) => Err(error.into_tool_error()),
            Err(join_error) if join_error.is_panic() => {
                Err(ToolError::unexpected(panic_message(join_error.into_panic().as_ref())))
            }
            Err(_) => Err(ToolError::unexpected("handler task was cancelled")),
        }
    }

    /// Formats the success summary, falling back on a missing or panicking formatter.
    fn summary(&self, output: &Value, context: &ExecutionContext) -> String {
        let fallback = || format!("{} completed successfully.", self.name);
        match &self.summarize {
            Some(summarize) => catch_unwind(AssertUnwindSafe(|| summarize(output, context)))
                .unwrap_or_else(|_| fallback()),
            None => fallback(),
        }
    }

    /// Emits a stage event and passes the stage result through.
    fn observe<T>(
        &self,
        stage: PipelineStage,
        inputs_hash: Option<&str>,
        started: Instant,
        result: Result<T, ToolError>,
    ) -> Result<T, ToolError> {
        let error_code = result.as_ref().err().map(|error| error.code.as_str());
        let event =
            PipelineEvent::new(&self.name, stage, error_code, inputs_hash, started.elapsed());
        emit(self.observer.as_ref(), &event);
        result
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves and compiles one contract schema.
fn compile_contract(
    resolver: &mut SchemaResolver,
    tool: &str,
    role: &'static str,
    source: SchemaSource,
) -> Result<(Value, CompiledValidator), RegistrationError> {
    let schema_error = |source| RegistrationError::Schema {
        tool: tool.to_string(),
        role,
        source,
    };
    let key = match source {
        SchemaSource::Document(key) => key,
        SchemaSource::Inline(schema) => {
            let key = format!("{tool}.{role}.schema.json");
            resolver.insert_document(&key, schema).map_err(schema_error)?;
            key
        }
    };
    let resolved = resolver.resolve_document(&key).map_err(schema_error)?;
    let validator = CompiledValidator::compile_object(&resolved).map_err(schema_error)?;
    Ok((resolved.to_value(), validator))
}

/// Checks a tool name is `[a-z0-9_]{1,64}`.
fn validate_tool_name(name: &str) -> Result<(), RegistrationError> {
    let valid = !name.is_empty()
        && name.len() <= MAX_TOOL_NAME_LENGTH
        && name
            .bytes()
            .all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'_');
    if valid { Ok(()) } else { Err(RegistrationError::InvalidName(name.to_string())) }
}

/// Extracts the message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
