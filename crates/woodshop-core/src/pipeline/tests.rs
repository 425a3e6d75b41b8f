// crates/woodshop-core/src/pipeline/tests.rs
// ============================================================================
// Module: Pipeline Unit Tests
// Description: Stage ordering, error taxonomy, and envelope shape.
// Purpose: Pin what callers observe for each way a call can end.
// Dependencies: woodshop-core, serde_json, tokio
// ============================================================================

//! ## Overview
//! Every test builds a small tool whose handler is scripted to echo, return a
//! fixed object, fail, or panic, then asserts on the run or call outcome.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only handlers panic on purpose and assertions unwrap for clarity."
)]

use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use serde_json::json;

use super::*;
use crate::catalog::ToolCatalog;
use crate::error::HandlerError;
use crate::error::codes;
use crate::hashing::sha256_hex;
use crate::observe::NoopObserver;
use crate::observe::StageOutcome;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// What the scripted handler does when invoked.
#[derive(Clone)]
enum Reply {
    /// Returns the validated input plus `result: "ok"`.
    Echo,
    /// Returns a fixed object.
    Object(Value),
    /// Fails with the given error.
    Fail(HandlerError),
    /// Panics.
    Panic,
}

struct Scripted {
    calls: Arc<AtomicUsize>,
    reply: Reply,
}

#[async_trait]
impl ToolHandler for Scripted {
    async fn handle(
        &self,
        input: &Value,
        _context: &ExecutionContext,
    ) -> Result<Map<String, Value>, HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Reply::Echo => {
                let mut output = input.as_object().cloned().unwrap_or_default();
                output.insert("result".to_string(), json!("ok"));
                Ok(output)
            }
            Reply::Object(value) => Ok(value.as_object().cloned().unwrap_or_default()),
            Reply::Fail(error) => Err(error.clone()),
            Reply::Panic => panic!("chisel slipped"),
        }
    }
}

#[derive(Default)]
struct Recording {
    events: Mutex<Vec<PipelineEvent>>,
}

impl PipelineObserver for Recording {
    fn record(&self, event: &PipelineEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

struct Exploding;

impl PipelineObserver for Exploding {
    fn record(&self, _event: &PipelineEvent) {
        panic!("observer down");
    }
}

fn input_schema() -> Value {
    json!({
        "type": "object",
        "required": ["seed"],
        "properties": {
            "seed": {"type": "integer", "minimum": 0},
            "label": {"type": "string", "default": "untitled"}
        }
    })
}

fn output_schema() -> Value {
    json!({
        "type": "object",
        "required": ["result", "seed", "engine_versions", "revision_id", "inputs_hash"],
        "properties": {
            "result": {"type": "string"},
            "label": {"type": "string"},
            "extra": {"type": "boolean"},
            "seed": {"type": "integer"},
            "engine_versions": {"type": "object", "additionalProperties": {"type": "string"}},
            "revision_id": {"type": "string"},
            "inputs_hash": {"type": "string"}
        }
    })
}

fn metadata() -> Arc<ProcessMetadata> {
    let versions = std::collections::BTreeMap::from([("wood".to_string(), "0.0.0".to_string())]);
    ProcessMetadata::new(versions, "rev-1").shared()
}

fn definition(reply: Reply, calls: &Arc<AtomicUsize>) -> ToolDefinition {
    ToolDefinition::new(
        "demo",
        SchemaSource::Inline(input_schema()),
        SchemaSource::Inline(output_schema()),
        Scripted {
            calls: Arc::clone(calls),
            reply,
        },
    )
}

fn build_with(reply: Reply, observer: Arc<dyn PipelineObserver>) -> (ValidatedTool, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut resolver = SchemaResolver::default();
    let tool = ValidatedTool::build(definition(reply, &calls), &mut resolver, metadata(), observer)
        .expect("tool builds");
    (tool, calls)
}

fn build(reply: Reply) -> (ValidatedTool, Arc<AtomicUsize>) {
    build_with(reply, Arc::new(NoopObserver))
}

// ============================================================================
// SECTION: Run
// ============================================================================

#[tokio::test]
async fn valid_call_merges_provenance_into_output() {
    let (tool, calls) = build(Reply::Object(json!({"result": "ok"})));
    let output = tool.run(json!({"seed": 3})).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(output["result"], "ok");
    assert_eq!(output["seed"], 3);
    assert_eq!(output["revision_id"], "rev-1");
    assert_eq!(output["engine_versions"], json!({"wood": "0.0.0"}));
    let expected = sha256_hex(br#"{"label":"untitled","seed":3}"#);
    assert_eq!(output["inputs_hash"], json!(expected));
}

#[tokio::test]
async fn missing_seed_stops_before_handler() {
    let (tool, calls) = build(Reply::Echo);
    let error = tool.run(json!({})).await.unwrap_err();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(error.code, codes::INVALID_INPUT);
    assert_eq!(error.message, "Request failed schema validation.");
    assert_eq!(error.details, json!({"issues": [{"path": "seed", "message": "Required"}]}));
}

#[tokio::test]
async fn bound_violation_names_the_bound() {
    let (tool, _) = build(Reply::Echo);
    let error = tool.run(json!({"seed": -1})).await.unwrap_err();
    assert_eq!(
        error.details["issues"][0]["message"],
        "Number must be greater than or equal to 0"
    );
}

#[tokio::test]
async fn null_input_is_treated_as_empty_object() {
    let (tool, _) = build(Reply::Echo);
    let error = tool.run(Value::Null).await.unwrap_err();
    assert_eq!(error.details, json!({"issues": [{"path": "seed", "message": "Required"}]}));
}

#[tokio::test]
async fn handler_sees_defaults_without_undeclared_keys() {
    let (tool, _) = build(Reply::Echo);
    let with_extra = tool.run(json!({"seed": 1, "extra": true})).await.unwrap();
    let plain = tool.run(json!({"seed": 1})).await.unwrap();
    assert_eq!(with_extra["label"], "untitled");
    assert!(with_extra.get("extra").is_none());
    assert_eq!(with_extra["inputs_hash"], plain["inputs_hash"]);
    assert_eq!(with_extra, plain);
}

#[tokio::test]
async fn nonconforming_handler_output_is_invalid_output() {
    let (tool, calls) = build(Reply::Object(json!({})));
    let error = tool.run(json!({"seed": 0})).await.unwrap_err();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(error.code, codes::INVALID_OUTPUT);
    assert_eq!(error.message, "Tool produced data that failed schema validation.");
    assert_eq!(error.details["issues"][0], json!({"path": "result", "message": "Required"}));
}

#[tokio::test]
async fn handler_cannot_override_provenance() {
    let (tool, _) = build(Reply::Object(json!({"result": "ok", "seed": 99, "revision_id": "forged"})));
    let output = tool.run(json!({"seed": 4})).await.unwrap();
    assert_eq!(output["seed"], 4);
    assert_eq!(output["revision_id"], "rev-1");
}

#[tokio::test]
async fn tool_errors_pass_through_unchanged() {
    let custom = ToolError::new("CUSTOM_X", "nope").with_details(json!({"k": 1}));
    let (tool, _) = build(Reply::Fail(HandlerError::Tool(custom.clone())));
    let error = tool.run(json!({"seed": 0})).await.unwrap_err();
    assert_eq!(error, custom);
}

#[tokio::test]
async fn other_handler_failures_become_unexpected() {
    let (tool, _) = build(Reply::Fail(HandlerError::unexpected("boom")));
    let error = tool.run(json!({"seed": 0})).await.unwrap_err();
    assert_eq!(error.code, codes::UNEXPECTED_ERROR);
    assert_eq!(error.message, "boom");
    assert_eq!(error.details, json!({}));
}

#[tokio::test]
async fn handler_panic_becomes_unexpected() {
    let (tool, _) = build(Reply::Panic);
    let error = tool.run(json!({"seed": 0})).await.unwrap_err();
    assert_eq!(error.code, codes::UNEXPECTED_ERROR);
    assert_eq!(error.message, "chisel slipped");
}

// ============================================================================
// SECTION: Call Envelope
// ============================================================================

#[tokio::test]
async fn success_envelope_carries_default_summary() {
    let (tool, _) = build(Reply::Object(json!({"result": "ok"})));
    let result = tool.call(json!({"seed": 3})).await;
    assert!(!result.is_error);
    assert_eq!(result.text(), Some("demo completed successfully."));
    assert_eq!(result.structured_content, tool.run(json!({"seed": 3})).await.unwrap());
    let wire = serde_json::to_value(&result).unwrap();
    assert!(wire.get("isError").is_none());
    assert_eq!(wire["content"][0]["type"], "text");
    assert_eq!(wire["structuredContent"]["seed"], 3);
}

#[tokio::test]
async fn failure_envelope_carries_error_payload() {
    let (tool, _) = build(Reply::Echo);
    let result = tool.call(json!({})).await;
    assert!(result.is_error);
    assert_eq!(result.text(), Some("demo failed: Request failed schema validation."));
    assert_eq!(result.structured_content["code"], codes::INVALID_INPUT);
    let wire = serde_json::to_value(&result).unwrap();
    assert_eq!(wire["isError"], true);
    assert_eq!(wire["structuredContent"]["details"]["issues"][0]["path"], "seed");
}

#[tokio::test]
async fn custom_summary_sees_output_and_context() {
    let calls = Arc::new(AtomicUsize::new(0));
    let definition = definition(Reply::Object(json!({"result": "ok"})), &calls)
        .with_summary(|output, context| format!("result {} at seed {}", output["result"], context.seed()));
    let tool = ValidatedTool::build(
        definition,
        &mut SchemaResolver::default(),
        metadata(),
        Arc::new(NoopObserver),
    )
    .unwrap();
    let result = tool.call(json!({"seed": 5})).await;
    assert_eq!(result.text(), Some("result \"ok\" at seed 5"));
}

#[tokio::test]
async fn panicking_summary_falls_back_to_default() {
    let calls = Arc::new(AtomicUsize::new(0));
    let definition = definition(Reply::Object(json!({"result": "ok"})), &calls)
        .with_summary(|_, _| panic!("bad summary"));
    let tool = ValidatedTool::build(
        definition,
        &mut SchemaResolver::default(),
        metadata(),
        Arc::new(NoopObserver),
    )
    .unwrap();
    let result = tool.call(json!({"seed": 5})).await;
    assert!(!result.is_error);
    assert_eq!(result.text(), Some("demo completed successfully."));
}

// ============================================================================
// SECTION: Observability
// ============================================================================

#[tokio::test]
async fn each_stage_emits_one_event() {
    let recording = Arc::new(Recording::default());
    let (tool, _) = build_with(Reply::Object(json!({"result": "ok"})), Arc::clone(&recording) as Arc<dyn PipelineObserver>);
    tool.run(json!({"seed": 2})).await.unwrap();
    let events = recording.events.lock().unwrap();
    let stages: Vec<_> = events.iter().map(|event| event.stage).collect();
    assert_eq!(
        stages,
        vec![
            PipelineStage::ValidateInput,
            PipelineStage::BuildContext,
            PipelineStage::Handler,
            PipelineStage::ValidateOutput,
        ]
    );
    assert!(events.iter().all(|event| event.outcome == StageOutcome::Ok && event.tool == "demo"));
    assert!(events[2].inputs_hash.is_some());
}

#[tokio::test]
async fn failing_stage_is_the_last_event() {
    let recording = Arc::new(Recording::default());
    let (tool, _) = build_with(Reply::Echo, Arc::clone(&recording) as Arc<dyn PipelineObserver>);
    tool.run(json!({})).await.unwrap_err();
    let events = recording.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].outcome, StageOutcome::Error);
    assert_eq!(events[0].error_code.as_deref(), Some(codes::INVALID_INPUT));
}

#[tokio::test]
async fn observer_panics_do_not_change_results() {
    let (quiet, _) = build(Reply::Object(json!({"result": "ok"})));
    let (loud, _) = build_with(Reply::Object(json!({"result": "ok"})), Arc::new(Exploding));
    assert_eq!(
        quiet.run(json!({"seed": 8})).await.unwrap(),
        loud.run(json!({"seed": 8})).await.unwrap()
    );
    assert_eq!(loud.run(json!({})).await.unwrap_err().code, codes::INVALID_INPUT);
}

// ============================================================================
// SECTION: Registration
// ============================================================================

#[test]
fn invalid_names_are_rejected() {
    let calls = Arc::new(AtomicUsize::new(0));
    for name in ["", "Demo", "demo-tool", "demo tool"] {
        let mut definition = definition(Reply::Echo, &calls);
        definition.name = name.to_string();
        let error = ValidatedTool::build(
            definition,
            &mut SchemaResolver::default(),
            metadata(),
            Arc::new(NoopObserver),
        )
        .err()
        .expect("name rejected");
        assert_eq!(error, RegistrationError::InvalidName(name.to_string()));
    }
}

#[test]
fn non_object_output_schema_is_rejected_at_build() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut definition = definition(Reply::Echo, &calls);
    definition.output_schema = SchemaSource::Inline(json!({"type": "string"}));
    let error = ValidatedTool::build(
        definition,
        &mut SchemaResolver::default(),
        metadata(),
        Arc::new(NoopObserver),
    )
    .err()
    .expect("schema rejected");
    assert!(matches!(error, RegistrationError::Schema { role: "output", .. }));
}

#[test]
fn unknown_schema_document_is_rejected_at_build() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut definition = definition(Reply::Echo, &calls);
    definition.input_schema = SchemaSource::Document("missing.schema.json".to_string());
    let error = ValidatedTool::build(
        definition,
        &mut SchemaResolver::default(),
        metadata(),
        Arc::new(NoopObserver),
    )
    .err()
    .expect("schema rejected");
    assert!(matches!(error, RegistrationError::Schema { role: "input", .. }));
}

#[test]
fn register_attaches_to_catalog_once() {
    let (tool, _) = build(Reply::Echo);
    let tool = Arc::new(tool);
    let mut catalog = ToolCatalog::new();
    Arc::clone(&tool).register(&mut catalog).unwrap();
    assert_eq!(catalog.names(), vec!["demo"]);
    assert_eq!(catalog.descriptors()[0].input_schema, input_schema());
    let error = tool.register(&mut catalog).unwrap_err();
    assert_eq!(error, CatalogError::Duplicate("demo".to_string()));
}
