// crates/woodshop-core/src/observe.rs
// ============================================================================
// Module: Pipeline Observability
// Description: Structured stage events and the sinks that record them.
// Purpose: Emit one JSON line per pipeline stage without affecting outcomes.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Each stage of a call (input validation, context, handler, output
//! validation) produces one [`PipelineEvent`]. Events carry the tool name,
//! stage, outcome, error code, input hash, and elapsed time, never the raw
//! input or output.
//!
//! Sinks implement [`PipelineObserver`]. The pipeline invokes them through
//! [`emit`], which swallows panics, and the built-in sinks ignore I/O
//! failures, so an observer cannot change the result of a call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::panic::AssertUnwindSafe;
use std::panic::catch_unwind;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Event Types
// ============================================================================

/// Pipeline stage that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Input contract check.
    ValidateInput,
    /// Execution context construction.
    BuildContext,
    /// Handler invocation.
    Handler,
    /// Output contract check.
    ValidateOutput,
}

impl PipelineStage {
    /// Returns a stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidateInput => "validate_input",
            Self::BuildContext => "build_context",
            Self::Handler => "handler",
            Self::ValidateOutput => "validate_output",
        }
    }
}

/// Stage outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    /// Stage completed.
    Ok,
    /// Stage failed and ended the call.
    Error,
}

/// Structured event for one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineEvent {
    /// Log level (`info` or `error`).
    pub level: &'static str,
    /// Event name.
    pub event: &'static str,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u128,
    /// Tool name.
    pub tool: String,
    /// Stage that produced the event.
    pub stage: PipelineStage,
    /// Stage outcome.
    pub outcome: StageOutcome,
    /// Failure code when the stage failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Canonical input hash once known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs_hash: Option<String>,
    /// Stage duration in microseconds.
    pub elapsed_us: u128,
}

impl PipelineEvent {
    /// Builds an event stamped with the current time.
    #[must_use]
    pub fn new(
        tool: &str,
        stage: PipelineStage,
        error_code: Option<&str>,
        inputs_hash: Option<&str>,
        elapsed: Duration,
    ) -> Self {
        let outcome = if error_code.is_some() { StageOutcome::Error } else { StageOutcome::Ok };
        Self {
            level: match outcome {
                StageOutcome::Ok => "info",
                StageOutcome::Error => "error",
            },
            event: "tool_stage",
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|duration| duration.as_millis())
                .unwrap_or_default(),
            tool: tool.to_string(),
            stage,
            outcome,
            error_code: error_code.map(str::to_string),
            inputs_hash: inputs_hash.map(str::to_string),
            elapsed_us: elapsed.as_micros(),
        }
    }
}

// ============================================================================
// SECTION: Observer Trait
// ============================================================================

/// Sink for pipeline events.
pub trait PipelineObserver: Send + Sync {
    /// Records one event.
    fn record(&self, event: &PipelineEvent);
}

/// Records an event, discarding any panic raised by the observer.
pub fn emit(observer: &dyn PipelineObserver, event: &PipelineEvent) {
    let _ = catch_unwind(AssertUnwindSafe(|| observer.record(event)));
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Observer that writes JSON lines to stderr.
pub struct StderrObserver;

impl PipelineObserver for StderrObserver {
    fn record(&self, event: &PipelineEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Observer that appends JSON lines to a file.
pub struct FileObserver {
    /// File handle used for append-only logging.
    file: Mutex<File>,
}

impl FileObserver {
    /// Opens the event log in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl PipelineObserver for FileObserver {
    fn record(&self, event: &PipelineEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Observer that discards events.
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    fn record(&self, _event: &PipelineEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================
