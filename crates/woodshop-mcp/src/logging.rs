// crates/woodshop-mcp/src/logging.rs
// ============================================================================
// Module: Server Logging
// Description: Pipeline observer selection and lifecycle notices.
// Purpose: Keep stdout free for the stdio transport.
// Dependencies: serde_json, woodshop-config, woodshop-core
// ============================================================================

//! ## Overview
//! Stage events go to the sink named in `[logging]`. Lifecycle notices
//! (transport started, fatal errors) are always JSON lines on stderr.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde_json::Map;
use serde_json::Value;
use woodshop_config::LogSink;
use woodshop_config::LoggingConfig;
use woodshop_core::FileObserver;
use woodshop_core::NoopObserver;
use woodshop_core::PipelineObserver;
use woodshop_core::StderrObserver;

use crate::server::McpServerError;

// ============================================================================
// SECTION: Observer Selection
// ============================================================================

/// Builds the configured pipeline observer.
///
/// # Errors
///
/// Returns [`McpServerError::Init`] when the file sink cannot be opened.
pub fn observer_from_config(
    config: &LoggingConfig,
) -> Result<Arc<dyn PipelineObserver>, McpServerError> {
    match (config.sink, config.path.as_deref()) {
        (LogSink::None, _) => Ok(Arc::new(NoopObserver)),
        (LogSink::Stderr, _) => Ok(Arc::new(StderrObserver)),
        (LogSink::File, Some(path)) => FileObserver::new(Path::new(path.trim()))
            .map(|observer| Arc::new(observer) as Arc<dyn PipelineObserver>)
            .map_err(|err| McpServerError::Init(format!("event log: {err}"))),
        (LogSink::File, None) => {
            Err(McpServerError::Config("logging.sink = \"file\" requires logging.path".to_string()))
        }
    }
}

// ============================================================================
// SECTION: Lifecycle Notices
// ============================================================================

/// Writes a `{level, event, timestamp_ms, ...fields}` line to stderr.
pub fn notice(level: &str, event: &str, fields: Map<String, Value>) {
    let mut record = Map::new();
    record.insert("level".to_string(), Value::from(level));
    record.insert("event".to_string(), Value::from(event));
    record.insert("timestamp_ms".to_string(), Value::from(timestamp_ms()));
    record.extend(fields);
    if let Ok(line) = serde_json::to_string(&Value::Object(record)) {
        let _ = writeln!(io::stderr(), "{line}");
    }
}

/// Milliseconds since the Unix epoch, saturating at `u64::MAX`.
fn timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
