// crates/woodshop-mcp/src/metadata.rs
// ============================================================================
// Module: Process Metadata Discovery
// Description: Engine versions and source revision computed at startup.
// Purpose: Freeze provenance inputs before the first tool is built.
// Dependencies: woodshop-config, woodshop-core
// ============================================================================

//! ## Overview
//! Engine versions start from a built-in map and are overlaid by
//! `[provenance.engine_versions]`. The revision id is the first of: the
//! configured override, `WOODSHOP_REVISION_ID`, `git rev-parse HEAD` in the
//! working directory, or `"unknown"`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use std::process::Command;
use std::process::Stdio;

use woodshop_config::ProvenanceConfig;
use woodshop_core::ProcessMetadata;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable that overrides revision discovery.
pub const REVISION_ENV_VAR: &str = "WOODSHOP_REVISION_ID";
/// Revision id used when nothing else is available.
pub const UNKNOWN_REVISION: &str = "unknown";
/// Version reported for geometry engines that are not linked in.
const ENGINE_PLACEHOLDER_VERSION: &str = "0.0.0";

// ============================================================================
// SECTION: Discovery
// ============================================================================

/// Returns the built-in engine version map.
#[must_use]
pub fn default_engine_versions() -> BTreeMap<String, String> {
    let mut versions: BTreeMap<String, String> = ["cam", "nest", "occt", "wood"]
        .into_iter()
        .map(|engine| (engine.to_string(), ENGINE_PLACEHOLDER_VERSION.to_string()))
        .collect();
    versions.insert("schemas".to_string(), env!("CARGO_PKG_VERSION").to_string());
    versions
}

/// Overlays configured versions on the built-in map.
#[must_use]
pub fn engine_versions(overrides: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut versions = default_engine_versions();
    versions.extend(overrides.iter().map(|(engine, version)| (engine.clone(), version.clone())));
    versions
}

/// Picks the revision id from the configured, environment, and git sources.
#[must_use]
pub fn revision_id(configured: Option<&str>, env_value: Option<String>, workdir: &Path) -> String {
    configured
        .map(str::to_string)
        .or_else(|| env_value.filter(|value| !value.trim().is_empty()))
        .or_else(|| git_revision(workdir))
        .unwrap_or_else(|| UNKNOWN_REVISION.to_string())
}

/// Reads `HEAD` from git, if git and a repository are available.
fn git_revision(workdir: &Path) -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(workdir)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let revision = String::from_utf8(output.stdout).ok()?;
    let revision = revision.trim();
    (!revision.is_empty()).then(|| revision.to_string())
}

/// Computes process metadata from configuration and the environment.
#[must_use]
pub fn discover(config: &ProvenanceConfig) -> ProcessMetadata {
    let workdir = env::current_dir().unwrap_or_else(|_| Path::new(".").to_path_buf());
    let revision = revision_id(
        config.revision_id.as_deref(),
        env::var(REVISION_ENV_VAR).ok(),
        &workdir,
    );
    ProcessMetadata::new(engine_versions(&config.engine_versions), revision)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
