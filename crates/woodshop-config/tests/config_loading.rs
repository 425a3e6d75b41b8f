//! Config loading and validation tests for woodshop-config.
// crates/woodshop-config/tests/config_loading.rs
// =============================================================================
// Module: Config Loading and Validation Tests
// Description: Validate defaults, file resolution, and core invariants.
// Purpose: Ensure minimal config is valid and invalid config fails closed.
// =============================================================================

use std::fs;
use std::path::PathBuf;

use woodshop_config::ConfigError;
use woodshop_config::ConfigSource;
use woodshop_config::LogSink;
use woodshop_config::ServerTransport;
use woodshop_config::WoodshopConfig;

mod common;

use common::TestResult;
use common::assert_invalid;

#[test]
fn default_config_validates() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;
    if config.server.transport != ServerTransport::Stdio {
        return Err("transport should default to stdio".to_string());
    }
    if config.server.max_body_bytes != 1024 * 1024 {
        return Err("max_body_bytes should default to 1 MiB".to_string());
    }
    if config.logging.sink != LogSink::Stderr {
        return Err("logging sink should default to stderr".to_string());
    }
    Ok(())
}

#[test]
fn http_transport_requires_bind() -> TestResult {
    assert_invalid(
        WoodshopConfig::from_toml("[server]\ntransport = \"http\"\n"),
        "http transport requires bind address",
    )
}

#[test]
fn bind_must_be_socket_address() -> TestResult {
    assert_invalid(
        WoodshopConfig::from_toml("[server]\ntransport = \"http\"\nbind = \"localhost\"\n"),
        "invalid bind address",
    )
}

#[test]
fn http_config_parses_bind_addr() -> TestResult {
    let config =
        WoodshopConfig::from_toml("[server]\ntransport = \"http\"\nbind = \"127.0.0.1:7300\"\n")
            .map_err(|err| err.to_string())?;
    match config.server.bind_addr() {
        Some(addr) if addr.port() == 7300 => Ok(()),
        other => Err(format!("unexpected bind addr {}", other.map_or_else(String::new, |a| a.to_string()))),
    }
}

#[test]
fn max_body_bytes_bounds_are_enforced() -> TestResult {
    assert_invalid(
        WoodshopConfig::from_toml("[server]\nmax_body_bytes = 0\n"),
        "greater than zero",
    )?;
    assert_invalid(
        WoodshopConfig::from_toml("[server]\nmax_body_bytes = 16777217\n"),
        "must not exceed",
    )?;
    WoodshopConfig::from_toml("[server]\nmax_body_bytes = 16777216\n")
        .map(|_| ())
        .map_err(|err| err.to_string())
}

#[test]
fn file_sink_requires_path() -> TestResult {
    assert_invalid(
        WoodshopConfig::from_toml("[logging]\nsink = \"file\"\n"),
        "requires logging.path",
    )
}

#[test]
fn empty_revision_override_is_rejected() -> TestResult {
    assert_invalid(
        WoodshopConfig::from_toml("[provenance]\nrevision_id = \"  \"\n"),
        "provenance.revision_id must be non-empty",
    )
}

#[test]
fn engine_version_overrides_parse() -> TestResult {
    let config = WoodshopConfig::from_toml(
        "[provenance]\nrevision_id = \"abc\"\n[provenance.engine_versions]\nwood = \"1.2.0\"\n",
    )
    .map_err(|err| err.to_string())?;
    if config.provenance.engine_versions.get("wood").map(String::as_str) != Some("1.2.0") {
        return Err("engine version override missing".to_string());
    }
    Ok(())
}

#[test]
fn malformed_toml_is_a_parse_error() -> TestResult {
    match WoodshopConfig::from_toml("[server\n") {
        Err(ConfigError::Parse(_)) => Ok(()),
        other => Err(format!("expected parse error, got ok={}", other.is_ok())),
    }
}

#[test]
fn load_reads_explicit_file() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("woodshop.toml");
    fs::write(&path, "[logging]\nsink = \"none\"\n").map_err(|err| err.to_string())?;
    let config = WoodshopConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    if config.logging.sink != LogSink::None {
        return Err("sink should be none".to_string());
    }
    Ok(())
}

#[test]
fn missing_explicit_file_is_an_error() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("absent.toml");
    assert_invalid(WoodshopConfig::load(Some(&path)), "config io error")
}

#[test]
fn missing_default_file_yields_defaults() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let source = ConfigSource::Default(dir.path().join("woodshop.toml"));
    let config = WoodshopConfig::load_from(&source).map_err(|err| err.to_string())?;
    if config != WoodshopConfig::default() {
        return Err("expected default config".to_string());
    }
    Ok(())
}

#[test]
fn oversized_file_is_rejected() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path: PathBuf = dir.path().join("big.toml");
    let padding = format!("# {}\n", "x".repeat(1024 * 1024));
    fs::write(&path, padding).map_err(|err| err.to_string())?;
    assert_invalid(WoodshopConfig::load(Some(&path)), "exceeds size limit")
}
