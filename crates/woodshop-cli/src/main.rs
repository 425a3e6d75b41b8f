// crates/woodshop-cli/src/main.rs
// ============================================================================
// Module: Woodshop CLI Entry Point
// Description: Command dispatcher for the Woodshop tool server.
// Purpose: Serve tools, call them once from a shell, and check configuration.
// Dependencies: clap, serde_jcs, serde_json, tokio, woodshop-config, woodshop-mcp
// ============================================================================

//! ## Overview
//! `woodshop serve` runs the configured transport. `woodshop tools` lists or
//! calls built-in tools through the same validated pipeline the server uses,
//! so a shell call and a protocol call produce identical envelopes.
//! Structured output is canonical JSON on stdout; diagnostics go to stderr.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use woodshop_config::WoodshopConfig;
use woodshop_core::CallToolResult;
use woodshop_mcp::McpServer;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "woodshop", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected command.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the tool server on the configured transport.
    Serve(ConfigArgs),
    /// Inspect or call built-in tools.
    Tools {
        /// Tools subcommand.
        #[command(subcommand)]
        command: ToolsCommand,
    },
    /// Print the registry manifest.
    Manifest(ConfigArgs),
    /// Configuration utilities.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Shared `--config` flag.
#[derive(Args, Debug, Default)]
struct ConfigArgs {
    /// Path to `woodshop.toml`.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// `tools` subcommands.
#[derive(Subcommand, Debug)]
enum ToolsCommand {
    /// List tool descriptors as JSON.
    List(ConfigArgs),
    /// Call one tool and print its envelope.
    Call(ToolCallCommand),
}

/// Arguments for `tools call`.
#[derive(Args, Debug)]
struct ToolCallCommand {
    /// Tool name.
    #[arg(value_name = "NAME")]
    name: String,
    /// Inline JSON arguments.
    #[arg(long, value_name = "JSON", conflicts_with = "input_file")]
    input: Option<String>,
    /// File containing JSON arguments.
    #[arg(long, value_name = "PATH")]
    input_file: Option<PathBuf>,
    /// Configuration flags.
    #[command(flatten)]
    config: ConfigArgs,
}

/// `config` subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate a configuration file.
    Validate(ConfigArgs),
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a printable message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// Errors from bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => command_serve(&args).await,
        Commands::Tools {
            command,
        } => match command {
            ToolsCommand::List(args) => command_tools_list(&args),
            ToolsCommand::Call(command) => command_tools_call(command).await,
        },
        Commands::Manifest(args) => command_manifest(&args),
        Commands::Config {
            command: ConfigCommand::Validate(args),
        } => command_config_validate(&args),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(args: &ConfigArgs) -> CliResult<ExitCode> {
    let server = build_server(args)?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `tools list`.
fn command_tools_list(args: &ConfigArgs) -> CliResult<ExitCode> {
    let server = build_server(args)?;
    write_json(&server.router().list_tools())?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `tools call`.
async fn command_tools_call(command: ToolCallCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let arguments = read_arguments(
        command.input.as_deref(),
        command.input_file.as_deref(),
        config.server.max_body_bytes,
    )?;
    let server = McpServer::from_config(config)
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    let result = server
        .router()
        .call_tool(&command.name, arguments)
        .await
        .map_err(|err| CliError::new(err.to_string()))?;
    write_json(&result)?;
    Ok(call_exit_code(&result))
}

/// Executes `manifest`.
fn command_manifest(args: &ConfigArgs) -> CliResult<ExitCode> {
    let server = build_server(args)?;
    write_json(&server.router().manifest())?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `config validate`.
fn command_config_validate(args: &ConfigArgs) -> CliResult<ExitCode> {
    let _config = load_config(args)?;
    write_stdout_line("config ok").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads configuration from the flag, environment, or default path.
fn load_config(args: &ConfigArgs) -> CliResult<WoodshopConfig> {
    WoodshopConfig::load(args.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Loads configuration and builds the server.
fn build_server(args: &ConfigArgs) -> CliResult<McpServer> {
    let config = load_config(args)?;
    McpServer::from_config(config)
        .map_err(|err| CliError::new(format!("server init failed: {err}")))
}

/// Maps an envelope to the process exit code.
fn call_exit_code(result: &CallToolResult) -> ExitCode {
    if result.is_error { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

/// Reads tool arguments from `--input`, `--input-file`, or neither (`{}`).
fn read_arguments(
    inline: Option<&str>,
    file: Option<&Path>,
    max_bytes: usize,
) -> CliResult<Value> {
    let bytes = match (inline, file) {
        (Some(text), _) => {
            if text.len() > max_bytes {
                return Err(CliError::new(format!(
                    "--input exceeds {max_bytes} bytes ({} bytes)",
                    text.len()
                )));
            }
            text.as_bytes().to_vec()
        }
        (None, Some(path)) => read_bytes_with_limit(path, max_bytes).map_err(|err| match err {
            ReadLimitError::Io(err) => {
                CliError::new(format!("failed to read {}: {err}", path.display()))
            }
            ReadLimitError::TooLarge {
                size,
                limit,
            } => CliError::new(format!(
                "{} exceeds {limit} bytes ({size} bytes)",
                path.display()
            )),
        })?,
        (None, None) => return Ok(Value::Object(serde_json::Map::new())),
    };
    serde_json::from_slice(&bytes)
        .map_err(|err| CliError::new(format!("tool arguments are not valid json: {err}")))
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let size = file.metadata().map_err(ReadLimitError::Io)?.len();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1)).read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Writes canonical JSON followed by a newline to stdout.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let mut bytes = serde_jcs::to_vec(value)
        .map_err(|err| CliError::new(format!("failed to render json: {err}")))?;
    bytes.push(b'\n');
    std::io::stdout().write_all(&bytes).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
