//! CLI binary for qr-code-reader.
//!
//! A thin shim over the library crate. With no subcommand it runs the MCP
//! server on stdio; `decode` and `check` expose the reader and the safety
//! validator directly.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use qr_code_reader::read::reference_from_args;
use qr_code_reader::{
    is_safe_with, read_qr_blocking, serve_stdio, McpServer, ReaderConfig, RqrrDetector,
    ToolGateway,
};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run as an MCP server on stdio (what MCP clients launch)
  qr-code-reader
  qr-code-reader serve

  # Decode a file
  qr-code-reader decode ticket.png

  # Decode base64 image data (a data: URL prefix is accepted)
  qr-code-reader decode --data "data:image/png;base64,iVBORw0KGgo..."

  # Reject oversized images before decoding
  qr-code-reader decode --safety-check scan.tiff

  # Only run the size/dimension pre-check
  qr-code-reader check scan.tiff

MCP CLIENT CONFIGURATION:
  {
    "mcpServers": {
      "qr-code-reader": { "command": "qr-code-reader", "args": ["serve"] }
    }
  }

ENVIRONMENT VARIABLES:
  RUST_LOG                     Log filter, overrides --verbose/--quiet
  QR_READER_SAFETY_CHECK       Run the safety validator before decoding
  QR_READER_MAX_FILE_BYTES     File size ceiling (default 52428800)
  QR_READER_MAX_DIMENSION      Per-axis pixel ceiling (default 10000)

Supported formats: .jpg .jpeg .png .bmp .tiff .webp
"#;

/// Decode QR codes from images.
#[derive(Parser, Debug)]
#[command(
    name = "qr-code-reader",
    version,
    about = "Decode QR codes from images: MCP tool server and CLI",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Run the safety validator on path inputs before decoding.
    #[arg(long, global = true, env = "QR_READER_SAFETY_CHECK")]
    safety_check: bool,

    /// File size ceiling in bytes for the safety validator.
    #[arg(long, global = true, env = "QR_READER_MAX_FILE_BYTES", default_value_t = 52_428_800)]
    max_file_bytes: u64,

    /// Per-axis pixel ceiling for the safety validator.
    #[arg(long, global = true, env = "QR_READER_MAX_DIMENSION", default_value_t = 10_000)]
    max_dimension: u32,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "QR_READER_VERBOSE")]
    verbose: bool,

    /// Suppress all logs except errors.
    #[arg(short, long, global = true, env = "QR_READER_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the `qr_code_read` tool over MCP on stdin/stdout (default).
    Serve,

    /// Decode one image and print its payload.
    Decode {
        /// Image file to read.
        path: Option<PathBuf>,

        /// Base64 image data instead of a path.
        #[arg(long, conflicts_with = "path")]
        data: Option<String>,
    },

    /// Check an image file against the size and dimension limits.
    Check {
        /// Image file to check.
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // stdout is the protocol channel in serve mode, so logs go to stderr.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = build_config(&cli)?;

    match cli.command {
        None | Some(Command::Serve) => serve(config),
        Some(Command::Decode { path, data }) => {
            let path = path.map(|p| p.to_string_lossy().into_owned());
            decode(path.as_deref(), data.as_deref(), &config)
        }
        Some(Command::Check { path }) => {
            if is_safe_with(&path, &config) {
                println!("safe");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("unsafe");
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

/// Map CLI args to `ReaderConfig`.
fn build_config(cli: &Cli) -> Result<ReaderConfig> {
    ReaderConfig::builder()
        .max_file_bytes(cli.max_file_bytes)
        .max_dimension(cli.max_dimension)
        .safety_check(cli.safety_check)
        .build()
        .context("Invalid configuration")
}

fn serve(config: ReaderConfig) -> Result<ExitCode> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")?;

    let server = McpServer::new(ToolGateway::new(config));
    runtime
        .block_on(serve_stdio(server))
        .context("MCP server failed")?;
    Ok(ExitCode::SUCCESS)
}

fn decode(path: Option<&str>, data: Option<&str>, config: &ReaderConfig) -> Result<ExitCode> {
    let reference = reference_from_args(path, data)?;
    let payload = read_qr_blocking(&reference, config, &RqrrDetector::new())
        .with_context(|| format!("Error reading QR code from {}", reference.describe()))?;
    println!("{payload}");
    Ok(ExitCode::SUCCESS)
}
