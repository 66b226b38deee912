#![deny(unsafe_code)]

//! bzlnav CLI: build labels and BUILD file definitions for editors.
//!
//! Editor commands are written to stdout as Vim ex commands (or JSON with
//! `--format json`); logs go to stderr.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use bzlnav_config::AppConfig;
use bzlnav_core::{
    ActionOutcome, BufferSnapshot, Cursor, ExScriptHost, Navigator, WorkspaceLocator,
};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::AsyncReadExt;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Resolve Bazel build labels and jump to BUILD file definitions.
#[derive(Parser)]
#[command(
    name = "bzlnav",
    version,
    long_version = bzlnav_core::build_info::LONG_VERSION,
    about,
    long_about = None
)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, global = true, default_value = "bzlnav.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = Format::Text)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Vim ex commands, one per line.
    Text,
    /// The action outcome as JSON.
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the build label of the target that lists a file.
    Label {
        /// Source file to resolve.
        file: PathBuf,
    },

    /// Jump to the definition under the cursor in a BUILD or .bzl file.
    Definition {
        /// Buffer file.
        file: PathBuf,

        /// Cursor row, 1-based.
        #[arg(long)]
        row: usize,

        /// Cursor column, 0-based byte offset.
        #[arg(long, default_value_t = 0)]
        col: usize,

        /// Read the buffer contents from stdin instead of the file.
        #[arg(long)]
        stdin: bool,
    },

    /// Print the workspace root containing a file.
    Root {
        /// Any path inside the workspace.
        file: PathBuf,
    },

    /// Validate and display configuration.
    Config {
        /// Show the resolved configuration.
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let loaded = load_config(&cli.config).await?;
    init_tracing(
        cli.verbose,
        loaded.as_ref().map(|c| c.logging.level.as_str()),
    );
    let config = loaded.unwrap_or_else(|| {
        info!(path = %cli.config.display(), "Config file not found, using defaults");
        AppConfig::default()
    });

    match cli.command {
        Commands::Label { file } => cmd_label(&config, cli.format, file).await,
        Commands::Definition {
            file,
            row,
            col,
            stdin,
        } => cmd_definition(&config, cli.format, file, Cursor::new(row, col), stdin).await,
        Commands::Root { file } => cmd_root(&config, cli.format, &file),
        Commands::Config { show } => cmd_config(&config, &cli.config, show),
    }
}

/// `RUST_LOG` wins, then `-v`, then the configured level.
fn init_tracing(verbose: u8, configured: Option<&str>) {
    let filter = match verbose {
        0 => configured.unwrap_or("warn"),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn cmd_label(config: &AppConfig, format: Format, file: PathBuf) -> Result<ExitCode> {
    let navigator = Navigator::from_config(config);
    let mut host = ExScriptHost::new(BufferSnapshot::new(file, Vec::new(), Cursor::new(1, 0)));
    let outcome = navigator.show_label(&mut host).await;
    emit(format, &outcome, &host)
}

async fn cmd_definition(
    config: &AppConfig,
    format: Format,
    file: PathBuf,
    cursor: Cursor,
    stdin: bool,
) -> Result<ExitCode> {
    let snapshot = if stdin {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("failed to read buffer from stdin")?;
        BufferSnapshot::from_text(file, &text, cursor)
    } else {
        BufferSnapshot::read(&file, cursor)
            .await
            .with_context(|| format!("failed to read {}", file.display()))?
    };
    debug!(
        path = %snapshot.path().display(),
        lines = snapshot.lines().len(),
        row = cursor.row,
        col = cursor.col,
        "Buffer loaded"
    );

    let navigator = Navigator::from_config(config);
    let mut host = ExScriptHost::new(snapshot);
    let outcome = navigator.find_definition(&mut host).await;
    emit(format, &outcome, &host)
}

fn cmd_root(config: &AppConfig, format: Format, file: &Path) -> Result<ExitCode> {
    let root = WorkspaceLocator::from_config(&config.workspace).locate(file)?;
    match format {
        Format::Text => println!("{}", root.display()),
        Format::Json => println!("{}", serde_json::json!({ "root": root })),
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_config(config: &AppConfig, config_path: &Path, show: bool) -> Result<ExitCode> {
    if show {
        let toml_str = toml::to_string_pretty(config).context("failed to render config")?;
        println!("{toml_str}");
    } else {
        println!("Configuration at '{}' is valid.", config_path.display());
    }
    Ok(ExitCode::SUCCESS)
}

/// Print the outcome for the editor. Failures still print their commands
/// (the error echo) but exit non-zero.
fn emit(format: Format, outcome: &ActionOutcome, host: &ExScriptHost) -> Result<ExitCode> {
    match format {
        Format::Text => {
            let script = host.script();
            if !script.is_empty() {
                println!("{script}");
            }
        }
        Format::Json => {
            let json = serde_json::to_string(outcome).context("failed to encode outcome")?;
            println!("{json}");
        }
    }
    Ok(if outcome.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Load the config file. A missing file is `None`; the caller falls back to
/// defaults once logging is up.
async fn load_config(path: &Path) -> Result<Option<AppConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let config = AppConfig::load(path)
        .await
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(Some(config))
}
