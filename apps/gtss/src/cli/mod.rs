//! # GTSS CLI Module
//!
//! This module implements the CLI interface for the GTSS inventory.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show record counts
//! - `init` - Initialize new database
//! - `export` - Write the GTSS archive (or one document) to a file
//! - `import` - Replace the store contents from a GTSS archive
//! - `agency` - Show, set or clear the agency
//! - `signal`, `phase`, `detector` - List, get, add, update or delete records
//!
//! Record payloads are the same camelCase JSON the HTTP API accepts, passed
//! inline with `--data '{...}'` or read from a file with `--data @path`.

mod commands;

use crate::config::{Backend, Config};
use clap::{Parser, Subcommand};
use gtss_core::{DocumentKind, GtssError};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// GTSS Signal Inventory
///
/// Record store and GTSS exporter for traffic signal agencies.
#[derive(Parser, Debug)]
#[command(name = "gtss")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML config file (default: ./gtss.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the record database
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend
    #[arg(short = 'B', long, global = true, value_enum)]
    pub backend: Option<Backend>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show record counts
    Status,

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },

    /// Export the GTSS archive
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Write a single document (agency, signals, phases, detectors)
        #[arg(short, long)]
        document: Option<DocumentKind>,
    },

    /// Replace all records with the contents of a GTSS archive
    Import {
        /// Input archive path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Show the agency
    Agency {
        /// Save the agency from a JSON payload (or @file)
        #[arg(long, conflicts_with = "clear")]
        set: Option<String>,

        /// Remove the agency instead
        #[arg(long)]
        clear: bool,
    },

    /// Manage signals (delete cascades to phases and detectors)
    Signal {
        #[command(subcommand)]
        action: RecordAction,
    },

    /// Manage phases
    Phase {
        #[command(subcommand)]
        action: RecordAction,
    },

    /// Manage detectors
    Detector {
        #[command(subcommand)]
        action: RecordAction,
    },
}

/// Operations shared by the record commands.
///
/// Signals are keyed by `signalId`, phases and detectors by record id.
#[derive(Subcommand, Debug)]
pub enum RecordAction {
    /// List records
    List {
        /// Only records of this signal
        #[arg(short, long)]
        signal: Option<String>,
    },

    /// Show one record
    Get { key: String },

    /// Save a new record from a JSON payload (or @file)
    Add {
        #[arg(short, long)]
        data: String,
    },

    /// Merge a partial JSON payload (or @file) into a record
    Update {
        key: String,

        #[arg(short, long)]
        data: String,
    },

    /// Delete a record
    Delete { key: String },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Resolve file, environment and flag layers into one config.
pub fn resolve_config(cli: &Cli) -> Result<Config, GtssError> {
    let mut config = Config::load_file(cli.config.as_deref())?;
    config.apply_process_env()?;

    if let Some(database) = &cli.database {
        config.database.clone_from(database);
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(Commands::Server { host, port }) = &cli.command {
        if let Some(host) = host {
            config.host.clone_from(host);
        }
        if let Some(port) = port {
            config.port = *port;
        }
    }
    Ok(config)
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), GtssError> {
    let config = resolve_config(&cli)?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { .. }) => cmd_server(&config).await,
        Some(Commands::Status) => cmd_status(&config, json_mode),
        Some(Commands::Init { force }) => cmd_init(&config, force),
        Some(Commands::Export { output, document }) => {
            cmd_export(&config, json_mode, &output, document)
        }
        Some(Commands::Import { input }) => cmd_import(&config, json_mode, &input),
        Some(Commands::Agency { set, clear }) => {
            cmd_agency(&config, json_mode, set.as_deref(), clear)
        }
        Some(Commands::Signal { action }) => cmd_signal(&config, json_mode, action),
        Some(Commands::Phase { action }) => cmd_phase(&config, json_mode, action),
        Some(Commands::Detector { action }) => cmd_detector(&config, json_mode, action),
        None => {
            // No subcommand - show status by default
            cmd_status(&config, json_mode)
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "gtss",
            "-B",
            "file",
            "-D",
            "inventory.bin",
            "server",
            "--port",
            "9090",
        ]);
        let config = resolve_config(&cli).expect("resolve");
        assert_eq!(config.backend, Backend::File);
        assert_eq!(config.database, PathBuf::from("inventory.bin"));
        assert_eq!(config.port, 9090);
    }

    #[test]
    fn document_flag_parses_kind() {
        let cli = Cli::parse_from(["gtss", "export", "-o", "out.csv", "--document", "phases.csv"]);
        match cli.command {
            Some(Commands::Export { document, .. }) => {
                assert_eq!(document, Some(DocumentKind::Phases));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unknown_backend_rejected() {
        assert!(Cli::try_parse_from(["gtss", "-B", "sqlite", "status"]).is_err());
    }

    #[test]
    fn record_subcommands_parse() {
        let cli = Cli::parse_from(["gtss", "phase", "update", "abc", "--data", r#"{"phase":4}"#]);
        match cli.command {
            Some(Commands::Phase {
                action: RecordAction::Update { key, data },
            }) => {
                assert_eq!(key, "abc");
                assert_eq!(data, r#"{"phase":4}"#);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::parse_from(["gtss", "detector", "list", "--signal", "SIG_001"]);
        match cli.command {
            Some(Commands::Detector {
                action: RecordAction::List { signal },
            }) => assert_eq!(signal.as_deref(), Some("SIG_001")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn agency_set_conflicts_with_clear() {
        assert!(Cli::try_parse_from(["gtss", "agency", "--set", "{}", "--clear"]).is_err());
        assert!(Cli::try_parse_from(["gtss", "signal", "add"]).is_err());
    }
}
