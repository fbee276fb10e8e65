//! # GTSS Signal Inventory
//!
//! The main binary for the GTSS traffic signal inventory.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for store and export operations
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            apps/gtss (THE BINARY)            │
//! │                                              │
//! │   ┌─────────────┐        ┌─────────────┐     │
//! │   │    CLI      │        │  HTTP API   │     │
//! │   │   (clap)    │        │   (axum)    │     │
//! │   └──────┬──────┘        └──────┬──────┘     │
//! │          └───────────┬──────────┘            │
//! │                      ▼                       │
//! │              ┌───────────────┐               │
//! │              │   gtss-core   │               │
//! │              │  (THE LOGIC)  │               │
//! │              └───────────────┘               │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! gtss server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! gtss status
//! gtss export -o gtss-export.zip
//! gtss export -o phases.csv --document phases
//! gtss import -i gtss-export.zip
//! ```

use clap::Parser;
use gtss::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // GTSS_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("GTSS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gtss=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  GTSS Signal Inventory v{}
  Agencies • Signals • Phases • Detectors
"#,
        env!("CARGO_PKG_VERSION")
    );
}
