//! # labtrack - Lab Progress Server
//!
//! The main binary for labtrack.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for progress, tiers, readiness, and guides
//! - Validation results from the lab backend
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    apps/labtrack (THE BINARY)                │
//! │                                                              │
//! │  ┌─────────────┐    ┌─────────────┐    ┌────────────────┐   │
//! │  │   CLI       │    │   HTTP API  │    │ Backend client │   │
//! │  │  (clap)     │    │   (axum)    │    │   (reqwest)    │   │
//! │  └──────┬──────┘    └──────┬──────┘    └────────────────┘   │
//! │         └─────────┬────────┘                                 │
//! │                   ▼                                          │
//! │           ┌───────────────┐                                  │
//! │           │ labtrack-core │                                  │
//! │           └───────────────┘                                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! labtrack server --host 0.0.0.0 --port 8080
//! labtrack status
//! labtrack toggle generative setup-openai-resource
//! labtrack tier generative advanced
//! ```

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // LABTRACK_LOG_FORMAT=json switches to machine-parseable output.
    let log_format = std::env::var("LABTRACK_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "labtrack=info,labtrack_core=info,tower_http=debug".into());

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
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = labtrack::cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = labtrack::cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  ┬  ┌─┐┌┐ ┌┬┐┬─┐┌─┐┌─┐┬┌─
  │  ├─┤├┴┐ │ ├┬┘├─┤│  ├┴┐
  ┴─┘┴ ┴└─┘ ┴ ┴└─┴ ┴└─┘┴ ┴

  Lab progress tracker v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
