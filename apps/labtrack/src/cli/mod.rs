//! # labtrack CLI Module
//!
//! This module implements the CLI interface for labtrack.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show overall, domain, and module readiness
//! - `lab` - Show one lab's checklist at its selected tier
//! - `toggle` - Flip one step
//! - `tier` - Show or select a lab's tier
//! - `complete` - Complete every step of one layer
//! - `domains` - List exam domains and their modules
//! - `guide` - Print a lab guide or one of its layers
//! - `validate` - Fetch layer results from the lab backend
//! - `prefs` - Show or update UI preferences
//! - `reset` - Forget all progress and tier selections
//! - `init` - Initialize a new database

mod commands;

use crate::config::{Backend, FileConfig, Overrides, Settings};
use clap::{Parser, Subcommand};
use labtrack_core::{LabTrackError, Theme, Tier};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// labtrack - Lab progress tracker
///
/// Tracks completed lab steps, tier selections, and exam readiness.
#[derive(Parser, Debug)]
#[command(name = "labtrack")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the progress database [default: labtrack.db]
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend [default: redb]
    #[arg(short = 'B', long, global = true, value_enum)]
    pub backend: Option<Backend>,

    /// Config file [default: ./labtrack.toml if present]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory lab guides are read from [default: docs]
    #[arg(long, global = true)]
    pub docs_root: Option<PathBuf>,

    /// Lab backend base URL [default: http://localhost:8000]
    #[arg(long, global = true)]
    pub backend_url: Option<String>,

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
        /// Host to bind to [default: 127.0.0.1]
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to [default: 8080]
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show overall, domain, and module readiness
    Status,

    /// Show a lab's checklist at its selected tier
    Lab {
        /// Lab id, e.g. generative
        lab: String,
    },

    /// Flip one step of a lab
    Toggle {
        /// Lab id
        lab: String,

        /// Step id
        step: String,
    },

    /// Show or select a lab's tier (core, advanced, expert)
    Tier {
        /// Lab id
        lab: String,

        /// Tier to select; omit to show the current one
        tier: Option<Tier>,
    },

    /// Mark every step of a layer complete
    Complete {
        /// Lab id
        lab: String,

        /// Layer number
        layer: u32,
    },

    /// List exam domains and their modules
    Domains,

    /// Print a lab guide
    Guide {
        /// Lab id
        lab: String,

        /// Print only this layer's section
        #[arg(short, long)]
        layer: Option<u32>,
    },

    /// Fetch validation results from the lab backend
    Validate,

    /// Show or update UI preferences
    Prefs {
        /// Theme (system, light, dark)
        #[arg(short, long)]
        theme: Option<Theme>,

        /// Collapse the sidebar
        #[arg(short, long)]
        sidebar_collapsed: Option<bool>,
    },

    /// Forget all progress and tier selections
    Reset {
        /// Skip the safety check
        #[arg(short, long)]
        yes: bool,
    },

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), LabTrackError> {
    let file = FileConfig::load(cli.config.as_deref())?;
    let (host, port) = match &cli.command {
        Some(Commands::Server { host, port }) => (host.clone(), *port),
        _ => (None, None),
    };
    let settings = Settings::resolve(
        Overrides {
            database: cli.database,
            backend: cli.backend,
            docs_root: cli.docs_root,
            backend_url: cli.backend_url,
            host,
            port,
        },
        file,
    );
    if cli.verbose {
        tracing::info!(?settings, "resolved settings");
    }
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { .. }) => cmd_server(&settings).await,
        Some(Commands::Status) | None => cmd_status(&settings, json_mode),
        Some(Commands::Lab { lab }) => cmd_lab(&settings, json_mode, &lab),
        Some(Commands::Toggle { lab, step }) => cmd_toggle(&settings, json_mode, &lab, &step),
        Some(Commands::Tier { lab, tier }) => cmd_tier(&settings, json_mode, &lab, tier),
        Some(Commands::Complete { lab, layer }) => {
            cmd_complete(&settings, json_mode, &lab, layer)
        }
        Some(Commands::Domains) => cmd_domains(json_mode),
        Some(Commands::Guide { lab, layer }) => cmd_guide(&settings, json_mode, &lab, layer),
        Some(Commands::Validate) => cmd_validate(&settings, json_mode).await,
        Some(Commands::Prefs {
            theme,
            sidebar_collapsed,
        }) => cmd_prefs(&settings, json_mode, theme, sidebar_collapsed),
        Some(Commands::Reset { yes }) => cmd_reset(&settings, yes),
        Some(Commands::Init { force }) => cmd_init(&settings, force),
    }
}
