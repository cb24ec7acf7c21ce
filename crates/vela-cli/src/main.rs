//! Vela CLI - Playback Resolution Tool
//!
//! Features:
//! - Resolve a stream catalog snapshot into a playback plan
//! - Probe manifest documents (DASH/HLS/SmoothStreaming)

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

/// Vela CLI - Playback resolution toolkit
#[derive(Parser)]
#[command(name = "vela-cli")]
#[command(version)]
#[command(about = "Stream catalog resolution toolkit", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a catalog snapshot into a playback plan
    Resolve {
        /// Path to a content info JSON file
        catalog: PathBuf,

        /// Quality label to request (e.g. 720p)
        #[arg(short, long)]
        quality: Option<String>,

        /// Preferred default quality tier
        #[arg(long)]
        prefer: Option<String>,

        /// Prefer the lower half of the quality ladder
        #[arg(long)]
        limit_data: bool,

        /// Output the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Probe a manifest document
    Probe {
        /// Path to a manifest file (MPD, m3u8 or ism)
        manifest: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .init();

    match cli.command {
        Commands::Resolve {
            catalog,
            quality,
            prefer,
            limit_data,
            json,
        } => {
            commands::resolve(&catalog, quality.as_deref(), prefer, limit_data, json).await?;
        }
        Commands::Probe { manifest } => {
            commands::probe(&manifest).await?;
        }
    }

    Ok(())
}
