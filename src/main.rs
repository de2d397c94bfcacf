//! # Region Atlas CLI (`atlas`)
//!
//! The `atlas` binary runs the combine pipeline: it reads the cached region
//! and division datasets, resolves each division's boundary geometry
//! (fetching and caching it on first sight), and writes one nested JSON
//! document mapping region ids to regions with their divisions embedded.
//!
//! ## Usage
//!
//! ```bash
//! # Run with the built-in paths (data/cache/*.json → data/data.json)
//! atlas
//!
//! # Preview what a run would fetch
//! atlas --dry-run
//!
//! # Custom paths
//! atlas --config ./config/atlas.toml
//! ```

mod cache;
mod combine;
mod config;
mod fetch;
mod load;
mod models;
mod progress;
mod source;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// Region Atlas — merge cached region and division datasets into a single
/// nested document, caching each division's boundary geometry locally.
#[derive(Parser)]
#[command(
    name = "atlas",
    about = "Merge cached region and division datasets into a single nested document",
    version,
    long_about = "Region Atlas reads the locally cached region and division datasets, \
    resolves each division's boundary geometry from OpenStreetMap or Wikimedia Commons \
    (fetching and caching it on first sight), and writes one nested JSON document \
    mapping region ids to regions with their divisions embedded."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/atlas.toml`. The built-in paths apply when the
    /// file does not exist. See `config/atlas.example.toml`.
    #[arg(long, default_value = "./config/atlas.toml")]
    config: PathBuf,

    /// Resolve sources and report counts without fetching or writing.
    #[arg(long)]
    dry_run: bool,

    /// Process at most this many divisions.
    #[arg(long)]
    limit: Option<usize>,

    /// Progress mode: `human`, `json`, or `off`.
    #[arg(long, default_value = "human")]
    progress: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        config::Config::default()
    };

    let mode = progress::ProgressMode::parse(&cli.progress)?;
    let reporter = mode.reporter();
    let transport = fetch::HttpFetch::new(&cfg.fetch)?;

    combine::run_combine(&cfg, &transport, reporter.as_ref(), cli.dry_run, cli.limit)
}
