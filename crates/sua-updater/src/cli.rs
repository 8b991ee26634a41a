//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::Parser;

/// SUA updater - installs, updates and launches SUA
#[derive(Parser, Debug)]
#[command(name = "sua-updater")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to an updater config file (replaces ~/.sua-updater/config.yaml)
    #[arg(short, long)]
    pub config: Option<Utf8PathBuf>,
}
