//! CLI command definitions

use clap::Args;
use std::path::PathBuf;

/// Watch the project and run its pipeline on every change
#[derive(Debug, Args, Clone)]
pub struct WatchCommand {
    /// Project root to watch (defaults to the current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,
}

/// Run the pipeline once and exit
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Project root (defaults to the current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,
}

/// Detect the platform and validate the pipeline definition
#[derive(Debug, Args, Clone)]
pub struct CheckCommand {
    /// Project root (defaults to the current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Dump the parsed blueprint as JSON
    #[arg(long)]
    pub json: bool,
}
