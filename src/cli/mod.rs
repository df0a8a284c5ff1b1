//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{CheckCommand, RunCommand, WatchCommand};

/// Run native CI/CD pipelines locally
#[derive(Debug, Parser, Clone)]
#[command(name = "pitstop")]
#[command(version = "0.1.0")]
#[command(about = "Run native CI/CD pipelines locally, re-running on file change", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Watch the project and run its pipeline on every change
    Watch(WatchCommand),

    /// Run the pipeline once and exit
    Run(RunCommand),

    /// Detect the platform and validate the pipeline definition
    Check(CheckCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}

use std::ffi::OsString;
