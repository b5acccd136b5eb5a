//! CLI argument definitions using clap
//!
//! Commands:
//! - pqlmock init --config <path>
//! - pqlmock eval --config <path>
//! - pqlmock start --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default configuration file location
pub const DEFAULT_CONFIG: &str = "./pqlmock.json";

/// pqlmock - declarative mock response renderer
#[derive(Parser, Debug)]
#[command(name = "pqlmock")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default config and create the data directories
    Init {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },

    /// Handle one request from stdin and exit
    Eval {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },

    /// Serve newline-delimited requests from stdin until EOF
    Start {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
