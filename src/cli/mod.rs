//! CLI module for pqlmock
//!
//! Provides command-line interface for:
//! - init: Write a default config and create the data directories
//! - eval: One-shot request handling
//! - start: Line-delimited request loop over stdin/stdout

mod args;
mod commands;
mod config;
mod errors;
mod io;
mod session;

pub use args::{Cli, Command, DEFAULT_CONFIG};
pub use commands::{eval, eval_with, init, initialize, run, run_command, serve, start, write_default_config};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, read_requests, write_error, write_line, write_response};
pub use session::{Response, Session};
