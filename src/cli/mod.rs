//! CLI module for lostuser
//!
//! Provides command-line interface for:
//! - watch: Run the monitor over stdin events and a snapshot file
//! - check: One-shot quorum and promotion report

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, run, run_command, watch, Config};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_lost_user, write_response};
