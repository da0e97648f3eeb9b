//! CLI argument definitions using clap
//!
//! Commands:
//! - lostuser watch --config <path>
//! - lostuser check --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// lostuser - report replicated resources that lost their active user
#[derive(Parser, Debug)]
#[command(name = "lostuser")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Watch may-promote events from stdin and print resources that lost their user
    Watch {
        /// Path to configuration file
        #[arg(long, default_value = "./lostuser.json")]
        config: PathBuf,
    },

    /// Print quorum and promotion status of every resource in the snapshot
    Check {
        /// Path to configuration file
        #[arg(long, default_value = "./lostuser.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
