//! CLI command definitions using clap.
//!
//! - config: print the effective configuration
//! - catalog: list capabilities from a catalogue file
//! - sagas / saga: inspect persisted compensation sagas
//! - compare: score two outputs with the heuristic verifier

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Phasegate - gated multi-agent phase execution
#[derive(Parser, Debug)]
#[command(name = "phasegate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the effective configuration as YAML
    Config,

    /// List capabilities in a catalogue file and whether policy allows them
    Catalog {
        /// TOML catalogue (defaults to catalogue.path from config)
        file: Option<PathBuf>,
    },

    /// List persisted sagas
    Sagas {
        /// Filter by status (pending, running, completed, compensating, compensated, compensation_failed)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Show one saga and its step results
    Saga {
        /// Saga ID
        id: String,
    },

    /// Compare two outputs and report whether the candidate improves on the baseline
    Compare {
        /// File with the baseline output
        baseline: PathBuf,

        /// File with the candidate output
        candidate: PathBuf,
    },
}
