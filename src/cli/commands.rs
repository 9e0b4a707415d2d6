//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - serve: run the mock paginated API
//! - scroll: scroll a feed to the end through the loader
//! - calendar: print generated weeks

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// scrollfeed - infinite-scroll loader, mock paginated API and calendar weeks
#[derive(Parser, Debug)]
#[command(name = "scrollfeed")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the mock paginated API
    Serve {
        /// Address to bind (overrides config)
        #[arg(short, long)]
        addr: Option<String>,

        /// Artificial latency per request in milliseconds
        #[arg(short, long)]
        delay_ms: Option<u64>,

        /// Share of requests that fail, 0.0 to 1.0
        #[arg(short, long)]
        failure_rate: Option<f64>,
    },

    /// Scroll a feed to the end through the loader
    Scroll {
        /// Base URL of a running mock API; uses an in-process mock when omitted
        #[arg(short, long)]
        url: Option<String>,

        /// Retries allowed per failed page
        #[arg(short = 'r', long, default_value_t = 3)]
        max_retries: u32,
    },

    /// Print generated calendar weeks
    Calendar {
        /// First date to cover (YYYY-MM-DD); defaults to today
        #[arg(short, long)]
        start: Option<String>,

        /// Number of weeks (overrides config)
        #[arg(short, long)]
        weeks: Option<usize>,

        /// Print JSON instead of a table
        #[arg(short, long)]
        json: bool,
    },
}
