//! Command-line interface for tablediff

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tablediff")]
#[command(about = "Compare two keyed tables row by row")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare two CSV files by key
    Diff {
        /// Left-hand CSV file
        left: PathBuf,

        /// Right-hand CSV file
        right: PathBuf,

        /// Key column (repeat for a composite key)
        #[arg(short, long = "key", required = true)]
        keys: Vec<String>,

        /// Read inputs in batches of this many rows and merge them externally
        #[arg(long)]
        batch_size: Option<usize>,

        /// Inputs are already sorted by key
        #[arg(long)]
        no_sort: bool,

        /// Field delimiter of both inputs
        #[arg(long, default_value = ",")]
        delimiter: char,

        /// Directory for staging files (defaults to the system temp dir)
        #[arg(long)]
        staging_dir: Option<PathBuf>,

        /// Rows read per page from staging files
        #[arg(long)]
        page_size: Option<usize>,

        /// Include identical rows in the output
        #[arg(long)]
        show_identical: bool,

        /// Only print the summary
        #[arg(long)]
        summary_only: bool,

        /// Output as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
