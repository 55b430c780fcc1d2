//! Command-line interface for recondiff

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "recondiff")]
#[command(about = "A sample-based reconciliation tool for verifying data migrations")]
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
    /// Compare one origin dataset against one destination table
    Compare {
        /// Origin rows file (JSON array of row objects)
        origin: String,

        /// Destination rows file (JSON array of row objects)
        dest: String,

        /// Comma-separated key columns identifying a logical record
        #[arg(long)]
        key: String,

        /// Rows to sample from each side (auto-calculated when omitted)
        #[arg(long, value_parser = validate_sample_size)]
        sample: Option<usize>,

        /// Sampling method: "random" or "ordered"
        #[arg(long, default_value = "random")]
        method: String,

        /// Compare transform-derived columns present on a single side
        #[arg(long)]
        include_transform_columns: bool,

        /// Logical origin identifier used in reports (defaults to file stem)
        #[arg(long)]
        output_id: Option<String>,

        /// Logical table name used in reports (defaults to file stem)
        #[arg(long)]
        table_name: Option<String>,

        /// Output the result as JSON
        #[arg(long)]
        json: bool,

        /// Also write a detailed JSON report under this directory
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },

    /// Run every job of a jobs config file
    Batch {
        /// Jobs config file (JSON array of job records)
        jobs: String,

        /// Directory of origin row files, one <output id>.json per dataset
        #[arg(long)]
        origin_dir: PathBuf,

        /// Directory of destination row files, one <table name>.json per table
        #[arg(long)]
        dest_dir: PathBuf,

        /// Sampling method: "random" or "ordered"
        #[arg(long, default_value = "random")]
        method: String,

        /// How many jobs run in parallel
        #[arg(long, value_parser = validate_sample_size)]
        concurrency: Option<usize>,

        /// Output the run summary as JSON
        #[arg(long)]
        json: bool,

        /// Also write detailed JSON reports under this directory
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },

    /// Parse a jobs config file and show what would run
    Validate {
        /// Jobs config file (JSON array of job records)
        jobs: String,
    },
}

/// Validate that a count argument is greater than 0
fn validate_sample_size(s: &str) -> Result<usize, String> {
    let size: usize = s
        .parse()
        .map_err(|_| format!("Invalid count: '{}'. Must be a positive integer.", s))?;

    if size == 0 {
        return Err("Count must be greater than 0".to_string());
    }

    Ok(size)
}
