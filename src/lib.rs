//! # recondiff
//!
//! A sample-based reconciliation engine for verifying that a data migration
//! preserved row content and schema semantics between an origin dataset and
//! a migrated destination table.

pub mod align;
pub mod batch;
pub mod cli;
pub mod commands;
pub mod compare;
pub mod config;
pub mod error;
pub mod progress;
pub mod report;
pub mod sampler;
pub mod source;
pub mod value;

pub use batch::{BatchRunner, RunSummary};
pub use compare::{JobComparator, JobResult, JobStatus};
pub use config::{JobSpec, Settings};
pub use error::{RecondiffError, Result};

/// Default number of rows sampled per job when nothing else is configured
pub const DEFAULT_SAMPLE_SIZE: usize = 1000;

/// Default relative tolerance for float cell comparison
pub const DEFAULT_FLOAT_TOLERANCE: f64 = 1e-9;

/// Fixed seed for reproducible random sampling
pub const DEFAULT_RANDOM_SEED: u64 = 42;

/// Default number of jobs compared in parallel
pub const DEFAULT_JOB_CONCURRENCY: usize = 4;
