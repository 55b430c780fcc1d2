//! Command implementations for the recondiff CLI
//!
//! Thin I/O glue: resolve files and flags into core types, run the engine,
//! hand results to reporters. No comparison logic lives here.

use crate::batch::BatchRunner;
use crate::cli::Commands;
use crate::compare::{JobComparator, JobStatus, Tolerance};
use crate::config::{JobConfigReader, JobSpec, Settings};
use crate::error::{RecondiffError, Result};
use crate::report::{ConsoleReporter, JsonReporter, MultiReporter, Reporter};
use crate::sampler::{SampleMethod, Sampler};
use crate::source::{FileSourceFactory, JsonRowSource, RowSource};
use std::path::{Path, PathBuf};

/// Execute a command
pub fn execute_command(command: Commands, settings: &Settings) -> Result<()> {
    match command {
        Commands::Compare {
            origin,
            dest,
            key,
            sample,
            method,
            include_transform_columns,
            output_id,
            table_name,
            json,
            report_dir,
        } => compare_command(
            settings,
            &origin,
            &dest,
            &key,
            sample,
            &method,
            include_transform_columns,
            output_id,
            table_name,
            json,
            report_dir,
        ),
        Commands::Batch {
            jobs,
            origin_dir,
            dest_dir,
            method,
            concurrency,
            json,
            report_dir,
        } => batch_command(
            settings,
            &jobs,
            origin_dir,
            dest_dir,
            &method,
            concurrency,
            json,
            report_dir,
        ),
        Commands::Validate { jobs } => validate_command(settings, &jobs),
    }
}

/// Compare one origin file against one destination file
#[allow(clippy::too_many_arguments)]
fn compare_command(
    settings: &Settings,
    origin: &str,
    dest: &str,
    key: &str,
    sample: Option<usize>,
    method: &str,
    include_transform_columns: bool,
    output_id: Option<String>,
    table_name: Option<String>,
    json: bool,
    report_dir: Option<PathBuf>,
) -> Result<()> {
    let method = SampleMethod::parse(method).map_err(RecondiffError::invalid_configuration)?;

    let key_columns: Vec<String> = key
        .split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if key_columns.is_empty() {
        return Err(RecondiffError::invalid_configuration(
            "--key must list at least one column",
        ));
    }

    let output_id = output_id.unwrap_or_else(|| file_stem(origin));
    let table_name = table_name.unwrap_or_else(|| file_stem(dest));

    let origin_source = JsonRowSource::new(output_id.clone(), origin);
    let dest_source = JsonRowSource::new(table_name.clone(), dest);

    let sample_size = match sample {
        Some(size) => size,
        None => match origin_source.total_rows() {
            Ok(Some(total)) => {
                let size = Sampler::recommended_sample_size(total);
                log::info!("Auto-calculated sample size: {} of {} rows", size, total);
                size.max(1)
            }
            _ => settings.default_sample_size,
        },
    };

    let job = JobSpec {
        output_id,
        table_name,
        key_columns,
        include_transform_columns,
        sample_size,
        notes: None,
    };

    let comparator = JobComparator::with_tolerance(
        method,
        Tolerance {
            float_relative: settings.float_tolerance,
        },
    );

    let spinner = (!json).then(|| crate::progress::create_spinner("Comparing samples..."));
    let result = comparator.run(&job, &origin_source, &dest_source)?;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        ConsoleReporter::new().report_job(&result)?;
    }
    if let Some(dir) = report_dir {
        JsonReporter::new(dir).report_job(&result)?;
    }

    if result.status == JobStatus::Failed {
        return Err(RecondiffError::comparison_failed(
            result.error.unwrap_or_else(|| "unknown".to_string()),
        ));
    }
    Ok(())
}

/// Run every job of a jobs config file
#[allow(clippy::too_many_arguments)]
fn batch_command(
    settings: &Settings,
    jobs_path: &str,
    origin_dir: PathBuf,
    dest_dir: PathBuf,
    method: &str,
    concurrency: Option<usize>,
    json: bool,
    report_dir: Option<PathBuf>,
) -> Result<()> {
    let method = SampleMethod::parse(method).map_err(RecondiffError::invalid_configuration)?;

    let reader = JobConfigReader::new(settings.default_sample_size);
    let jobs = reader.read_file(Path::new(jobs_path))?;
    if jobs.is_empty() {
        println!("No jobs to run.");
        return Ok(());
    }

    let factory = FileSourceFactory::new(origin_dir, dest_dir);

    let mut reporters: Vec<Box<dyn Reporter>> = Vec::new();
    if !json {
        reporters.push(Box::new(ConsoleReporter::new()));
    }
    if let Some(dir) = report_dir {
        reporters.push(Box::new(JsonReporter::new(dir)));
    }
    let reporter = MultiReporter::new(reporters);

    let comparator = JobComparator::with_tolerance(
        method,
        Tolerance {
            float_relative: settings.float_tolerance,
        },
    );
    let runner = BatchRunner::new(
        comparator,
        concurrency.unwrap_or(settings.job_concurrency),
    )
    .with_progress(!json);

    let summary = runner.run_all(&jobs, &factory, &reporter)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    if summary.has_failures() {
        return Err(RecondiffError::JobsFailed {
            failed: summary.failed,
            total: summary.total,
        });
    }
    Ok(())
}

/// Parse a jobs config file and show what would run
fn validate_command(settings: &Settings, jobs_path: &str) -> Result<()> {
    let reader = JobConfigReader::new(settings.default_sample_size);
    let jobs = reader.read_file(Path::new(jobs_path))?;

    if jobs.is_empty() {
        println!("No runnable jobs found.");
        return Ok(());
    }

    println!("📋 {} runnable jobs:", jobs.len());
    for (i, job) in jobs.iter().enumerate() {
        let prefix = if i == jobs.len() - 1 { "└─" } else { "├─" };
        println!(
            "{} {} → {} (keys: {}, sample: {}{})",
            prefix,
            job.output_id,
            job.table_name,
            job.key_columns.join(", "),
            job.sample_size,
            if job.include_transform_columns {
                ", with transform columns"
            } else {
                ""
            }
        );
    }

    Ok(())
}

fn file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}
