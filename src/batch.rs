//! Batch execution of comparison jobs
//!
//! Jobs are independent and share no mutable state, so the runner schedules
//! them on a bounded thread pool. One job's failure never aborts its
//! siblings, and `succeeded + failed == total` always holds.

use crate::compare::{JobComparator, JobResult, JobStatus};
use crate::config::JobSpec;
use crate::error::Result;
use crate::progress::BatchProgress;
use crate::report::Reporter;
use crate::source::SourceFactory;
use rayon::prelude::*;
use serde::Serialize;

/// Aggregate outcome of one batch invocation.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<JobResult>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn all_matched(&self) -> bool {
        self.results.iter().all(|r| r.is_perfect_match())
    }
}

/// Executes a list of jobs with per-job failure isolation.
pub struct BatchRunner {
    comparator: JobComparator,
    concurrency: usize,
    show_progress: bool,
}

impl BatchRunner {
    pub fn new(comparator: JobComparator, concurrency: usize) -> Self {
        Self {
            comparator,
            concurrency: concurrency.max(1),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Run every job, reporting each result as it completes.
    ///
    /// Reporter failures are logged and swallowed - persisting a result is
    /// best-effort and never changes the result itself.
    pub fn run_all(
        &self,
        jobs: &[JobSpec],
        sources: &dyn SourceFactory,
        reporter: &dyn Reporter,
    ) -> Result<RunSummary> {
        if jobs.is_empty() {
            return Ok(RunSummary {
                total: 0,
                succeeded: 0,
                failed: 0,
                results: Vec::new(),
            });
        }

        log::info!(
            "Running {} comparison jobs ({} in parallel)",
            jobs.len(),
            self.concurrency
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.concurrency)
            .build()
            .map_err(anyhow::Error::new)?;

        let progress = if self.show_progress {
            BatchProgress::new(jobs.len() as u64)
        } else {
            BatchProgress::hidden()
        };

        let results: Vec<JobResult> = pool.install(|| {
            jobs.par_iter()
                .map(|job| {
                    let result = self.run_one(job, sources);
                    if let Err(e) = reporter.report_job(&result) {
                        log::warn!("could not report job {}: {}", job.output_id, e);
                    }
                    progress.job_finished(&result);
                    result
                })
                .collect()
        });

        let failed = results
            .iter()
            .filter(|r| r.status == JobStatus::Failed)
            .count();
        let summary = RunSummary {
            total: results.len(),
            succeeded: results.len() - failed,
            failed,
            results,
        };
        progress.finish();

        if let Err(e) = reporter.report_summary(&summary) {
            log::warn!("could not report run summary: {}", e);
        }
        Ok(summary)
    }

    /// Run one job, converting every per-job error into a FAILED result so
    /// the batch keeps going.
    fn run_one(&self, job: &JobSpec, sources: &dyn SourceFactory) -> JobResult {
        let origin = match sources.origin(job) {
            Ok(source) => source,
            Err(e) => {
                log::error!("job {}: origin source unavailable: {}", job.output_id, e);
                return JobResult::failed(job, self.comparator.method(), e.to_string());
            }
        };
        let dest = match sources.destination(job) {
            Ok(source) => source,
            Err(e) => {
                log::error!("job {}: destination source unavailable: {}", job.output_id, e);
                return JobResult::failed(job, self.comparator.method(), e.to_string());
            }
        };

        match self.comparator.run(job, origin.as_ref(), dest.as_ref()) {
            Ok(result) => result,
            Err(e) => {
                log::error!("job {}: {}", job.output_id, e);
                JobResult::failed(job, self.comparator.method(), e.to_string())
            }
        }
    }
}
