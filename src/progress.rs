//! Progress reporting utilities

use crate::compare::{JobResult, JobStatus};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress bar over the jobs of one batch run.
///
/// Safe to tick from concurrent job threads.
#[derive(Debug)]
pub struct BatchProgress {
    bar: Option<ProgressBar>,
}

impl BatchProgress {
    pub fn new(total_jobs: u64) -> Self {
        let bar = ProgressBar::new(total_jobs);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}/{len:3} jobs {msg}")
                .expect("Invalid progress template")
                .progress_chars("#>-"),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar: Some(bar) }
    }

    /// No-op progress for quiet/JSON output and tests.
    pub fn hidden() -> Self {
        Self { bar: None }
    }

    pub fn job_finished(&self, result: &JobResult) {
        if let Some(bar) = &self.bar {
            let icon = match result.status {
                JobStatus::PerfectMatch => "✅",
                JobStatus::DiscrepanciesFound => "⚠️",
                JobStatus::Failed => "❌",
            };
            bar.set_message(format!("{} {}", icon, result.job.table_name));
            bar.inc(1);
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl Drop for BatchProgress {
    fn drop(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

/// Create a spinner for a single long-running step.
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.green} {msg}")
            .expect("Invalid progress template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_progress_is_inert() {
        let progress = BatchProgress::hidden();
        progress.finish();
    }

    #[test]
    fn test_progress_bar_creation() {
        let progress = BatchProgress::new(5);
        assert!(progress.bar.is_some());
        progress.finish();
    }
}
