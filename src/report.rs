//! Result reporting: console pretty-printing and durable JSON reports
//!
//! Reporters consume finished results read-only. They may run from
//! concurrent job threads, so every reporter must be safe for concurrent
//! writes; the console reporter formats a whole block before printing to
//! keep interleaved jobs readable.

use crate::batch::RunSummary;
use crate::compare::{CellStatus, JobResult, JobStatus, RowStatus, RowVerdict};
use crate::error::Result;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Consumes job results and run summaries; must not mutate them. A
/// reporter's failure to persist never changes a result's own status.
pub trait Reporter: Send + Sync {
    fn report_job(&self, result: &JobResult) -> Result<()>;
    fn report_summary(&self, summary: &RunSummary) -> Result<()>;
}

/// Pretty-prints results as tree-style console blocks.
#[derive(Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }

    /// Render one job result as a display block.
    pub fn format_job_result(result: &JobResult) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "🔍 Comparison: {} → {}",
            result.job.output_id, result.job.table_name
        );

        if result.status == JobStatus::Failed {
            let _ = writeln!(out, "├─ ❌ Status: FAILED");
            let _ = writeln!(
                out,
                "└─ Reason: {}",
                result.error.as_deref().unwrap_or("unknown")
            );
            return out;
        }

        let _ = writeln!(
            out,
            "├─ Sampling: {} ({} origin / {} destination rows)",
            result.sampling_method, result.origin_sample_rows, result.dest_sample_rows
        );

        if let Some(schema) = &result.schema {
            if schema.schema_match {
                let _ = writeln!(
                    out,
                    "├─ ✅ Schema: {} shared columns",
                    schema.common_columns
                );
            } else {
                let _ = writeln!(
                    out,
                    "├─ ❌ Schema: {} origin / {} destination columns ({} shared)",
                    schema.origin_columns, schema.dest_columns, schema.common_columns
                );
                if !schema.missing_in_dest.is_empty() {
                    let _ = writeln!(
                        out,
                        "│  ├─ Missing in destination: {}",
                        schema.missing_in_dest.join(", ")
                    );
                }
                if !schema.extra_in_dest.is_empty() {
                    let _ = writeln!(
                        out,
                        "│  └─ Extra in destination: {}",
                        schema.extra_in_dest.join(", ")
                    );
                }
            }
        }

        if let Some(counts) = &result.row_counts {
            let icon = if counts.matched || counts.negligible {
                "✅"
            } else {
                "❌"
            };
            let _ = writeln!(
                out,
                "├─ {} Row counts: {} origin / {} destination ({})",
                icon, counts.origin_rows, counts.dest_rows, counts.reason
            );
        }

        if result.rows_with_discrepancy == 0 {
            let _ = writeln!(out, "├─ ✅ Rows matched: {}", result.rows_matched);
        } else {
            let _ = writeln!(
                out,
                "├─ ❌ Rows with discrepancies: {} of {} matched",
                result.rows_with_discrepancy, result.rows_matched
            );
            Self::append_discrepancy_details(&mut out, &result.row_verdicts);
        }

        if result.origin_only_count > 0 {
            let _ = writeln!(out, "├─ ❌ Origin only: {}", result.origin_only_count);
        }
        if result.dest_only_count > 0 {
            let _ = writeln!(out, "├─ ❌ Destination only: {}", result.dest_only_count);
        }
        if result.duplicate_key_count > 0 {
            let _ = writeln!(out, "├─ ❌ Duplicate keys: {}", result.duplicate_key_count);
        }

        let status_icon = if result.status == JobStatus::PerfectMatch {
            "✅"
        } else {
            "❌"
        };
        let _ = writeln!(out, "└─ {} Status: {}", status_icon, result.status);
        out
    }

    /// Show a small sample of discrepant rows and their changed cells.
    fn append_discrepancy_details(out: &mut String, verdicts: &[RowVerdict]) {
        let discrepant: Vec<&RowVerdict> = verdicts
            .iter()
            .filter(|v| v.status == RowStatus::Matched && v.has_discrepancy())
            .collect();

        for (i, verdict) in discrepant.iter().take(3).enumerate() {
            let is_last = i == discrepant.len().min(3) - 1;
            let row_prefix = if is_last { "└─" } else { "├─" };
            let bad_cells: Vec<_> = verdict.cells.iter().filter(|c| !c.is_match()).collect();
            let _ = writeln!(
                out,
                "│  {} Key {}: {} columns differ",
                row_prefix,
                verdict.key,
                bad_cells.len()
            );

            let cell_prefix = if is_last { "   " } else { "│  " };
            for (j, cell) in bad_cells.iter().take(2).enumerate() {
                let marker = if j == bad_cells.len().min(2) - 1 {
                    "└─"
                } else {
                    "├─"
                };
                let detail = match cell.status {
                    CellStatus::MissingInOrigin => "missing in origin".to_string(),
                    CellStatus::MissingInDest => "missing in destination".to_string(),
                    CellStatus::TypeMismatch => format!(
                        "type mismatch ({} vs {})",
                        cell.origin_value.as_ref().map(|v| v.type_name()).unwrap_or("absent"),
                        cell.dest_value.as_ref().map(|v| v.type_name()).unwrap_or("absent")
                    ),
                    _ => format!(
                        "'{}' → '{}'",
                        cell.origin_value
                            .as_ref()
                            .map(|v| v.to_string())
                            .unwrap_or_default(),
                        cell.dest_value
                            .as_ref()
                            .map(|v| v.to_string())
                            .unwrap_or_default()
                    ),
                };
                let _ = writeln!(
                    out,
                    "│  {}   {} {}: {}",
                    cell_prefix, marker, cell.column, detail
                );
            }
            if bad_cells.len() > 2 {
                let _ = writeln!(
                    out,
                    "│  {}   └─ ... and {} more",
                    cell_prefix,
                    bad_cells.len() - 2
                );
            }
        }
        if discrepant.len() > 3 {
            let _ = writeln!(
                out,
                "│  └─ ... and {} more discrepant rows",
                discrepant.len() - 3
            );
        }
    }

    /// Render the batch summary block.
    pub fn format_summary(summary: &RunSummary) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "📊 Reconciliation Summary");
        let _ = writeln!(out, "├─ ✅ Succeeded: {}", summary.succeeded);
        let _ = writeln!(out, "├─ ❌ Failed: {}", summary.failed);
        let _ = writeln!(out, "├─ Total: {}", summary.total);
        if summary.total > 0 {
            let _ = writeln!(
                out,
                "└─ Success rate: {:.1}%",
                summary.succeeded as f64 / summary.total as f64 * 100.0
            );
        } else {
            let _ = writeln!(out, "└─ Nothing to run");
        }
        out
    }
}

impl Reporter for ConsoleReporter {
    fn report_job(&self, result: &JobResult) -> Result<()> {
        println!("{}", Self::format_job_result(result));
        Ok(())
    }

    fn report_summary(&self, summary: &RunSummary) -> Result<()> {
        println!("{}", Self::format_summary(summary));
        Ok(())
    }
}

/// Writes one JSON report per job plus a summary file under a per-session
/// timestamped directory.
pub struct JsonReporter {
    report_dir: PathBuf,
    session: String,
}

impl JsonReporter {
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
            session: chrono::Local::now().format("%Y%m%d_%H%M%S").to_string(),
        }
    }

    fn session_dir(&self) -> PathBuf {
        self.report_dir.join(&self.session)
    }
}

impl Reporter for JsonReporter {
    fn report_job(&self, result: &JobResult) -> Result<()> {
        let dir = self.session_dir();
        std::fs::create_dir_all(&dir)?;

        let file_name = format!("{}_{}.json", sanitize_name(&result.job.table_name), self.session);
        let path = dir.join(file_name);
        std::fs::write(&path, serde_json::to_string_pretty(result)?)?;

        log::info!("Report saved to: {}", path.display());
        Ok(())
    }

    fn report_summary(&self, summary: &RunSummary) -> Result<()> {
        let dir = self.session_dir();
        std::fs::create_dir_all(&dir)?;

        let path = dir.join(format!("summary_{}.json", self.session));
        std::fs::write(&path, serde_json::to_string_pretty(summary)?)?;

        log::info!("Summary saved to: {}", path.display());
        Ok(())
    }
}

/// Fan out to several reporters; the first failure is returned after all
/// reporters ran.
pub struct MultiReporter {
    reporters: Vec<Box<dyn Reporter>>,
}

impl MultiReporter {
    pub fn new(reporters: Vec<Box<dyn Reporter>>) -> Self {
        Self { reporters }
    }
}

impl Reporter for MultiReporter {
    fn report_job(&self, result: &JobResult) -> Result<()> {
        let mut first_error = None;
        for reporter in &self.reporters {
            if let Err(e) = reporter.report_job(result) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn report_summary(&self, summary: &RunSummary) -> Result<()> {
        let mut first_error = None;
        for reporter in &self.reporters {
            if let Err(e) = reporter.report_summary(summary) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Make a table name safe for use in a file name.
fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "report".to_string()
    } else {
        cleaned
    }
}
