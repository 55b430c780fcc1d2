//! Column-level comparison and per-job orchestration
//!
//! [`ColumnComparator`] decides the verdict for a single cell under
//! type-aware equality; [`JobComparator`] drives one whole job through
//! fetch, alignment, and comparison and aggregates the result.

use crate::align::{AlignedPair, Aligner};
use crate::config::JobSpec;
use crate::error::Result;
use crate::sampler::{SampleMethod, Sampler, Selection};
use crate::source::RowSource;
use crate::value::{Row, RowKey, Value};
use indexmap::IndexSet;
use serde::Serialize;

/// Verdict for a single compared cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CellStatus {
    Match,
    Mismatch,
    MissingInOrigin,
    MissingInDest,
    TypeMismatch,
}

#[derive(Debug, Clone, Serialize)]
pub struct CellVerdict {
    pub column: String,
    pub origin_value: Option<Value>,
    pub dest_value: Option<Value>,
    pub status: CellStatus,
}

impl CellVerdict {
    pub fn is_match(&self) -> bool {
        self.status == CellStatus::Match
    }
}

/// Verdict for one aligned row key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowStatus {
    Matched,
    OriginOnly,
    DestOnly,
    DuplicateKey,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowVerdict {
    pub key: RowKey,
    pub status: RowStatus,
    /// Cell verdicts; empty unless the row matched.
    pub cells: Vec<CellVerdict>,
}

impl RowVerdict {
    pub fn has_discrepancy(&self) -> bool {
        self.cells.iter().any(|c| !c.is_match())
    }
}

/// Aggregate job verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    PerfectMatch,
    DiscrepanciesFound,
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::PerfectMatch => write!(f, "perfect match"),
            JobStatus::DiscrepanciesFound => write!(f, "discrepancies found"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Column-set comparison between the two samples.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaSummary {
    pub origin_columns: usize,
    pub dest_columns: usize,
    pub common_columns: usize,
    pub missing_in_dest: Vec<String>,
    pub extra_in_dest: Vec<String>,
    pub schema_match: bool,
}

impl SchemaSummary {
    pub fn from_samples(origin: &[Row], dest: &[Row]) -> SchemaSummary {
        let origin_cols: IndexSet<String> =
            origin.iter().flat_map(|r| r.keys().cloned()).collect();
        let dest_cols: IndexSet<String> = dest.iter().flat_map(|r| r.keys().cloned()).collect();

        let missing_in_dest: Vec<String> =
            origin_cols.difference(&dest_cols).cloned().collect();
        let extra_in_dest: Vec<String> = dest_cols.difference(&origin_cols).cloned().collect();
        let common_columns = origin_cols.intersection(&dest_cols).count();
        let schema_match = missing_in_dest.is_empty() && extra_in_dest.is_empty();

        SchemaSummary {
            origin_columns: origin_cols.len(),
            dest_columns: dest_cols.len(),
            common_columns,
            missing_in_dest,
            extra_in_dest,
            schema_match,
        }
    }
}

/// Full-table row count comparison, when both sources can report counts.
#[derive(Debug, Clone, Serialize)]
pub struct RowCountSummary {
    pub origin_rows: u64,
    pub dest_rows: u64,
    pub difference: i64,
    pub matched: bool,
    pub negligible: bool,
    pub percentage: f64,
    pub reason: String,
}

impl RowCountSummary {
    pub fn collect(origin: &dyn RowSource, dest: &dyn RowSource) -> Option<RowCountSummary> {
        let origin_rows = match origin.total_rows() {
            Ok(count) => count?,
            Err(e) => {
                log::debug!("{}: row count unavailable: {}", origin.name(), e);
                return None;
            }
        };
        let dest_rows = match dest.total_rows() {
            Ok(count) => count?,
            Err(e) => {
                log::debug!("{}: row count unavailable: {}", dest.name(), e);
                return None;
            }
        };
        Some(Self::analyze(origin_rows, dest_rows))
    }

    /// Classify the difference between two full-table counts.
    pub fn analyze(origin_rows: u64, dest_rows: u64) -> RowCountSummary {
        let difference = dest_rows as i64 - origin_rows as i64;
        let matched = origin_rows == dest_rows;

        let (negligible, percentage, reason) = if origin_rows == 0 && dest_rows == 0 {
            (true, 0.0, "Both sides are empty".to_string())
        } else if origin_rows == 0 || dest_rows == 0 {
            (false, 100.0, "One side is empty".to_string())
        } else {
            let abs_diff = difference.unsigned_abs();
            let larger = origin_rows.max(dest_rows);
            let percentage = abs_diff as f64 / larger as f64 * 100.0;
            if abs_diff <= 10 {
                (
                    true,
                    percentage,
                    format!("Very small absolute difference ({} rows)", abs_diff),
                )
            } else if percentage <= 0.1 {
                (
                    true,
                    percentage,
                    format!("Very small relative difference ({:.3}%)", percentage),
                )
            } else if percentage <= 1.0 && larger >= 10_000 {
                (
                    true,
                    percentage,
                    format!(
                        "Small relative difference for a large table ({:.3}%)",
                        percentage
                    ),
                )
            } else {
                (
                    false,
                    percentage,
                    format!(
                        "Significant difference: {} rows ({:.3}%)",
                        abs_diff, percentage
                    ),
                )
            }
        };

        RowCountSummary {
            origin_rows,
            dest_rows,
            difference,
            matched,
            negligible,
            percentage,
            reason,
        }
    }
}

/// Equality tolerances for numeric and temporal cells.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Relative tolerance applied when at least one side is a float,
    /// absorbing floating round-trip noise across storage engines.
    pub float_relative: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            float_relative: crate::DEFAULT_FLOAT_TOLERANCE,
        }
    }
}

/// Compares one column's value between a matched pair of rows.
pub struct ColumnComparator {
    tolerance: Tolerance,
}

impl ColumnComparator {
    pub fn new(tolerance: Tolerance) -> Self {
        Self { tolerance }
    }

    /// Compare every relevant column of a matched pair.
    ///
    /// The compared set is the key columns followed by columns shared by
    /// both rows. Columns present on a single side are transform-derived
    /// candidates: skipped entirely unless the job includes them, in which
    /// case they surface as missing-cell verdicts.
    pub fn compare_pair(&self, origin: &Row, dest: &Row, job: &JobSpec) -> Vec<CellVerdict> {
        let mut columns: Vec<&str> = Vec::new();
        let mut seen: IndexSet<&str> = IndexSet::new();

        for key in &job.key_columns {
            if seen.insert(key.as_str()) {
                columns.push(key.as_str());
            }
        }
        for column in origin.keys() {
            if seen.contains(column.as_str()) {
                continue;
            }
            if dest.contains_key(column) || job.include_transform_columns {
                seen.insert(column.as_str());
                columns.push(column.as_str());
            }
        }
        if job.include_transform_columns {
            for column in dest.keys() {
                if seen.insert(column.as_str()) {
                    columns.push(column.as_str());
                }
            }
        }

        columns
            .into_iter()
            .map(|column| self.compare_cell(column, origin.get(column), dest.get(column)))
            .collect()
    }

    /// Verdict for one cell under type-aware equality.
    pub fn compare_cell(
        &self,
        column: &str,
        origin: Option<&Value>,
        dest: Option<&Value>,
    ) -> CellVerdict {
        let status = match (origin, dest) {
            (None, None) => CellStatus::Match,
            (None, Some(_)) => CellStatus::MissingInOrigin,
            (Some(_), None) => CellStatus::MissingInDest,
            (Some(o), Some(d)) => self.value_status(o, d),
        };

        CellVerdict {
            column: column.to_string(),
            origin_value: origin.cloned(),
            dest_value: dest.cloned(),
            status,
        }
    }

    fn value_status(&self, origin: &Value, dest: &Value) -> CellStatus {
        use Value::*;
        match (origin, dest) {
            (Null, Null) => CellStatus::Match,
            // Null never equals a non-null value, including empty string.
            (Null, _) | (_, Null) => CellStatus::Mismatch,
            (Bool(a), Bool(b)) => Self::verdict(a == b),
            (Int(a), Int(b)) => Self::verdict(a == b),
            (Int(a), Float(b)) => Self::verdict(self.floats_equal(*a as f64, *b)),
            (Float(a), Int(b)) => Self::verdict(self.floats_equal(*a, *b as f64)),
            (Float(a), Float(b)) => Self::verdict(self.floats_equal(*a, *b)),
            (Text(a), Text(b)) => Self::verdict(a == b),
            // Sub-second precision differs across platforms and is not a
            // discrepancy.
            (Timestamp(a), Timestamp(b)) => {
                Self::verdict(a.and_utc().timestamp() == b.and_utc().timestamp())
            }
            _ => CellStatus::TypeMismatch,
        }
    }

    fn verdict(equal: bool) -> CellStatus {
        if equal {
            CellStatus::Match
        } else {
            CellStatus::Mismatch
        }
    }

    fn floats_equal(&self, a: f64, b: f64) -> bool {
        if a == b {
            return true;
        }
        let scale = a.abs().max(b.abs());
        (a - b).abs() <= self.tolerance.float_relative * scale
    }
}

/// Execution phases of one job. Terminal: `Done`, `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Pending,
    Fetching,
    Aligning,
    Comparing,
    Done,
    Failed,
}

/// Result of one executed job. Immutable after the run completes.
#[derive(Debug, Clone, Serialize)]
pub struct JobResult {
    pub job: JobSpec,
    pub sampling_method: SampleMethod,
    pub origin_sample_rows: usize,
    pub dest_sample_rows: usize,
    pub rows_compared: usize,
    pub rows_matched: usize,
    pub rows_with_discrepancy: usize,
    pub origin_only_count: usize,
    pub dest_only_count: usize,
    pub duplicate_key_count: usize,
    pub row_verdicts: Vec<RowVerdict>,
    pub schema: Option<SchemaSummary>,
    pub row_counts: Option<RowCountSummary>,
    pub status: JobStatus,
    pub error: Option<String>,
}

impl JobResult {
    /// Result for a job whose fetch or setup failed.
    pub fn failed(job: &JobSpec, method: SampleMethod, error: impl Into<String>) -> JobResult {
        JobResult {
            job: job.clone(),
            sampling_method: method,
            origin_sample_rows: 0,
            dest_sample_rows: 0,
            rows_compared: 0,
            rows_matched: 0,
            rows_with_discrepancy: 0,
            origin_only_count: 0,
            dest_only_count: 0,
            duplicate_key_count: 0,
            row_verdicts: Vec::new(),
            schema: None,
            row_counts: None,
            status: JobStatus::Failed,
            error: Some(error.into()),
        }
    }

    pub fn is_perfect_match(&self) -> bool {
        self.status == JobStatus::PerfectMatch
    }
}

/// Orchestrates one job: plan, fetch both sides, align, compare, aggregate.
pub struct JobComparator {
    comparator: ColumnComparator,
    method: SampleMethod,
}

impl JobComparator {
    pub fn new(method: SampleMethod) -> Self {
        Self::with_tolerance(method, Tolerance::default())
    }

    pub fn with_tolerance(method: SampleMethod, tolerance: Tolerance) -> Self {
        Self {
            comparator: ColumnComparator::new(tolerance),
            method,
        }
    }

    pub fn method(&self) -> SampleMethod {
        self.method
    }

    /// Run one job.
    ///
    /// Expected collaborator failures (`Connectivity`, `NotFound`) are
    /// absorbed into a FAILED result; a malformed job spec fails fast with
    /// `InvalidConfiguration` before any fetch.
    pub fn run(
        &self,
        job: &JobSpec,
        origin: &dyn RowSource,
        dest: &dyn RowSource,
    ) -> Result<JobResult> {
        job.validate()?;
        let plan = Sampler::plan(job.sample_size, self.method, &job.key_columns)?;

        if matches!(plan.selection, Selection::SeededRandom { .. })
            && !(origin.supports_seeded_sampling() && dest.supports_seeded_sampling())
        {
            log::warn!(
                "job {}: random sampling without seeded support on both sides; \
                 the matched set may be smaller than the requested {} rows",
                job.output_id,
                job.sample_size
            );
        }

        let mut phase = JobPhase::Pending;
        Self::enter(job, &mut phase, JobPhase::Fetching);

        let (origin_result, dest_result) =
            rayon::join(|| origin.fetch(&plan), || dest.fetch(&plan));

        let (origin_rows, dest_rows) = match (origin_result, dest_result) {
            (Ok(origin_rows), Ok(dest_rows)) => (origin_rows, dest_rows),
            (Err(e), _) | (Ok(_), Err(e)) => {
                if e.is_job_recoverable() {
                    Self::enter(job, &mut phase, JobPhase::Failed);
                    log::error!("job {}: fetch failed: {}", job.output_id, e);
                    return Ok(JobResult::failed(job, self.method, e.to_string()));
                }
                return Err(e);
            }
        };

        let row_counts = RowCountSummary::collect(origin, dest);
        let schema = SchemaSummary::from_samples(&origin_rows, &dest_rows);

        Self::enter(job, &mut phase, JobPhase::Aligning);
        let alignment = Aligner::align(&origin_rows, &dest_rows, &job.key_columns);

        Self::enter(job, &mut phase, JobPhase::Comparing);
        let row_verdicts: Vec<RowVerdict> = alignment
            .pairs
            .iter()
            .map(|pair| match pair {
                AlignedPair::Matched { key, origin, dest } => RowVerdict {
                    key: key.clone(),
                    status: RowStatus::Matched,
                    cells: self.comparator.compare_pair(origin, dest, job),
                },
                AlignedPair::OriginOnly { key, .. } => RowVerdict {
                    key: key.clone(),
                    status: RowStatus::OriginOnly,
                    cells: Vec::new(),
                },
                AlignedPair::DestOnly { key, .. } => RowVerdict {
                    key: key.clone(),
                    status: RowStatus::DestOnly,
                    cells: Vec::new(),
                },
                AlignedPair::DuplicateKey { key, .. } => RowVerdict {
                    key: key.clone(),
                    status: RowStatus::DuplicateKey,
                    cells: Vec::new(),
                },
            })
            .collect();

        let rows_matched = alignment.matched_count();
        let rows_with_discrepancy = row_verdicts
            .iter()
            .filter(|v| v.status == RowStatus::Matched && v.has_discrepancy())
            .count();
        let origin_only_count = alignment.origin_only_count();
        let dest_only_count = alignment.dest_only_count();
        let duplicate_key_count = alignment.duplicate_key_count();

        let status = if origin_only_count == 0
            && dest_only_count == 0
            && duplicate_key_count == 0
            && rows_with_discrepancy == 0
        {
            JobStatus::PerfectMatch
        } else {
            JobStatus::DiscrepanciesFound
        };

        Self::enter(job, &mut phase, JobPhase::Done);
        log::info!(
            "job {}: {} ({} matched, {} discrepant, {} origin-only, {} dest-only, {} duplicate keys)",
            job.output_id,
            status,
            rows_matched,
            rows_with_discrepancy,
            origin_only_count,
            dest_only_count,
            duplicate_key_count
        );

        Ok(JobResult {
            job: job.clone(),
            sampling_method: self.method,
            origin_sample_rows: origin_rows.len(),
            dest_sample_rows: dest_rows.len(),
            rows_compared: row_verdicts.len(),
            rows_matched,
            rows_with_discrepancy,
            origin_only_count,
            dest_only_count,
            duplicate_key_count,
            row_verdicts,
            schema: Some(schema),
            row_counts,
            status,
            error: None,
        })
    }

    fn enter(job: &JobSpec, phase: &mut JobPhase, next: JobPhase) {
        log::debug!("job {}: {:?} -> {:?}", job.output_id, phase, next);
        *phase = next;
    }
}
