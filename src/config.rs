//! Job configuration and environment settings
//!
//! All "stringy" parsing lives here, at the boundary. The comparison core
//! only ever sees a validated [`JobSpec`] and never reads the environment.

use crate::error::{RecondiffError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One declared comparison job. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    /// Identifier of the origin dataset/extract.
    pub output_id: String,
    /// Name of the destination table.
    pub table_name: String,
    /// Columns whose combined value identifies a logical record.
    pub key_columns: Vec<String>,
    /// Whether transform-derived columns participate in the comparison.
    pub include_transform_columns: bool,
    /// Number of rows to sample from each side.
    pub sample_size: usize,
    /// Free-form operator notes carried through to reports.
    pub notes: Option<String>,
}

impl JobSpec {
    /// Fail fast on a malformed spec, before any I/O happens.
    pub fn validate(&self) -> Result<()> {
        if self.output_id.trim().is_empty() {
            return Err(RecondiffError::invalid_configuration(
                "output_id must not be empty",
            ));
        }
        if self.table_name.trim().is_empty() {
            return Err(RecondiffError::invalid_configuration(
                "table_name must not be empty",
            ));
        }
        if self.key_columns.is_empty() {
            return Err(RecondiffError::invalid_configuration(format!(
                "job '{}' declares no key columns",
                self.output_id
            )));
        }
        if self.key_columns.iter().any(|c| c.trim().is_empty()) {
            return Err(RecondiffError::invalid_configuration(format!(
                "job '{}' has a blank key column",
                self.output_id
            )));
        }
        if self.sample_size == 0 {
            return Err(RecondiffError::invalid_configuration(format!(
                "job '{}' requests a sample size of 0",
                self.output_id
            )));
        }
        Ok(())
    }
}

/// Engine settings resolved from the environment at CLI startup and passed
/// into the core explicitly.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory detailed JSON reports are written under.
    pub report_dir: PathBuf,
    /// Sample size used when a job does not declare one.
    pub default_sample_size: usize,
    /// How many jobs run concurrently in a batch.
    pub job_concurrency: usize,
    /// Relative tolerance for float cell comparison.
    pub float_tolerance: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            report_dir: PathBuf::from("results/comparison"),
            default_sample_size: crate::DEFAULT_SAMPLE_SIZE,
            job_concurrency: crate::DEFAULT_JOB_CONCURRENCY,
            float_tolerance: crate::DEFAULT_FLOAT_TOLERANCE,
        }
    }
}

impl Settings {
    /// Read settings from `RECONDIFF_*` environment variables, falling back
    /// to defaults with a warning on unparseable values.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Ok(dir) = std::env::var("RECONDIFF_REPORT_DIR") {
            if !dir.trim().is_empty() {
                settings.report_dir = PathBuf::from(dir);
            }
        }
        if let Some(size) = parse_env_var::<usize>("RECONDIFF_SAMPLE_SIZE") {
            if size > 0 {
                settings.default_sample_size = size;
            } else {
                log::warn!("RECONDIFF_SAMPLE_SIZE must be > 0, using default");
            }
        }
        if let Some(jobs) = parse_env_var::<usize>("RECONDIFF_JOB_CONCURRENCY") {
            if jobs > 0 {
                settings.job_concurrency = jobs;
            } else {
                log::warn!("RECONDIFF_JOB_CONCURRENCY must be > 0, using default");
            }
        }
        if let Some(tol) = parse_env_var::<f64>("RECONDIFF_FLOAT_TOLERANCE") {
            if tol >= 0.0 {
                settings.float_tolerance = tol;
            } else {
                log::warn!("RECONDIFF_FLOAT_TOLERANCE must be >= 0, using default");
            }
        }

        settings
    }
}

fn parse_env_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring unparseable {}: '{}'", name, raw);
            None
        }
    }
}

/// Header aliases accepted for each logical config column. Config rows come
/// from spreadsheets maintained by hand, so the reader is deliberately
/// lenient about naming.
const OUTPUT_ID_ALIASES: &[&str] = &["Output ID", "output_id", "Dataset ID", "dataset_id", "ID", "id"];
const TABLE_NAME_ALIASES: &[&str] = &["Table Name", "table_name", "Model Name", "model_name"];
const KEY_COLUMNS_ALIASES: &[&str] = &[
    "Key Columns",
    "key_columns",
    "Keys",
    "keys",
    "Join Columns",
    "join_columns",
];
const SAMPLE_SIZE_ALIASES: &[&str] = &["Sample Size", "sample_size", "Sample", "sample"];
const TRANSFORM_ALIASES: &[&str] = &[
    "Transform Columns",
    "transform_columns",
    "Transform",
    "transform",
];
const STATUS_ALIASES: &[&str] = &["Status", "status", "Comparison Status", "comparison_status"];
const NOTES_ALIASES: &[&str] = &["Notes", "notes", "Note", "note", "Comments", "comments"];

/// Values of a boolean-ish config cell that mean "enabled".
const TRUTHY: &[&str] = &["true", "1", "yes", "y", "enabled"];

/// Parses an ordered list of loosely-typed config records into job specs.
///
/// Records are the JSON equivalent of spreadsheet rows: every cell may be a
/// string regardless of its logical type. Rows missing a required cell are
/// skipped with a log line rather than failing the whole batch.
pub struct JobConfigReader {
    default_sample_size: usize,
}

type ConfigRecord = serde_json::Map<String, serde_json::Value>;

impl JobConfigReader {
    pub fn new(default_sample_size: usize) -> Self {
        Self {
            default_sample_size,
        }
    }

    /// Read a jobs file: a JSON array of record objects.
    pub fn read_file(&self, path: &Path) -> Result<Vec<JobSpec>> {
        if !path.exists() {
            return Err(RecondiffError::not_found(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let records: Vec<ConfigRecord> = serde_json::from_str(&content).map_err(|e| {
            RecondiffError::invalid_configuration(format!(
                "jobs file '{}' is not a JSON array of objects: {}",
                path.display(),
                e
            ))
        })?;

        log::info!("Found {} comparison configurations", records.len());
        self.parse_records(&records)
    }

    /// Convert records to job specs, applying the status filter and
    /// skipping incomplete rows.
    pub fn parse_records(&self, records: &[ConfigRecord]) -> Result<Vec<JobSpec>> {
        let has_status_column = records
            .iter()
            .any(|r| lookup_cell(r, STATUS_ALIASES).is_some());

        let mut jobs = Vec::new();
        for (index, record) in records.iter().enumerate() {
            let row_number = index + 1;

            if has_status_column {
                let status = lookup_cell(record, STATUS_ALIASES).unwrap_or_default();
                if !status.to_lowercase().contains("testing") {
                    log::debug!("Skipping row {}: status '{}' is not Testing", row_number, status);
                    continue;
                }
            }

            match self.parse_record(record, row_number) {
                Some(job) => jobs.push(job),
                None => continue,
            }
        }

        if has_status_column {
            log::info!("{} configurations in 'Testing' status", jobs.len());
        }
        Ok(jobs)
    }

    fn parse_record(&self, record: &ConfigRecord, row_number: usize) -> Option<JobSpec> {
        let output_id = lookup_cell(record, OUTPUT_ID_ALIASES).unwrap_or_default();
        if output_id.trim().is_empty() {
            log::info!("Skipping row {}: empty output id", row_number);
            return None;
        }

        let mut table_name = lookup_cell(record, TABLE_NAME_ALIASES).unwrap_or_default();
        if table_name.trim().is_empty() {
            log::info!("Skipping row {}: empty table name", row_number);
            return None;
        }
        // Table names copied out of model repositories sometimes keep the
        // file extension.
        if table_name.trim().to_lowercase().ends_with(".sql") {
            let trimmed = table_name.trim();
            table_name = trimmed[..trimmed.len() - 4].to_string();
        }

        let key_columns_raw = lookup_cell(record, KEY_COLUMNS_ALIASES).unwrap_or_default();
        let key_columns: Vec<String> = key_columns_raw
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if key_columns.is_empty() {
            log::info!("Skipping row {}: empty key columns", row_number);
            return None;
        }

        let sample_size = match lookup_cell(record, SAMPLE_SIZE_ALIASES) {
            Some(raw) if !raw.trim().is_empty() => match raw.trim().parse::<usize>() {
                Ok(size) if size > 0 => size,
                _ => {
                    log::warn!(
                        "Row {}: invalid sample size '{}', using default {}",
                        row_number,
                        raw,
                        self.default_sample_size
                    );
                    self.default_sample_size
                }
            },
            _ => self.default_sample_size,
        };

        let include_transform_columns = lookup_cell(record, TRANSFORM_ALIASES)
            .map(|raw| TRUTHY.contains(&raw.trim().to_lowercase().as_str()))
            .unwrap_or(false);

        let notes = lookup_cell(record, NOTES_ALIASES).filter(|n| !n.trim().is_empty());

        let job = JobSpec {
            output_id: output_id.trim().to_string(),
            table_name: table_name.trim().to_string(),
            key_columns,
            include_transform_columns,
            sample_size,
            notes,
        };

        if let Err(e) = job.validate() {
            log::warn!("Skipping row {}: {}", row_number, e);
            return None;
        }
        Some(job)
    }
}

/// Find a cell by any of its accepted header names, stringifying non-string
/// JSON values so numeric spreadsheet cells still parse.
fn lookup_cell(record: &ConfigRecord, aliases: &[&str]) -> Option<String> {
    for alias in aliases {
        if let Some(value) = record.get(*alias) {
            return Some(match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            });
        }
    }
    None
}
