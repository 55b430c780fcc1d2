//! Row acquisition contracts and the bundled file-backed sources
//!
//! The engine never talks to a data platform directly. Each side of a job is
//! a [`RowSource`] collaborator that fetches rows under a [`SamplePlan`];
//! authentication, SQL generation, pagination, and retry all live behind it.

use crate::config::JobSpec;
use crate::error::{RecondiffError, Result};
use crate::sampler::{SamplePlan, Selection};
use crate::value::{Row, RowKey, Value};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};

/// Supplies rows for one named dataset or table.
///
/// Fetch failures are reported as `Connectivity` (transport/auth) or
/// `NotFound` (dataset/table absent); the engine recovers both as a FAILED
/// job result and never retries on its own.
pub trait RowSource: Send + Sync {
    /// Identifier used in logs and error messages.
    fn name(&self) -> &str;

    /// Fetch rows under the given plan. Finite; order is source-defined.
    fn fetch(&self, plan: &SamplePlan) -> Result<Vec<Row>>;

    /// Whether this source can apply a seeded random selection. When either
    /// side of a job cannot, random sampling degrades to independent pulls
    /// and the matched set may shrink.
    fn supports_seeded_sampling(&self) -> bool {
        false
    }

    /// Full-table row count, when the source can report one cheaply.
    fn total_rows(&self) -> Result<Option<u64>> {
        Ok(None)
    }
}

/// Resolves a job to its pair of row sources.
pub trait SourceFactory: Send + Sync {
    fn origin(&self, job: &JobSpec) -> Result<Box<dyn RowSource>>;
    fn destination(&self, job: &JobSpec) -> Result<Box<dyn RowSource>>;
}

/// Apply a sample plan to an in-memory row set.
///
/// Rows are first ordered by key so both sides share a deterministic base
/// order; seeded random selection over that order picks the same keys from
/// two sources holding the same logical records.
pub(crate) fn apply_plan(rows: &[Row], plan: &SamplePlan) -> Vec<Row> {
    let mut indexed: Vec<(RowKey, &Row)> = rows
        .iter()
        .map(|row| (RowKey::extract(row, &plan.key_columns), row))
        .collect();
    indexed.sort_by(|a, b| a.0.cmp(&b.0));

    match plan.selection {
        Selection::OrderedByKey => indexed
            .into_iter()
            .take(plan.limit)
            .map(|(_, row)| row.clone())
            .collect(),
        Selection::SeededRandom { seed } => {
            if indexed.len() <= plan.limit {
                return indexed.into_iter().map(|(_, row)| row.clone()).collect();
            }
            let mut rng = StdRng::seed_from_u64(seed);
            let mut picks = rand::seq::index::sample(&mut rng, indexed.len(), plan.limit).into_vec();
            picks.sort_unstable();
            picks.into_iter().map(|i| indexed[i].1.clone()).collect()
        }
    }
}

/// In-memory row source for tests and embedding.
pub struct MemoryRowSource {
    name: String,
    rows: Vec<Row>,
}

impl MemoryRowSource {
    pub fn new(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

impl RowSource for MemoryRowSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, plan: &SamplePlan) -> Result<Vec<Row>> {
        Ok(apply_plan(&self.rows, plan))
    }

    fn supports_seeded_sampling(&self) -> bool {
        true
    }

    fn total_rows(&self) -> Result<Option<u64>> {
        Ok(Some(self.rows.len() as u64))
    }
}

/// Row source backed by a JSON file holding an array of row objects.
///
/// Cell values are inferred into the engine's value model at load time, so
/// numbers and timestamps serialized as strings still compare by value.
pub struct JsonRowSource {
    name: String,
    path: PathBuf,
}

impl JsonRowSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    fn load(&self) -> Result<Vec<Row>> {
        if !self.path.exists() {
            return Err(RecondiffError::not_found(format!(
                "{} ({})",
                self.name,
                self.path.display()
            )));
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            RecondiffError::connectivity(format!(
                "could not read '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        let parsed: Vec<serde_json::Map<String, serde_json::Value>> =
            serde_json::from_str(&content).map_err(|e| {
                RecondiffError::connectivity(format!(
                    "'{}' is not a JSON array of row objects: {}",
                    self.path.display(),
                    e
                ))
            })?;

        let rows = parsed
            .into_iter()
            .map(|object| {
                object
                    .into_iter()
                    .map(|(column, cell)| (column, Value::from_json(&cell)))
                    .collect::<Row>()
            })
            .collect();
        Ok(rows)
    }
}

impl RowSource for JsonRowSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, plan: &SamplePlan) -> Result<Vec<Row>> {
        let rows = self.load()?;
        log::debug!("{}: loaded {} rows from {}", self.name, rows.len(), self.path.display());
        Ok(apply_plan(&rows, plan))
    }

    fn supports_seeded_sampling(&self) -> bool {
        true
    }

    fn total_rows(&self) -> Result<Option<u64>> {
        Ok(Some(self.load()?.len() as u64))
    }
}

/// Maps jobs onto a pair of directories of JSON row files: the origin side
/// by output id, the destination side by table name.
pub struct FileSourceFactory {
    origin_dir: PathBuf,
    dest_dir: PathBuf,
}

impl FileSourceFactory {
    pub fn new(origin_dir: impl Into<PathBuf>, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            origin_dir: origin_dir.into(),
            dest_dir: dest_dir.into(),
        }
    }

    fn source_for(&self, dir: &Path, name: &str) -> Box<dyn RowSource> {
        Box::new(JsonRowSource::new(name, dir.join(format!("{}.json", name))))
    }
}

impl SourceFactory for FileSourceFactory {
    fn origin(&self, job: &JobSpec) -> Result<Box<dyn RowSource>> {
        Ok(self.source_for(&self.origin_dir, &job.output_id))
    }

    fn destination(&self, job: &JobSpec) -> Result<Box<dyn RowSource>> {
        Ok(self.source_for(&self.dest_dir, &job.table_name))
    }
}
