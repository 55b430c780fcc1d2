//! Common test utilities and helpers

use recondiff::config::JobSpec;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test fixture managing a temporary origin/destination data layout.
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub origin_dir: PathBuf,
    pub dest_dir: PathBuf,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let origin_dir = temp_dir.path().join("origin");
        let dest_dir = temp_dir.path().join("dest");
        std::fs::create_dir_all(&origin_dir).unwrap();
        std::fs::create_dir_all(&dest_dir).unwrap();

        Self {
            temp_dir,
            origin_dir,
            dest_dir,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write an origin rows file named by output id.
    pub fn create_origin_rows(&self, output_id: &str, rows: &serde_json::Value) -> PathBuf {
        let path = self.origin_dir.join(format!("{}.json", output_id));
        std::fs::write(&path, serde_json::to_string_pretty(rows).unwrap()).unwrap();
        path
    }

    /// Write a destination rows file named by table name.
    pub fn create_dest_rows(&self, table_name: &str, rows: &serde_json::Value) -> PathBuf {
        let path = self.dest_dir.join(format!("{}.json", table_name));
        std::fs::write(&path, serde_json::to_string_pretty(rows).unwrap()).unwrap();
        path
    }

    /// Write a jobs config file and return its path.
    pub fn create_jobs_file(&self, name: &str, jobs: &serde_json::Value) -> PathBuf {
        let path = self.root().join(name);
        std::fs::write(&path, serde_json::to_string_pretty(jobs).unwrap()).unwrap();
        path
    }
}

/// Job spec with sensible defaults for tests.
pub fn job_spec(output_id: &str, table_name: &str, key_columns: &[&str]) -> JobSpec {
    JobSpec {
        output_id: output_id.to_string(),
        table_name: table_name.to_string(),
        key_columns: key_columns.iter().map(|c| c.to_string()).collect(),
        include_transform_columns: false,
        sample_size: 100,
        notes: None,
    }
}
