//! Batch runner and config boundary tests

use crate::common::TestFixture;
use recondiff::batch::{BatchRunner, RunSummary};
use recondiff::compare::{JobComparator, JobResult, JobStatus};
use recondiff::config::JobConfigReader;
use recondiff::report::{JsonReporter, Reporter};
use recondiff::sampler::SampleMethod;
use recondiff::source::FileSourceFactory;
use std::sync::Mutex;

#[derive(Default)]
struct CollectingReporter {
    seen: Mutex<Vec<(String, JobStatus)>>,
}

impl Reporter for CollectingReporter {
    fn report_job(&self, result: &JobResult) -> recondiff::Result<()> {
        self.seen
            .lock()
            .unwrap()
            .push((result.job.output_id.clone(), result.status));
        Ok(())
    }

    fn report_summary(&self, _summary: &RunSummary) -> recondiff::Result<()> {
        Ok(())
    }
}

fn jobs_config() -> serde_json::Value {
    serde_json::json!([
        {
            "Output ID": "ds-1",
            "Table Name": "orders",
            "Key Columns": "id",
            "Sample Size": "50",
            "Status": "Testing"
        },
        {
            "Output ID": "ds-2",
            "Table Name": "customers",
            "Key Columns": "id",
            "Status": "Testing"
        },
        {
            "Output ID": "ds-3",
            "Table Name": "missing_table",
            "Key Columns": "id",
            "Status": "Testing"
        },
        {
            "Output ID": "ds-4",
            "Table Name": "parked",
            "Key Columns": "id",
            "Status": "Pending"
        }
    ])
}

fn seed_data(fixture: &TestFixture) {
    fixture.create_origin_rows("ds-1", &serde_json::json!([{"id": 1, "v": "a"}]));
    fixture.create_dest_rows("orders", &serde_json::json!([{"id": 1, "v": "a"}]));

    fixture.create_origin_rows("ds-2", &serde_json::json!([{"id": 1, "v": "a"}]));
    fixture.create_dest_rows("customers", &serde_json::json!([{"id": 1, "v": "CHANGED"}]));

    fixture.create_origin_rows("ds-3", &serde_json::json!([{"id": 1}]));
    // missing_table.json deliberately absent on the destination side.
}

#[test]
fn test_batch_isolates_failures_and_counts() {
    let fixture = TestFixture::new();
    seed_data(&fixture);

    let jobs_path = fixture.create_jobs_file("jobs.json", &jobs_config());
    let jobs = JobConfigReader::new(100).read_file(&jobs_path).unwrap();

    // The "Pending" row is filtered out by the status column.
    assert_eq!(jobs.len(), 3);
    assert_eq!(jobs[0].sample_size, 50);

    let factory = FileSourceFactory::new(&fixture.origin_dir, &fixture.dest_dir);
    let reporter = CollectingReporter::default();
    let runner = BatchRunner::new(JobComparator::new(SampleMethod::Ordered), 2);

    let summary = runner.run_all(&jobs, &factory, &reporter).unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.succeeded + summary.failed, summary.total);

    // Results follow the job order even when jobs run in parallel.
    let statuses: Vec<JobStatus> = summary.results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            JobStatus::PerfectMatch,
            JobStatus::DiscrepanciesFound,
            JobStatus::Failed,
        ]
    );

    // Sibling jobs ran to completion despite the failure.
    let mut reported: Vec<String> = reporter
        .seen
        .lock()
        .unwrap()
        .iter()
        .map(|(id, _)| id.clone())
        .collect();
    reported.sort();
    assert_eq!(reported, vec!["ds-1", "ds-2", "ds-3"]);
}

#[test]
fn test_batch_writes_json_reports() {
    let fixture = TestFixture::new();
    seed_data(&fixture);

    let jobs_path = fixture.create_jobs_file("jobs.json", &jobs_config());
    let jobs = JobConfigReader::new(100).read_file(&jobs_path).unwrap();

    let report_dir = fixture.root().join("reports");
    let factory = FileSourceFactory::new(&fixture.origin_dir, &fixture.dest_dir);
    let reporter = JsonReporter::new(&report_dir);
    let runner = BatchRunner::new(JobComparator::new(SampleMethod::Ordered), 2);

    let summary = runner.run_all(&jobs, &factory, &reporter).unwrap();
    assert_eq!(summary.total, 3);

    // One session directory holding a report per job plus the summary.
    let sessions: Vec<_> = std::fs::read_dir(&report_dir).unwrap().collect();
    assert_eq!(sessions.len(), 1);
    let session_dir = sessions[0].as_ref().unwrap().path();
    let reports: Vec<_> = std::fs::read_dir(&session_dir).unwrap().collect();
    assert_eq!(reports.len(), 4);

    let summary_file = std::fs::read_dir(&session_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| {
            p.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("summary_")
        })
        .unwrap();
    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(summary_file).unwrap()).unwrap();
    assert_eq!(parsed["total"], 3);
    assert_eq!(parsed["failed"], 1);
}

#[test]
fn test_reader_ignores_rows_without_required_cells() {
    let fixture = TestFixture::new();
    let jobs_path = fixture.create_jobs_file(
        "jobs.json",
        &serde_json::json!([
            {"Output ID": "", "Table Name": "a", "Key Columns": "id"},
            {"Output ID": "ds-1", "Table Name": "", "Key Columns": "id"},
            {"Output ID": "ds-2", "Table Name": "b", "Key Columns": ""},
            {"Output ID": "ds-3", "Table Name": "c.sql", "Key Columns": "id, region"},
        ]),
    );

    let jobs = JobConfigReader::new(100).read_file(&jobs_path).unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].output_id, "ds-3");
    assert_eq!(jobs[0].table_name, "c");
    assert_eq!(jobs[0].key_columns, vec!["id", "region"]);
}

#[test]
fn test_missing_jobs_file_is_not_found() {
    let fixture = TestFixture::new();
    let err = JobConfigReader::new(100)
        .read_file(&fixture.root().join("nope.json"))
        .unwrap_err();
    assert!(matches!(err, recondiff::RecondiffError::NotFound { .. }));
}
