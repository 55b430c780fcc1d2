//! End-to-end engine tests against file-backed row sources

use crate::common::{job_spec, TestFixture};
use recondiff::compare::{CellStatus, JobComparator, JobStatus, RowStatus};
use recondiff::sampler::SampleMethod;
use recondiff::source::JsonRowSource;

fn run_job(
    fixture: &TestFixture,
    job: &recondiff::JobSpec,
    method: SampleMethod,
) -> recondiff::JobResult {
    let origin = JsonRowSource::new(
        job.output_id.clone(),
        fixture.origin_dir.join(format!("{}.json", job.output_id)),
    );
    let dest = JsonRowSource::new(
        job.table_name.clone(),
        fixture.dest_dir.join(format!("{}.json", job.table_name)),
    );
    JobComparator::new(method).run(job, &origin, &dest).unwrap()
}

#[test]
fn test_identical_datasets_are_a_perfect_match() {
    let fixture = TestFixture::new();
    let rows = serde_json::json!([
        {"id": 1, "name": "Alice", "amount": 10.5},
        {"id": 2, "name": "Bob", "amount": 20.0},
        {"id": 3, "name": "Carol", "amount": 30.25},
    ]);
    fixture.create_origin_rows("ds-1", &rows);
    fixture.create_dest_rows("customers", &rows);

    let job = job_spec("ds-1", "customers", &["id"]);
    let result = run_job(&fixture, &job, SampleMethod::Ordered);

    assert_eq!(result.status, JobStatus::PerfectMatch);
    assert_eq!(result.rows_matched, 3);
    assert_eq!(result.rows_with_discrepancy, 0);
    assert_eq!(result.origin_only_count, 0);
    assert_eq!(result.dest_only_count, 0);
}

#[test]
fn test_value_mismatch_is_found_and_located() {
    let fixture = TestFixture::new();
    fixture.create_origin_rows(
        "ds-1",
        &serde_json::json!([
            {"id": 1, "v": "a"},
            {"id": 2, "v": "b"},
        ]),
    );
    fixture.create_dest_rows(
        "t1",
        &serde_json::json!([
            {"id": 1, "v": "a"},
            {"id": 2, "v": "X"},
        ]),
    );

    let mut job = job_spec("ds-1", "t1", &["id"]);
    job.sample_size = 2;
    let result = run_job(&fixture, &job, SampleMethod::Ordered);

    assert_eq!(result.status, JobStatus::DiscrepanciesFound);
    assert_eq!(result.rows_matched, 2);
    assert_eq!(result.rows_with_discrepancy, 1);

    let discrepant = result
        .row_verdicts
        .iter()
        .find(|v| v.has_discrepancy())
        .unwrap();
    let cell = discrepant.cells.iter().find(|c| c.column == "v").unwrap();
    assert_eq!(cell.status, CellStatus::Mismatch);
}

#[test]
fn test_numeric_representation_differences_match() {
    let fixture = TestFixture::new();
    // Origin serializes amounts as integers, destination as floats, and the
    // id column round-trips through strings on one side.
    fixture.create_origin_rows(
        "ds-1",
        &serde_json::json!([{"id": "1", "amount": 10, "ratio": 0.30000000000000004}]),
    );
    fixture.create_dest_rows(
        "t1",
        &serde_json::json!([{"id": 1, "amount": 10.0, "ratio": 0.3}]),
    );

    let job = job_spec("ds-1", "t1", &["id"]);
    let result = run_job(&fixture, &job, SampleMethod::Ordered);

    assert_eq!(result.status, JobStatus::PerfectMatch);
}

#[test]
fn test_missing_destination_file_fails_the_job() {
    let fixture = TestFixture::new();
    fixture.create_origin_rows("ds-1", &serde_json::json!([{"id": 1}]));

    let job = job_spec("ds-1", "absent_table", &["id"]);
    let result = run_job(&fixture, &job, SampleMethod::Ordered);

    assert_eq!(result.status, JobStatus::Failed);
    let error = result.error.expect("failed result carries a reason");
    assert!(error.contains("absent_table"));
}

#[test]
fn test_one_sided_rows_are_partitioned() {
    let fixture = TestFixture::new();
    fixture.create_origin_rows(
        "ds-1",
        &serde_json::json!([{"id": 1}, {"id": 2}, {"id": 3}]),
    );
    fixture.create_dest_rows("t1", &serde_json::json!([{"id": 2}, {"id": 4}]));

    let job = job_spec("ds-1", "t1", &["id"]);
    let result = run_job(&fixture, &job, SampleMethod::Ordered);

    assert_eq!(result.origin_only_count, 2);
    assert_eq!(result.dest_only_count, 1);
    assert_eq!(result.rows_matched, 1);
    assert_eq!(result.status, JobStatus::DiscrepanciesFound);

    let statuses: Vec<RowStatus> = result.row_verdicts.iter().map(|v| v.status).collect();
    assert_eq!(
        statuses,
        vec![
            RowStatus::Matched,
            RowStatus::OriginOnly,
            RowStatus::OriginOnly,
            RowStatus::DestOnly,
        ]
    );
}

#[test]
fn test_duplicate_keys_survive_end_to_end() {
    let fixture = TestFixture::new();
    fixture.create_origin_rows(
        "ds-1",
        &serde_json::json!([
            {"id": "k1", "v": 1},
            {"id": "k1", "v": 2},
            {"id": "k2", "v": 3},
        ]),
    );
    fixture.create_dest_rows(
        "t1",
        &serde_json::json!([
            {"id": "k1", "v": 1},
            {"id": "k2", "v": 3},
        ]),
    );

    let job = job_spec("ds-1", "t1", &["id"]);
    let result = run_job(&fixture, &job, SampleMethod::Ordered);

    assert_eq!(result.status, JobStatus::DiscrepanciesFound);
    assert_eq!(result.duplicate_key_count, 1);
    assert_eq!(result.rows_matched, 1);
}

#[test]
fn test_transform_columns_excluded_then_included() {
    let fixture = TestFixture::new();
    fixture.create_origin_rows("ds-1", &serde_json::json!([{"id": 1, "v": "a"}]));
    fixture.create_dest_rows(
        "t1",
        &serde_json::json!([{"id": 1, "v": "a", "load_ts": "2024-05-01T00:00:00"}]),
    );

    let job = job_spec("ds-1", "t1", &["id"]);
    let excluded = run_job(&fixture, &job, SampleMethod::Ordered);
    assert_eq!(excluded.status, JobStatus::PerfectMatch);
    let schema = excluded.schema.unwrap();
    assert_eq!(schema.extra_in_dest, vec!["load_ts".to_string()]);

    let mut job = job_spec("ds-1", "t1", &["id"]);
    job.include_transform_columns = true;
    let included = run_job(&fixture, &job, SampleMethod::Ordered);
    assert_eq!(included.status, JobStatus::DiscrepanciesFound);

    let cell = included.row_verdicts[0]
        .cells
        .iter()
        .find(|c| c.column == "load_ts")
        .unwrap();
    assert_eq!(cell.status, CellStatus::MissingInOrigin);
}

#[test]
fn test_random_sampling_still_aligns_shared_keys() {
    let fixture = TestFixture::new();
    let rows: Vec<serde_json::Value> = (0..200)
        .map(|i| serde_json::json!({"id": i, "v": format!("row-{}", i)}))
        .collect();
    fixture.create_origin_rows("ds-1", &serde_json::Value::Array(rows.clone()));
    fixture.create_dest_rows("t1", &serde_json::Value::Array(rows));

    let mut job = job_spec("ds-1", "t1", &["id"]);
    job.sample_size = 25;
    let result = run_job(&fixture, &job, SampleMethod::Random);

    // Both sides apply the same seeded selection over the same key set, so
    // the samples line up completely.
    assert_eq!(result.status, JobStatus::PerfectMatch);
    assert_eq!(result.rows_matched, 25);
}

#[test]
fn test_row_counts_reported_from_file_sources() {
    let fixture = TestFixture::new();
    fixture.create_origin_rows(
        "ds-1",
        &serde_json::json!([{"id": 1}, {"id": 2}, {"id": 3}]),
    );
    fixture.create_dest_rows("t1", &serde_json::json!([{"id": 1}, {"id": 2}]));

    let job = job_spec("ds-1", "t1", &["id"]);
    let result = run_job(&fixture, &job, SampleMethod::Ordered);

    let counts = result.row_counts.unwrap();
    assert_eq!(counts.origin_rows, 3);
    assert_eq!(counts.dest_rows, 2);
    assert!(counts.negligible);
}
