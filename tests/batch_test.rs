// Batch input discovery and per-workbook failure handling

use std::fs;
use std::path::PathBuf;
use water_quality_charts::batch::{collect_inputs, process_files, run_batch, BatchError, BatchOptions};

fn touch(dir: &std::path::Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"").unwrap();
    path
}

fn options(output_dir: PathBuf) -> BatchOptions {
    BatchOptions {
        output_dir,
        chart_size: (640, 320),
        max_files: 20,
        concurrency: 2,
    }
}

#[test]
fn test_directory_expansion_skips_lock_and_other_files() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "b.xlsx");
    touch(dir.path(), "a.xls");
    touch(dir.path(), "~$a.xlsx");
    touch(dir.path(), "notes.txt");
    fs::create_dir(dir.path().join("nested.xlsx")).unwrap();

    let files = collect_inputs(&[dir.path().to_path_buf()], 20).unwrap();
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["a.xls", "b.xlsx"]);
}

#[test]
fn test_explicit_lock_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let lock = touch(dir.path(), "~$pomiary.xlsx");
    let real = touch(dir.path(), "pomiary.xlsx");

    let files = collect_inputs(&[lock, real.clone()], 20).unwrap();
    assert_eq!(files, vec![real]);
}

#[test]
fn test_too_many_files() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..3 {
        touch(dir.path(), &format!("w{i}.xlsx"));
    }

    match collect_inputs(&[dir.path().to_path_buf()], 2) {
        Err(BatchError::TooManyFiles { found, max }) => assert_eq!((found, max), (3, 2)),
        other => panic!("Expected TooManyFiles error, got {other:?}"),
    }
}

#[test]
fn test_no_input_files() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "~$only_lock.xlsx");

    assert!(matches!(
        collect_inputs(&[dir.path().to_path_buf()], 20),
        Err(BatchError::NoInputFiles)
    ));
}

#[tokio::test]
async fn test_broken_workbooks_are_reported_not_fatal() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let first = touch(input.path(), "first.xlsx");
    let second = touch(input.path(), "second.xlsx");

    let mut seen = 0;
    let report = process_files(
        vec![second.clone(), first.clone()],
        &options(output.path().to_path_buf()),
        |_| seen += 1,
    )
    .await;

    assert_eq!(seen, 2);
    assert_eq!(report.files.len(), 2);
    assert_eq!(report.files[0].input, first);
    assert_eq!(report.files[1].input, second);
    assert_eq!(report.succeeded(), 0);
    assert_eq!(report.failures().count(), 2);
    assert_eq!(report.charts().count(), 0);
    assert!(report.files.iter().all(|f| f.error.is_some()));
}

#[tokio::test]
async fn test_run_batch_propagates_input_errors() {
    let output = tempfile::tempdir().unwrap();
    let result = run_batch(&[], &options(output.path().to_path_buf())).await;
    assert!(matches!(result, Err(BatchError::NoInputFiles)));
}

#[tokio::test]
async fn test_sample_workbook_export() {
    let path = PathBuf::from("sample-data-files/pomiary.xlsx");
    if !path.exists() {
        println!("Note: Test skipped - sample workbook {} not present", path.display());
        return;
    }

    let output = tempfile::tempdir().unwrap();
    let report = run_batch(&[path], &options(output.path().to_path_buf()))
        .await
        .expect("batch run failed");
    for chart in report.charts() {
        assert!(chart.starts_with(output.path().join("pomiary")));
        assert!(chart.exists());
    }
}
