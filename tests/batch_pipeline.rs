//! End-to-end batch runner tests over unreadable fixture files.
//!
//! The fixtures are not valid media, so every stage fails and gets
//! recorded; the invariants checked here must hold whether or not
//! ffmpeg is installed on the machine running the tests.

use assert_fs::TempDir;
use std::path::Path;

use vidtext::batch::{BatchRunner, JobStatus};
use vidtext::config::Config;

fn write_fixtures(dir: &Path, names: &[&str]) {
    for name in names {
        std::fs::write(dir.join(name), b"not a real video container").unwrap();
    }
}

fn files_with_prefix(dir: &Path, prefix: &str) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| name.starts_with(prefix))
        .collect()
}

#[tokio::test]
async fn batch_produces_one_report_per_input() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_fixtures(input.path(), &["alpha.mp4", "beta.mkv", "gamma.mp4", "notes.txt"]);

    let runner = BatchRunner::new(Config::default()).unwrap();
    let summary = runner.run(input.path(), output.path()).await.unwrap();

    // notes.txt is filtered out by the extension allow-list
    assert_eq!(summary.total, 3);
    assert_eq!(summary.total, summary.succeeded + summary.failed);

    // Unreadable fixtures fail their stages, but every job still gets
    // exactly one report pair in its own subdirectory
    for stem in ["alpha", "beta", "gamma"] {
        let job_dir = output.path().join(stem);
        assert!(job_dir.is_dir(), "missing job directory for {}", stem);
        assert_eq!(files_with_prefix(&job_dir, "video_content_").len(), 1);
        assert_eq!(files_with_prefix(&job_dir, "video_text_").len(), 1);
    }

    // Garbage inputs cannot succeed, with or without ffmpeg present
    assert_eq!(summary.failed, 3);
    for outcome in &summary.files {
        assert_eq!(outcome.status, JobStatus::Failed);
        assert!(!outcome.errors.is_empty());
    }
}

#[tokio::test]
async fn batch_summary_is_sorted_by_input_order() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_fixtures(input.path(), &["c.mp4", "a.mp4", "b.mp4"]);

    let mut config = Config::default();
    config.batch.max_workers = 2;

    let runner = BatchRunner::new(config).unwrap();
    let summary = runner.run(input.path(), output.path()).await.unwrap();

    let names: Vec<String> = summary
        .files
        .iter()
        .map(|f| f.video_path.file_name().unwrap().to_string_lossy().to_string())
        .collect();

    assert_eq!(names, vec!["a.mp4", "b.mp4", "c.mp4"]);
}

#[tokio::test]
async fn batch_writes_summary_artifacts() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_fixtures(input.path(), &["clip.mp4"]);

    let runner = BatchRunner::new(Config::default()).unwrap();
    runner.run(input.path(), output.path()).await.unwrap();

    let reports = files_with_prefix(output.path(), "batch_processing_report_");
    assert!(reports.iter().any(|name| name.ends_with(".json")));
    assert!(reports.iter().any(|name| name.ends_with(".txt")));
}

#[tokio::test]
async fn per_video_report_always_carries_content_fields() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_fixtures(input.path(), &["clip.mp4"]);

    let runner = BatchRunner::new(Config::default()).unwrap();
    runner.run(input.path(), output.path()).await.unwrap();

    let job_dir = output.path().join("clip");
    let json_name = files_with_prefix(&job_dir, "video_content_").remove(0);
    let content = std::fs::read_to_string(job_dir.join(json_name)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();

    // Empty, not missing: both fields exist even when every stage failed
    assert!(value.get("transcription").is_some());
    assert!(value.get("subtitles").is_some());
    assert!(value["subtitles"].is_array());
    assert!(!value["errors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn empty_directory_yields_empty_summary() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();

    let runner = BatchRunner::new(Config::default()).unwrap();
    let summary = runner.run(input.path(), output.path()).await.unwrap();

    assert_eq!(summary.total, 0);
    assert_eq!(summary.succeeded, 0);
    assert_eq!(summary.failed, 0);
    assert!(summary.files.is_empty());
}

#[tokio::test]
async fn missing_input_directory_is_an_error() {
    let output = TempDir::new().unwrap();

    let runner = BatchRunner::new(Config::default()).unwrap();
    let result = runner
        .run(&output.path().join("does-not-exist"), output.path())
        .await;

    assert!(result.is_err());
}
