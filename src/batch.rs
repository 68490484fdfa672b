use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Semaphore, mpsc};
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{Result, VidtextError};
use crate::report::VideoReport;
use crate::workflow::{VideoJob, Workflow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Succeeded,
    Failed,
}

/// Outcome of one video job, as recorded in the batch summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub video_path: PathBuf,
    pub status: JobStatus,
    pub errors: Vec<String>,
    pub transcription_chars: Option<usize>,
    pub subtitle_entries: Option<usize>,
    pub elapsed_secs: f64,
}

/// Aggregate result of a batch run. Per-file entries are sorted by input
/// order so the report is reproducible despite non-deterministic
/// completion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed_secs: f64,
    pub files: Vec<FileOutcome>,
}

impl BatchSummary {
    fn from_outcomes(files: Vec<FileOutcome>, elapsed_secs: f64) -> Self {
        let total = files.len();
        let succeeded = files.iter().filter(|f| f.status == JobStatus::Succeeded).count();
        let failed = total - succeeded;

        Self {
            total,
            succeeded,
            failed,
            elapsed_secs,
            files,
        }
    }
}

/// Fans per-video orchestration out across a bounded worker pool.
pub struct BatchRunner {
    workflow: Arc<Workflow>,
    max_workers: usize,
    extensions: Vec<String>,
    recursive: bool,
}

impl BatchRunner {
    pub fn new(config: Config) -> Result<Self> {
        let max_workers = config.batch.max_workers.max(1);
        let extensions = config.batch.extensions.clone();
        let recursive = config.batch.recursive;
        let workflow = Arc::new(Workflow::new(config)?);

        Ok(Self {
            workflow,
            max_workers,
            extensions,
            recursive,
        })
    }

    /// Process every matching video under `input_dir`, writing per-video
    /// reports into a subdirectory per video and summary artifacts into
    /// `output_dir` itself.
    pub async fn run(&self, input_dir: &Path, output_dir: &Path) -> Result<BatchSummary> {
        let start = Instant::now();

        if !input_dir.is_dir() {
            return Err(VidtextError::Config(format!(
                "Input path is not a directory: {}",
                input_dir.display()
            )));
        }

        tokio::fs::create_dir_all(output_dir).await?;

        let video_files = discover_videos(input_dir, &self.extensions, self.recursive)?;
        if video_files.is_empty() {
            warn!("No video files found in {}", input_dir.display());
            return Ok(BatchSummary::from_outcomes(Vec::new(), start.elapsed().as_secs_f64()));
        }

        info!("Found {} video files to process with {} workers", video_files.len(), self.max_workers);

        let progress = ProgressBar::new(video_files.len() as u64);
        progress.set_style(ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"));

        let job_dirs = job_output_dirs(&video_files, output_dir);
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let (tx, mut rx) = mpsc::channel(self.max_workers);

        // Workers return results over the channel; a single collector
        // merges them, so there is no shared mutable accumulator.
        for (index, (video_path, job_dir)) in video_files.iter().cloned().zip(job_dirs).enumerate() {
            let workflow = Arc::clone(&self.workflow);
            let semaphore = Arc::clone(&semaphore);
            let tx = tx.clone();

            tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return;
                };

                let job = VideoJob::new(&video_path, &job_dir);
                let result = workflow.process_video(&job).await;

                if tx.send((index, video_path, result)).await.is_err() {
                    error!("Batch collector dropped before receiving a result");
                }
            });
        }

        // Close the channel once every worker's sender clone is gone
        drop(tx);

        let mut indexed: Vec<(usize, FileOutcome)> = Vec::with_capacity(video_files.len());
        while let Some((index, video_path, result)) = rx.recv().await {
            let outcome = file_outcome(video_path, result);
            progress.inc(1);
            progress.set_message(outcome.video_path.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default());
            indexed.push((index, outcome));
        }
        progress.finish_and_clear();

        indexed.sort_by_key(|(index, _)| *index);
        let outcomes = indexed.into_iter().map(|(_, outcome)| outcome).collect();

        let summary = BatchSummary::from_outcomes(outcomes, start.elapsed().as_secs_f64());
        write_summary_reports(&summary, input_dir, output_dir).await?;

        println!("\nBatch processing complete!");
        println!(
            "Processed {} videos: {} successful, {} failed",
            summary.total, summary.succeeded, summary.failed
        );

        Ok(summary)
    }
}

/// Find video files by extension allow-list (case-insensitive), sorted by
/// path for deterministic input order. Non-recursive unless requested.
pub fn discover_videos(
    input_dir: &Path,
    extensions: &[String],
    recursive: bool,
) -> Result<Vec<PathBuf>> {
    let allowed: HashSet<String> = extensions.iter().map(|e| e.to_lowercase()).collect();

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut video_files = Vec::new();

    for entry in WalkDir::new(input_dir).max_depth(max_depth).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if allowed.contains(&ext.to_lowercase()) {
                video_files.push(path.to_path_buf());
            }
        }
    }

    video_files.sort();
    Ok(video_files)
}

/// One output subdirectory per video so concurrent jobs cannot collide on
/// their timestamped artifact names. Duplicate stems get an index suffix.
fn job_output_dirs(video_files: &[PathBuf], output_dir: &Path) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    video_files
        .iter()
        .enumerate()
        .map(|(index, path)| {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| format!("video_{}", index));

            let name = if seen.insert(stem.clone()) {
                stem
            } else {
                format!("{}_{}", stem, index)
            };

            output_dir.join(name)
        })
        .collect()
}

fn file_outcome(video_path: PathBuf, result: Result<VideoReport>) -> FileOutcome {
    match result {
        Ok(report) => FileOutcome {
            video_path,
            status: if report.is_success() { JobStatus::Succeeded } else { JobStatus::Failed },
            errors: report.errors.iter().map(|e| format!("{}: {}", e.stage, e.message)).collect(),
            transcription_chars: report.transcription.as_ref().map(|t| t.text.len()),
            subtitle_entries: Some(report.subtitle_entry_count()),
            elapsed_secs: report.elapsed_secs,
        },
        Err(e) => FileOutcome {
            video_path,
            status: JobStatus::Failed,
            errors: vec![e.to_string()],
            transcription_chars: None,
            subtitle_entries: None,
            elapsed_secs: 0.0,
        },
    }
}

async fn write_summary_reports(
    summary: &BatchSummary,
    input_dir: &Path,
    output_dir: &Path,
) -> Result<()> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");

    let json_path = output_dir.join(format!("batch_processing_report_{}.json", timestamp));
    let json_content = serde_json::to_string_pretty(summary)?;
    tokio::fs::write(&json_path, json_content).await?;

    let text_path = output_dir.join(format!("batch_processing_report_{}.txt", timestamp));
    tokio::fs::write(&text_path, render_summary_text(summary, input_dir, output_dir)).await?;

    info!("Batch report saved to {}", text_path.display());
    Ok(())
}

/// Render the human-readable batch report
pub fn render_summary_text(summary: &BatchSummary, input_dir: &Path, output_dir: &Path) -> String {
    let mut out = String::new();

    out.push_str("=== BATCH VIDEO PROCESSING REPORT ===\n\n");
    out.push_str(&format!("Processed at: {}\n", Local::now().format("%Y-%m-%d %H:%M:%S")));
    out.push_str(&format!("Input directory: {}\n", input_dir.display()));
    out.push_str(&format!("Output directory: {}\n", output_dir.display()));
    out.push_str(&format!("Total videos processed: {}\n", summary.total));
    out.push_str(&format!("Successful: {}\n", summary.succeeded));
    out.push_str(&format!("Failed: {}\n", summary.failed));
    out.push_str(&format!("Elapsed: {:.1}s\n\n", summary.elapsed_secs));

    out.push_str("=== PROCESSING DETAILS ===\n\n");
    for (i, outcome) in summary.files.iter().enumerate() {
        let video_name = outcome.video_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| outcome.video_path.display().to_string());

        let status = match outcome.status {
            JobStatus::Succeeded => "SUCCESS",
            JobStatus::Failed => "FAILED",
        };
        out.push_str(&format!("{}. {}: {}\n", i + 1, video_name, status));

        for error in &outcome.errors {
            out.push_str(&format!("   Error: {}\n", error));
        }
        if let Some(chars) = outcome.transcription_chars {
            out.push_str(&format!("   Transcription length: {} characters\n", chars));
        }
        if let Some(entries) = outcome.subtitle_entries {
            if entries > 0 {
                out.push_str(&format!("   Subtitles: {} entries\n", entries));
            }
        }

        out.push('\n');
    }

    out
}
