use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::error::Result;
use crate::subtitle::SubtitleTrack;
use crate::transcribe::TranscriptionResult;

/// Pipeline stage a recorded error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    AudioExtraction,
    Transcription,
    SubtitleExtraction,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::AudioExtraction => write!(f, "audio extraction"),
            Stage::Transcription => write!(f, "transcription"),
            Stage::SubtitleExtraction => write!(f, "subtitle extraction"),
        }
    }
}

/// A stage failure captured without aborting the job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageError {
    pub stage: Stage,
    pub message: String,
}

/// Everything extracted from one video. `transcription` and `subtitles`
/// are always serialized, empty or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoReport {
    pub video_path: PathBuf,
    pub processed_at: String,
    pub audio_path: Option<PathBuf>,
    pub transcription: Option<TranscriptionResult>,
    pub subtitles: Vec<SubtitleTrack>,
    pub subtitle_text: Option<String>,
    pub errors: Vec<StageError>,
    pub elapsed_secs: f64,
}

impl VideoReport {
    pub fn new<P: AsRef<Path>>(video_path: P) -> Self {
        Self {
            video_path: video_path.as_ref().to_path_buf(),
            processed_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            audio_path: None,
            transcription: None,
            subtitles: Vec::new(),
            subtitle_text: None,
            errors: Vec::new(),
            elapsed_secs: 0.0,
        }
    }

    pub fn record_error<S: Into<String>>(&mut self, stage: Stage, message: S) {
        self.errors.push(StageError {
            stage,
            message: message.into(),
        });
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn subtitle_entry_count(&self) -> usize {
        self.subtitles.iter().map(|track| track.entries.len()).sum()
    }
}

/// Write the per-video artifacts: a structured JSON report and a
/// human-readable text digest, both timestamped in their filenames.
pub async fn write_reports(report: &VideoReport, output_dir: &Path) -> Result<(PathBuf, PathBuf)> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");

    let json_path = output_dir.join(format!("video_content_{}.json", timestamp));
    let json_content = serde_json::to_string_pretty(report)?;
    fs::write(&json_path, json_content).await?;
    info!("Video content report saved to {}", json_path.display());

    let text_path = output_dir.join(format!("video_text_{}.txt", timestamp));
    fs::write(&text_path, render_text_digest(report)).await?;
    info!("Text digest saved to {}", text_path.display());

    Ok((json_path, text_path))
}

/// Render the human-readable digest
pub fn render_text_digest(report: &VideoReport) -> String {
    let mut out = String::new();

    out.push_str("=== VIDEO CONTENT EXTRACTION ===\n\n");
    out.push_str(&format!("Video: {}\n", report.video_path.display()));
    out.push_str(&format!("Processed: {}\n\n", report.processed_at));

    if let Some(transcription) = &report.transcription {
        out.push_str("=== TRANSCRIPTION ===\n");
        out.push_str(&format!("Method: {}\n\n", transcription.source));
        out.push_str(&transcription.text);
        out.push_str("\n\n");
    }

    if !report.subtitles.is_empty() {
        out.push_str("=== SUBTITLES ===\n\n");
        for track in &report.subtitles {
            for entry in &track.entries {
                out.push_str(&format!("[{} --> {}]\n", entry.start_time, entry.end_time));
                out.push_str(&format!("{}\n\n", entry.text));
            }
        }
    }

    if !report.errors.is_empty() {
        out.push_str("=== ERRORS ===\n\n");
        for error in &report.errors {
            out.push_str(&format!("{}: {}\n", error.stage, error.message));
        }
    }

    out
}
