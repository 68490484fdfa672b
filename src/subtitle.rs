use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::config::MediaConfig;
use crate::error::{Result, VidtextError};
use crate::media::{FfmpegProcessor, MediaCommandBuilder, MediaProcessorTrait};

/// Subtitle codecs ffmpeg can convert to SRT text. Bitmap formats
/// (PGS, DVD) carry no text and are skipped.
const TEXT_SUBTITLE_CODECS: &[&str] = &["subrip", "srt", "ass", "ssa", "webvtt", "mov_text", "text"];

/// One cue from a subtitle track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleEntry {
    pub index: u32,
    pub start_time: String,
    pub end_time: String,
    pub text: String,
}

/// One embedded subtitle track converted to text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleTrack {
    pub track_index: u32,
    pub format: String,
    pub language: Option<String>,
    pub entries: Vec<SubtitleEntry>,
}

impl SubtitleTrack {
    /// All cue text joined with newlines
    pub fn plain_text(&self) -> String {
        self.entries
            .iter()
            .map(|entry| entry.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Trait for subtitle extraction; absence of subtitles is an empty
/// result, never an error.
#[async_trait]
pub trait SubtitleExtractorTrait: Send + Sync {
    async fn extract(&self, video_path: &Path) -> Result<Vec<SubtitleTrack>>;
}

/// ffprobe/ffmpeg-backed subtitle extractor
pub struct FfmpegSubtitleExtractor {
    processor: FfmpegProcessor,
    command_builder: MediaCommandBuilder,
}

impl FfmpegSubtitleExtractor {
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path, &config.probe_path);
        let processor = FfmpegProcessor::new(config);

        Self {
            processor,
            command_builder,
        }
    }
}

#[async_trait]
impl SubtitleExtractorTrait for FfmpegSubtitleExtractor {
    async fn extract(&self, video_path: &Path) -> Result<Vec<SubtitleTrack>> {
        info!("Probing {} for embedded subtitles", video_path.display());

        let streams = self.processor.probe_streams(video_path).await
            .map_err(|e| VidtextError::Subtitle(format!("Failed to probe subtitle streams: {}", e)))?;

        let subtitle_streams: Vec<_> = streams.into_iter().filter(|s| s.is_subtitle()).collect();

        if subtitle_streams.is_empty() {
            info!("No embedded subtitle streams found");
            return Ok(Vec::new());
        }

        info!("Found {} subtitle stream(s)", subtitle_streams.len());

        let temp_dir = tempfile::tempdir()
            .map_err(|e| VidtextError::Subtitle(format!("Failed to create temp directory: {}", e)))?;

        let mut tracks = Vec::new();
        for stream in subtitle_streams {
            let codec = stream.codec_name.clone().unwrap_or_else(|| "unknown".to_string());

            if !TEXT_SUBTITLE_CODECS.contains(&codec.as_str()) {
                warn!("Skipping subtitle stream {} with non-text codec {}", stream.index, codec);
                continue;
            }

            let srt_path = temp_dir.path().join(format!("track_{}.srt", stream.index));
            let command = self.command_builder.extract_subtitle_track(
                video_path,
                stream.index,
                &srt_path,
            );

            if let Err(e) = command.execute().await {
                warn!("Failed to extract subtitle stream {}: {}", stream.index, e);
                continue;
            }

            let content = std::fs::read_to_string(&srt_path)
                .map_err(|e| VidtextError::Subtitle(format!("Failed to read extracted subtitles: {}", e)))?;

            let entries = parse_srt(&content);
            info!("Extracted {} cues from subtitle stream {}", entries.len(), stream.index);

            tracks.push(SubtitleTrack {
                track_index: stream.index,
                format: codec,
                language: stream.language().map(|s| s.to_string()),
                entries,
            });
        }

        Ok(tracks)
    }
}

/// Parse SRT content into cue entries.
///
/// Blocks are separated by blank lines: an index line, a
/// `HH:MM:SS,mmm --> HH:MM:SS,mmm` time line, then text lines.
/// Malformed blocks are dropped rather than failing the track.
pub fn parse_srt(content: &str) -> Vec<SubtitleEntry> {
    let normalized = content.replace("\r\n", "\n");
    let mut entries = Vec::new();

    for block in normalized.split("\n\n") {
        let lines: Vec<&str> = block.lines().filter(|l| !l.trim().is_empty()).collect();
        if lines.len() < 2 {
            continue;
        }

        let Ok(index) = lines[0].trim().trim_start_matches('\u{feff}').parse::<u32>() else {
            continue;
        };

        let Some((start, end)) = parse_time_line(lines[1]) else {
            continue;
        };

        let text = lines[2..].join("\n").trim().to_string();
        if text.is_empty() {
            continue;
        }

        entries.push(SubtitleEntry {
            index,
            start_time: start,
            end_time: end,
            text,
        });
    }

    entries
}

fn parse_time_line(line: &str) -> Option<(String, String)> {
    let (start, end) = line.split_once("-->")?;
    let start = start.trim();
    let end = end.trim();

    if !is_srt_timestamp(start) || !is_srt_timestamp(end) {
        return None;
    }

    Some((start.to_string(), end.to_string()))
}

/// HH:MM:SS,mmm
fn is_srt_timestamp(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 12 {
        return false;
    }

    for (i, b) in bytes.iter().enumerate() {
        let ok = match i {
            2 | 5 => *b == b':',
            8 => *b == b',',
            _ => b.is_ascii_digit(),
        };
        if !ok {
            return false;
        }
    }

    true
}
