use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

use crate::config::MediaConfig;
use crate::error::{Result, VidtextError};
use super::{MediaCommandBuilder, MediaProcessorTrait};

/// One container stream as reported by ffprobe
#[derive(Debug, Clone, Deserialize)]
pub struct StreamInfo {
    pub index: u32,
    pub codec_type: Option<String>,
    pub codec_name: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

impl StreamInfo {
    pub fn is_subtitle(&self) -> bool {
        self.codec_type.as_deref() == Some("subtitle")
    }

    pub fn language(&self) -> Option<&str> {
        self.tags.get("language").map(|s| s.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<StreamInfo>,
}

/// ffmpeg-backed media processor
pub struct FfmpegProcessor {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl FfmpegProcessor {
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path, &config.probe_path);

        Self {
            config,
            command_builder,
        }
    }
}

#[async_trait]
impl MediaProcessorTrait for FfmpegProcessor {
    async fn extract_audio(
        &self,
        video_path: &Path,
        audio_path: &Path,
    ) -> Result<()> {
        info!("Extracting audio from {} to {}", video_path.display(), audio_path.display());

        let command = self.command_builder.extract_audio(video_path, audio_path);
        command.execute().await?;

        info!("Audio extraction completed");
        Ok(())
    }

    async fn probe_streams(&self, video_path: &Path) -> Result<Vec<StreamInfo>> {
        debug!("Probing streams of {}", video_path.display());

        let command = self.command_builder.probe_streams(video_path);
        let stdout = command.execute_capture().await?;

        let probe: ProbeOutput = serde_json::from_str(&stdout)
            .map_err(|e| VidtextError::Media(format!("Failed to parse ffprobe output: {}", e)))?;

        Ok(probe.streams)
    }

    fn check_availability(&self) -> Result<()> {
        let output = Command::new(&self.config.binary_path)
            .arg("-version")
            .output()
            .map_err(|e| VidtextError::Media(format!("Media processor not found: {}", e)))?;

        if output.status.success() {
            debug!("Media processor is available");
            Ok(())
        } else {
            Err(VidtextError::Media("Media processor version check failed".to_string()))
        }
    }

    async fn version_info(&self) -> Result<String> {
        let output = Command::new(&self.config.binary_path)
            .arg("-version")
            .output()
            .map_err(|e| VidtextError::Media(format!("Failed to execute media processor: {}", e)))?;

        if output.status.success() {
            let version_info = String::from_utf8_lossy(&output.stdout);
            let first_line = version_info.lines().next().unwrap_or("Unknown version");
            Ok(first_line.to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(VidtextError::Media(format!("Media processor version check failed: {}", stderr)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_output() {
        let json = r#"{
            "streams": [
                {"index": 0, "codec_type": "video", "codec_name": "h264"},
                {"index": 1, "codec_type": "audio", "codec_name": "aac"},
                {"index": 2, "codec_type": "subtitle", "codec_name": "subrip", "tags": {"language": "eng"}}
            ]
        }"#;

        let probe: ProbeOutput = serde_json::from_str(json).unwrap();
        assert_eq!(probe.streams.len(), 3);

        let subs: Vec<_> = probe.streams.iter().filter(|s| s.is_subtitle()).collect();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].index, 2);
        assert_eq!(subs[0].language(), Some("eng"));
    }

    #[test]
    fn test_parse_probe_output_without_streams() {
        let probe: ProbeOutput = serde_json::from_str("{}").unwrap();
        assert!(probe.streams.is_empty());
    }
}
