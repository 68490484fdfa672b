// Offline transcription via the whisper command-line tool.
//
// Best-effort on long recordings: recognition accuracy degrades with audio
// length, which is an accepted property of the offline engine, not a bug.

use async_trait::async_trait;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

use crate::config::TranscriberConfig;
use crate::error::{Result, VidtextError};
use super::{TranscriberTrait, TranscriptionResult, TranscriptionSource, WhisperOutput};

/// Local whisper CLI implementation
pub struct LocalTranscriber {
    config: TranscriberConfig,
}

impl LocalTranscriber {
    pub fn new(config: TranscriberConfig) -> Self {
        Self { config }
    }

    /// Execute transcription through the whisper command-line tool
    async fn execute_transcription(
        &self,
        audio_path: &Path,
        language: Option<&str>,
    ) -> Result<TranscriptionResult> {
        debug!("Executing local whisper transcription with model: {}", self.config.model);

        // Temporary output directory for the whisper JSON result
        let temp_dir = tempfile::tempdir()
            .map_err(|e| VidtextError::Transcriber(format!("Failed to create temp directory: {}", e)))?;
        let output_dir = temp_dir.path();

        let mut cmd = Command::new(&self.config.binary_path);
        cmd.arg(audio_path)
            .arg("--model").arg(&self.config.model)
            .arg("--output_dir").arg(output_dir)
            .arg("--output_format").arg("json");

        if let Some(lang) = language {
            cmd.arg("--language").arg(lang);
        }

        let output = cmd.output()
            .map_err(|e| VidtextError::Transcriber(format!(
                "Failed to execute {}: {}", self.config.binary_path, e
            )))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VidtextError::Transcriber(format!(
                "Local transcription failed: {}",
                stderr.trim()
            )));
        }

        // Whisper names its output after the audio file stem
        let audio_filename = audio_path.file_stem()
            .ok_or_else(|| VidtextError::Transcriber("Invalid audio filename".to_string()))?;
        let json_file = output_dir.join(format!("{}.json", audio_filename.to_string_lossy()));

        if !json_file.exists() {
            return Err(VidtextError::Transcriber("Whisper JSON output file not found".to_string()));
        }

        let json_content = std::fs::read_to_string(&json_file)
            .map_err(|e| VidtextError::Transcriber(format!("Failed to read JSON output: {}", e)))?;

        let whisper_output: WhisperOutput = serde_json::from_str(&json_content)
            .map_err(|e| VidtextError::Transcriber(format!("Failed to parse whisper JSON: {}", e)))?;

        Ok(whisper_output.into_result(TranscriptionSource::Local))
    }
}

#[async_trait]
impl TranscriberTrait for LocalTranscriber {
    async fn transcribe(&self, audio_path: &Path, language: Option<&str>) -> Result<TranscriptionResult> {
        info!("Starting local transcription of: {}", audio_path.display());

        let language = language.or(self.config.language.as_deref());
        let result = self.execute_transcription(audio_path, language).await?;

        info!("Local transcription completed ({} characters)", result.text.len());
        Ok(result)
    }
}
