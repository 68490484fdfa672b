// Cloud transcription via the OpenAI audio API.
//
// Side effects: one network call per transcription, billed against the
// account quota behind the supplied API key.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::TranscriberConfig;
use crate::error::{Result, VidtextError};
use super::{TranscriberTrait, TranscriptionResult, TranscriptionSource, WhisperOutput};

/// Remote transcription API implementation
pub struct RemoteTranscriber {
    config: TranscriberConfig,
    client: reqwest::Client,
}

impl RemoteTranscriber {
    pub fn new(config: TranscriberConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(VidtextError::Http)?;

        Ok(Self { config, client })
    }

    /// The configured API key, or an authentication error when none was resolved
    fn api_key(&self) -> Result<&str> {
        match self.config.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(VidtextError::Auth(
                "No API key configured for remote transcription; pass --api-key or set OPENAI_API_KEY".to_string(),
            )),
        }
    }

    async fn upload_audio(
        &self,
        audio_path: &Path,
        language: Option<&str>,
    ) -> Result<WhisperOutput> {
        let key = self.api_key()?.to_string();

        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.wav".to_string());

        let audio_bytes = tokio::fs::read(audio_path).await
            .map_err(|e| VidtextError::Transcriber(format!("Failed to read audio file: {}", e)))?;

        let mut form = Form::new()
            .part(
                "file",
                Part::bytes(audio_bytes)
                    .file_name(file_name)
                    .mime_str("audio/wav")
                    .map_err(VidtextError::Http)?,
            )
            .text("model", self.config.api_model.clone())
            .text("response_format", "verbose_json");

        if let Some(lang) = language {
            form = form.text("language", lang.to_string());
        }

        let url = format!("{}/audio/transcriptions", self.config.api_endpoint.trim_end_matches('/'));
        debug!("Uploading audio to {}", url);

        let response = self.client
            .post(&url)
            .bearer_auth(&key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| VidtextError::RemoteService(format!("Transcription request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(VidtextError::Auth(format!(
                "Remote transcription service rejected the API key (HTTP {})",
                status.as_u16()
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VidtextError::RemoteService(format!(
                "Transcription API returned HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        response.json::<WhisperOutput>().await
            .map_err(|e| VidtextError::RemoteService(format!("Failed to parse API response: {}", e)))
    }
}

#[async_trait]
impl TranscriberTrait for RemoteTranscriber {
    async fn transcribe(&self, audio_path: &Path, language: Option<&str>) -> Result<TranscriptionResult> {
        info!("Starting remote transcription of: {}", audio_path.display());

        let language = language.or(self.config.language.as_deref());
        let output = self.upload_audio(audio_path, language).await?;
        let result = output.into_result(TranscriptionSource::Remote);

        info!("Remote transcription completed ({} characters)", result.text.len());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranscriptionMode;

    fn remote_config(api_key: Option<String>) -> TranscriberConfig {
        TranscriberConfig {
            mode: TranscriptionMode::Remote,
            api_key,
            ..TranscriberConfig::default()
        }
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_any_network_io() {
        let transcriber = RemoteTranscriber::new(remote_config(None)).unwrap();
        let err = transcriber
            .transcribe(Path::new("does-not-matter.wav"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, VidtextError::Auth(_)));
    }

    #[tokio::test]
    async fn test_blank_key_is_treated_as_missing() {
        let transcriber = RemoteTranscriber::new(remote_config(Some("   ".to_string()))).unwrap();
        let err = transcriber
            .transcribe(Path::new("does-not-matter.wav"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, VidtextError::Auth(_)));
    }
}
