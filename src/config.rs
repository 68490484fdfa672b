use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{Result, VidtextError};

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_api_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub transcriber: TranscriberConfig,
    pub media: MediaConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriberConfig {
    /// Transcription mode: Local or Remote
    pub mode: TranscriptionMode,
    /// Path to the local whisper binary
    pub binary_path: String,
    /// Model name passed to the local whisper binary
    pub model: String,
    /// Source language hint; autodetected when unset
    pub language: Option<String>,
    /// Base URL of the remote transcription API
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,
    /// Model identifier for the remote transcription API
    pub api_model: String,
    /// API key for remote transcription; resolved from CLI/environment when unset
    pub api_key: Option<String>,
    /// Timeout applied to remote transcription requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranscriptionMode {
    /// Local: offline recognition via the whisper command-line tool
    Local,
    /// Remote: cloud transcription via the OpenAI API
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to the ffmpeg binary
    pub binary_path: String,
    /// Path to the ffprobe binary
    pub probe_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Worker-count bound for parallel processing
    pub max_workers: usize,
    /// Video file extensions to pick up during discovery (lowercase, no dot)
    pub extensions: Vec<String>,
    /// Descend into subdirectories during discovery
    pub recursive: bool,
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            mode: TranscriptionMode::Local,
            binary_path: "whisper".to_string(),
            model: "base".to_string(),
            language: None,
            api_endpoint: default_api_endpoint(),
            api_model: "whisper-1".to_string(),
            api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            probe_path: "ffprobe".to_string(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            extensions: ["mp4", "mov", "avi", "mkv", "webm", "wmv", "flv"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            recursive: false,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VidtextError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| VidtextError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| VidtextError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| VidtextError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Resolve the remote API key: explicit flag wins, then the environment,
    /// then whatever the config file carried.
    pub fn resolve_api_key(&mut self, cli_key: Option<String>) {
        if cli_key.is_some() {
            self.transcriber.api_key = cli_key;
        } else if self.transcriber.api_key.is_none() {
            self.transcriber.api_key = std::env::var("OPENAI_API_KEY").ok();
        }
    }
}
