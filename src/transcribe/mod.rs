// Modular transcription architecture
//
// Two implementations behind a common trait, selected through a factory:
// - Local: offline recognition via the whisper command-line tool
// - Remote: cloud transcription via the OpenAI API
//
// To add a new transcription backend:
// 1. Create backend-specific data structures for parsing its output
// 2. Convert them to TranscriptionResult in the new module
// 3. Add a variant to TranscriptionMode and update the factory

pub mod common;
pub mod local;
pub mod remote;

use async_trait::async_trait;
use std::path::Path;

pub use common::*;

use crate::config::{TranscriberConfig, TranscriptionMode};
use crate::error::Result;

/// Main trait for transcription operations
#[async_trait]
pub trait TranscriberTrait: Send + Sync {
    /// Transcribe an audio file to text
    async fn transcribe(&self, audio_path: &Path, language: Option<&str>) -> Result<TranscriptionResult>;
}

/// Factory for creating transcriber instances
pub struct TranscriberFactory;

impl TranscriberFactory {
    /// Create a transcriber for the configured mode
    pub fn create_transcriber(config: TranscriberConfig) -> Result<Box<dyn TranscriberTrait>> {
        match config.mode {
            TranscriptionMode::Local => {
                Ok(Box::new(local::LocalTranscriber::new(config)))
            }
            TranscriptionMode::Remote => {
                Ok(Box::new(remote::RemoteTranscriber::new(config)?))
            }
        }
    }
}
