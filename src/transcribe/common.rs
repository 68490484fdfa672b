use serde::{Deserialize, Serialize};

/// Which engine produced a transcription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionSource {
    Local,
    Remote,
}

impl std::fmt::Display for TranscriptionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptionSource::Local => write!(f, "local"),
            TranscriptionSource::Remote => write!(f, "remote"),
        }
    }
}

/// Engine-agnostic transcription result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub text: String,
    pub source: TranscriptionSource,
    /// Audio duration in seconds, when the engine reported one
    pub duration: Option<f64>,
    /// Mean segment confidence in [0, 1], when segment log-probabilities were available
    pub confidence: Option<f32>,
    pub language: Option<String>,
}

/// Whisper JSON output shared by the local CLI and the remote verbose_json format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperOutput {
    pub text: String,
    #[serde(default)]
    pub segments: Vec<WhisperSegment>,
    pub language: Option<String>,
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub avg_logprob: Option<f64>,
}

impl WhisperOutput {
    /// Convert raw whisper output into the engine-agnostic result
    pub fn into_result(self, source: TranscriptionSource) -> TranscriptionResult {
        let duration = self.duration
            .or_else(|| self.segments.last().map(|seg| seg.end));

        let confidence = mean_confidence(&self.segments);

        TranscriptionResult {
            text: self.text.trim().to_string(),
            source,
            duration,
            confidence,
            language: self.language,
        }
    }
}

/// Mean of exp(avg_logprob) across segments, clamped to [0, 1]
fn mean_confidence(segments: &[WhisperSegment]) -> Option<f32> {
    let probs: Vec<f64> = segments
        .iter()
        .filter_map(|seg| seg.avg_logprob)
        .map(|logprob| logprob.exp().clamp(0.0, 1.0))
        .collect();

    if probs.is_empty() {
        return None;
    }

    Some((probs.iter().sum::<f64>() / probs.len() as f64) as f32)
}
