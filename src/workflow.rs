use chrono::Local;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Result, VidtextError};
use crate::media::{MediaProcessorFactory, MediaProcessorTrait};
use crate::report::{self, Stage, VideoReport};
use crate::subtitle::{FfmpegSubtitleExtractor, SubtitleExtractorTrait, SubtitleTrack};
use crate::transcribe::{TranscriberFactory, TranscriberTrait, TranscriptionResult};

/// Which stages a job runs. Replaces ad hoc skip flags with named options.
#[derive(Debug, Clone, Copy)]
pub struct StageOptions {
    pub include_audio: bool,
    pub include_subtitles: bool,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            include_audio: true,
            include_subtitles: true,
        }
    }
}

impl StageOptions {
    /// Map the CLI restriction flags. When both flags are set, both stages
    /// were explicitly requested, so both run.
    pub fn from_flags(audio_only: bool, subtitles_only: bool) -> Self {
        match (audio_only, subtitles_only) {
            (false, false) | (true, true) => Self::default(),
            (true, false) => Self {
                include_audio: true,
                include_subtitles: false,
            },
            (false, true) => Self {
                include_audio: false,
                include_subtitles: true,
            },
        }
    }
}

/// One unit of work: a single video and where its reports go.
/// Immutable after construction.
#[derive(Debug, Clone)]
pub struct VideoJob {
    pub video_path: PathBuf,
    pub output_dir: PathBuf,
    pub options: StageOptions,
}

impl VideoJob {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(video_path: P, output_dir: Q) -> Self {
        Self {
            video_path: video_path.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            options: StageOptions::default(),
        }
    }

    pub fn with_options(mut self, options: StageOptions) -> Self {
        self.options = options;
        self
    }
}

/// Per-video orchestrator: sequences audio extraction, transcription and
/// subtitle extraction, capturing stage failures into the report instead
/// of aborting sibling stages.
pub struct Workflow {
    media: Box<dyn MediaProcessorTrait>,
    transcriber: Box<dyn TranscriberTrait>,
    subtitles: Box<dyn SubtitleExtractorTrait>,
}

impl Workflow {
    pub fn new(config: Config) -> Result<Self> {
        let media = MediaProcessorFactory::create_processor(config.media.clone());

        // Missing ffmpeg is not fatal here; affected stages fail per-job
        // and end up recorded in the report.
        if let Err(e) = media.check_availability() {
            warn!("Media processor unavailable ({}); extraction stages will fail", e);
        }

        let transcriber = TranscriberFactory::create_transcriber(config.transcriber.clone())?;
        let subtitles = Box::new(FfmpegSubtitleExtractor::new(config.media.clone()));

        Ok(Self {
            media,
            transcriber,
            subtitles,
        })
    }

    #[cfg(test)]
    fn with_parts(
        media: Box<dyn MediaProcessorTrait>,
        transcriber: Box<dyn TranscriberTrait>,
        subtitles: Box<dyn SubtitleExtractorTrait>,
    ) -> Self {
        Self {
            media,
            transcriber,
            subtitles,
        }
    }

    /// Process one video into exactly one report. Stage errors are recorded
    /// in the report; only job-level failures (missing input, unwritable
    /// output) surface as Err.
    pub async fn process_video(&self, job: &VideoJob) -> Result<VideoReport> {
        let start = Instant::now();
        info!("Processing video: {}", job.video_path.display());

        if !job.video_path.exists() {
            return Err(VidtextError::FileNotFound(job.video_path.display().to_string()));
        }

        fs::create_dir_all(&job.output_dir).await?;

        let mut report = VideoReport::new(&job.video_path);

        if job.options.include_audio {
            self.run_audio_stages(job, &mut report).await;
        }

        if job.options.include_subtitles {
            self.run_subtitle_stage(job, &mut report).await;
        }

        report.elapsed_secs = start.elapsed().as_secs_f64();

        report::write_reports(&report, &job.output_dir).await?;

        if report.is_success() {
            info!("Completed {} in {:.2}s", job.video_path.display(), report.elapsed_secs);
        } else {
            warn!(
                "Completed {} with {} stage error(s)",
                job.video_path.display(),
                report.errors.len()
            );
        }

        Ok(report)
    }

    async fn run_audio_stages(&self, job: &VideoJob, report: &mut VideoReport) {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let audio_path = job.output_dir.join(format!("audio_{}.wav", timestamp));

        match self.media.extract_audio(&job.video_path, &audio_path).await {
            Ok(()) => report.audio_path = Some(audio_path),
            Err(e) => {
                warn!("Audio extraction failed for {}: {}", job.video_path.display(), e);
                report.record_error(Stage::AudioExtraction, e.to_string());
            }
        }

        // Transcription needs the extracted audio; skipped when the
        // extraction stage already failed.
        if let Some(audio_path) = report.audio_path.clone() {
            match self.transcriber.transcribe(&audio_path, None).await {
                Ok(transcription) => report.transcription = Some(transcription),
                Err(e) => {
                    warn!("Transcription failed for {}: {}", job.video_path.display(), e);
                    report.record_error(Stage::Transcription, e.to_string());
                }
            }
        }
    }

    async fn run_subtitle_stage(&self, job: &VideoJob, report: &mut VideoReport) {
        match self.subtitles.extract(&job.video_path).await {
            Ok(tracks) => {
                if !tracks.is_empty() {
                    report.subtitle_text = Some(combined_subtitle_text(&tracks));
                }
                report.subtitles = tracks;
            }
            Err(e) => {
                warn!("Subtitle extraction failed for {}: {}", job.video_path.display(), e);
                report.record_error(Stage::SubtitleExtraction, e.to_string());
            }
        }
    }

    /// Extract audio from a video to an explicit path
    pub async fn extract_audio<P: AsRef<Path>>(&self, video_path: P, audio_path: P) -> Result<()> {
        let video_path = video_path.as_ref();

        if !video_path.exists() {
            return Err(VidtextError::FileNotFound(video_path.display().to_string()));
        }

        self.media.extract_audio(video_path, audio_path.as_ref()).await
    }

    /// Transcribe an existing audio file
    pub async fn transcribe_audio<P: AsRef<Path>>(
        &self,
        audio_path: P,
        language: Option<&str>,
    ) -> Result<TranscriptionResult> {
        let audio_path = audio_path.as_ref();

        if !audio_path.exists() {
            return Err(VidtextError::FileNotFound(audio_path.display().to_string()));
        }

        self.transcriber.transcribe(audio_path, language).await
    }

    /// Extract embedded subtitles from a video
    pub async fn extract_subtitles<P: AsRef<Path>>(&self, video_path: P) -> Result<Vec<SubtitleTrack>> {
        let video_path = video_path.as_ref();

        if !video_path.exists() {
            return Err(VidtextError::FileNotFound(video_path.display().to_string()));
        }

        self.subtitles.extract(video_path).await
    }

    /// Extract embedded subtitles and write them to a timestamped text
    /// file. Returns None when the video carries no subtitles.
    pub async fn extract_subtitles_to_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        video_path: P,
        output_dir: Q,
    ) -> Result<Option<PathBuf>> {
        let tracks = self.extract_subtitles(video_path).await?;
        if tracks.is_empty() {
            return Ok(None);
        }

        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir).await?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let output_path = output_dir.join(format!("subtitles_{}.txt", timestamp));

        let mut content = String::new();
        for track in &tracks {
            for entry in &track.entries {
                content.push_str(&format!("[{} --> {}]\n", entry.start_time, entry.end_time));
                content.push_str(&format!("{}\n\n", entry.text));
            }
        }

        fs::write(&output_path, content).await?;
        info!("Subtitles saved to {}", output_path.display());

        Ok(Some(output_path))
    }
}

fn combined_subtitle_text(tracks: &[SubtitleTrack]) -> String {
    tracks
        .iter()
        .map(|track| track.plain_text())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::media::StreamInfo;
    use crate::subtitle::{SubtitleEntry, parse_srt};
    use crate::transcribe::{TranscriptionResult, TranscriptionSource};

    struct FakeMedia {
        fail: bool,
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl MediaProcessorTrait for FakeMedia {
        async fn extract_audio(&self, _video_path: &Path, audio_path: &Path) -> Result<()> {
            self.called.store(true, Ordering::SeqCst);
            if self.fail {
                return Err(VidtextError::Media("no audio stream".to_string()));
            }
            std::fs::write(audio_path, b"RIFF")?;
            Ok(())
        }

        async fn probe_streams(&self, _video_path: &Path) -> Result<Vec<StreamInfo>> {
            Ok(Vec::new())
        }

        fn check_availability(&self) -> Result<()> {
            Ok(())
        }

        async fn version_info(&self) -> Result<String> {
            Ok("fake".to_string())
        }
    }

    struct FakeTranscriber {
        error: Option<fn() -> VidtextError>,
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl TranscriberTrait for FakeTranscriber {
        async fn transcribe(&self, _audio_path: &Path, _language: Option<&str>) -> Result<TranscriptionResult> {
            self.called.store(true, Ordering::SeqCst);
            if let Some(make_error) = self.error {
                return Err(make_error());
            }
            Ok(TranscriptionResult {
                text: "hello from the fake engine".to_string(),
                source: TranscriptionSource::Local,
                duration: Some(1.0),
                confidence: None,
                language: Some("en".to_string()),
            })
        }
    }

    struct FakeSubtitles {
        entries: Vec<SubtitleEntry>,
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl SubtitleExtractorTrait for FakeSubtitles {
        async fn extract(&self, _video_path: &Path) -> Result<Vec<SubtitleTrack>> {
            self.called.store(true, Ordering::SeqCst);
            if self.entries.is_empty() {
                return Ok(Vec::new());
            }
            Ok(vec![SubtitleTrack {
                track_index: 2,
                format: "subrip".to_string(),
                language: Some("eng".to_string()),
                entries: self.entries.clone(),
            }])
        }
    }

    struct Flags {
        media: Arc<AtomicBool>,
        transcriber: Arc<AtomicBool>,
        subtitles: Arc<AtomicBool>,
    }

    fn workflow(media_fails: bool, transcriber_error: Option<fn() -> VidtextError>, entries: Vec<SubtitleEntry>) -> (Workflow, Flags) {
        let flags = Flags {
            media: Arc::new(AtomicBool::new(false)),
            transcriber: Arc::new(AtomicBool::new(false)),
            subtitles: Arc::new(AtomicBool::new(false)),
        };

        let workflow = Workflow::with_parts(
            Box::new(FakeMedia {
                fail: media_fails,
                called: flags.media.clone(),
            }),
            Box::new(FakeTranscriber {
                error: transcriber_error,
                called: flags.transcriber.clone(),
            }),
            Box::new(FakeSubtitles {
                entries,
                called: flags.subtitles.clone(),
            }),
        );

        (workflow, flags)
    }

    fn fixture_job(dir: &tempfile::TempDir) -> VideoJob {
        let video_path = dir.path().join("clip.mp4");
        std::fs::write(&video_path, b"not really a video").unwrap();
        VideoJob::new(&video_path, &dir.path().join("out"))
    }

    fn sample_entries() -> Vec<SubtitleEntry> {
        parse_srt("1\n00:00:01,000 --> 00:00:02,000\nembedded text\n")
    }

    fn written_reports(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().starts_with("video_content_"))
                    .unwrap_or(false)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_all_stages_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let (workflow, _flags) = workflow(false, None, sample_entries());
        let job = fixture_job(&dir);

        let report = workflow.process_video(&job).await.unwrap();

        assert!(report.is_success());
        assert_eq!(
            report.transcription.as_ref().unwrap().text,
            "hello from the fake engine"
        );
        assert_eq!(report.subtitles.len(), 1);
        assert_eq!(report.subtitle_text.as_deref(), Some("embedded text"));
        assert_eq!(written_reports(&job.output_dir).len(), 1);
    }

    #[tokio::test]
    async fn test_audio_failure_does_not_block_subtitles() {
        let dir = tempfile::tempdir().unwrap();
        let (workflow, flags) = workflow(true, None, sample_entries());
        let job = fixture_job(&dir);

        let report = workflow.process_video(&job).await.unwrap();

        assert!(!report.is_success());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].stage, Stage::AudioExtraction);
        // No audio, so the transcriber must not have been invoked
        assert!(!flags.transcriber.load(Ordering::SeqCst));
        // Subtitle extraction still ran and produced its track
        assert!(flags.subtitles.load(Ordering::SeqCst));
        assert_eq!(report.subtitles.len(), 1);
        // Exactly one report regardless of the failure
        assert_eq!(written_reports(&job.output_dir).len(), 1);
    }

    #[tokio::test]
    async fn test_auth_error_recorded_per_job() {
        let dir = tempfile::tempdir().unwrap();
        let (workflow, _flags) = workflow(
            false,
            Some(|| VidtextError::Auth("no API key configured".to_string())),
            Vec::new(),
        );
        let job = fixture_job(&dir);

        let report = workflow.process_video(&job).await.unwrap();

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].stage, Stage::Transcription);
        assert!(report.errors[0].message.contains("no API key"));
        assert!(report.transcription.is_none());
    }

    #[tokio::test]
    async fn test_no_subtitles_is_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let (workflow, _flags) = workflow(false, None, Vec::new());
        let job = fixture_job(&dir);

        let report = workflow.process_video(&job).await.unwrap();

        assert!(report.is_success());
        assert!(report.subtitles.is_empty());
        assert!(report.subtitle_text.is_none());

        // The serialized report still carries the empty field
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["subtitles"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_stage_gating() {
        let dir = tempfile::tempdir().unwrap();
        let (workflow, flags) = workflow(false, None, Vec::new());
        let job = fixture_job(&dir)
            .with_options(StageOptions::from_flags(true, false));

        workflow.process_video(&job).await.unwrap();

        assert!(flags.media.load(Ordering::SeqCst));
        assert!(!flags.subtitles.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_missing_input_is_job_level_error() {
        let dir = tempfile::tempdir().unwrap();
        let (workflow, _flags) = workflow(false, None, Vec::new());
        let job = VideoJob::new(dir.path().join("missing.mp4"), dir.path().join("out"));

        let err = workflow.process_video(&job).await.unwrap_err();
        assert!(matches!(err, VidtextError::FileNotFound(_)));
    }

    #[test]
    fn test_stage_options_flag_table() {
        let both = StageOptions::from_flags(false, false);
        assert!(both.include_audio && both.include_subtitles);

        let audio = StageOptions::from_flags(true, false);
        assert!(audio.include_audio && !audio.include_subtitles);

        let subs = StageOptions::from_flags(false, true);
        assert!(!subs.include_audio && subs.include_subtitles);

        // Conflicting flags: each stage was explicitly requested, run both
        let conflict = StageOptions::from_flags(true, true);
        assert!(conflict.include_audio && conflict.include_subtitles);
    }
}
