//! Vidtext - Video Text Content Extraction
//!
//! This is the main entry point for the vidtext application, which extracts
//! speech transcription and embedded subtitles from video files using
//! ffmpeg and Whisper.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use vidtext::batch::BatchRunner;
use vidtext::cli::{Args, Commands};
use vidtext::config::{Config, TranscriptionMode};
use vidtext::workflow::{StageOptions, VideoJob, Workflow};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    // Load configuration
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            // Try to load config.toml from current directory first
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    // Execute command
    match args.command {
        Commands::Process {
            input,
            output_dir,
            remote,
            api_key,
            language,
            audio_only,
            subtitles_only,
        } => {
            info!("Processing video file: {}", input.display());

            apply_transcription_flags(&mut config, remote, api_key, language);

            let output_dir = match output_dir {
                Some(dir) => dir,
                None => input
                    .parent()
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| PathBuf::from(".")),
            };

            let workflow = Workflow::new(config)?;
            let job = VideoJob::new(&input, &output_dir)
                .with_options(StageOptions::from_flags(audio_only, subtitles_only));

            let report = workflow.process_video(&job).await?;
            print_report_summary(&report, &output_dir);
        }
        Commands::Batch {
            input_dir,
            output_dir,
            remote,
            api_key,
            workers,
            extensions,
            recursive,
        } => {
            info!("Processing directory: {}", input_dir.display());

            apply_transcription_flags(&mut config, remote, api_key, None);

            if let Some(workers) = workers {
                config.batch.max_workers = workers;
            }
            if let Some(extensions) = extensions {
                config.batch.extensions = extensions
                    .split(',')
                    .map(|s| s.trim().trim_start_matches('.').to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
            if recursive {
                config.batch.recursive = true;
            }

            let output_dir = output_dir.unwrap_or_else(|| PathBuf::from("video_output"));

            let runner = BatchRunner::new(config)?;
            let summary = runner.run(&input_dir, &output_dir).await?;

            if summary.failed > 0 {
                info!("{} of {} videos failed; see the batch report for details", summary.failed, summary.total);
            }
        }
        Commands::Extract { input, output } => {
            info!("Extracting audio from: {}", input.display());

            let workflow = Workflow::new(config)?;
            workflow.extract_audio(&input, &output).await?;
            println!("Audio extracted to: {}", output.display());
        }
        Commands::Transcribe {
            input,
            output,
            remote,
            api_key,
            language,
        } => {
            info!("Transcribing audio: {}", input.display());

            apply_transcription_flags(&mut config, remote, api_key, language.clone());

            let workflow = Workflow::new(config)?;
            let result = workflow.transcribe_audio(&input, language.as_deref()).await?;

            match output {
                Some(output_path) => {
                    tokio::fs::write(&output_path, &result.text).await?;
                    println!("Transcription saved to: {}", output_path.display());
                }
                None => println!("{}", result.text),
            }
        }
        Commands::Subtitles { input, output_dir } => {
            info!("Extracting subtitles from: {}", input.display());

            let workflow = Workflow::new(config)?;
            let output_dir = output_dir.unwrap_or_else(|| PathBuf::from("."));

            match workflow.extract_subtitles_to_file(&input, &output_dir).await? {
                Some(path) => println!("Subtitles saved to: {}", path.display()),
                None => println!("No subtitles found in the video"),
            }
        }
    }

    Ok(())
}

/// Fold the per-invocation transcription flags into the configuration
fn apply_transcription_flags(
    config: &mut Config,
    remote: bool,
    api_key: Option<String>,
    language: Option<String>,
) {
    if remote {
        config.transcriber.mode = TranscriptionMode::Remote;
    }
    config.resolve_api_key(api_key);
    if language.is_some() {
        config.transcriber.language = language;
    }
}

/// Print a console summary for a single processed video
fn print_report_summary(report: &vidtext::report::VideoReport, output_dir: &std::path::Path) {
    println!("\n=== Video Content Extraction Summary ===");

    match &report.transcription {
        Some(transcription) => {
            println!("\nTranscription method: {}", transcription.source);
            println!("Transcription length: {} characters", transcription.text.len());
            let preview: String = transcription.text.chars().take(100).collect();
            println!("Transcription preview: {}...", preview);
        }
        None => println!("\nNo transcription available"),
    }

    if report.subtitles.is_empty() {
        println!("\nNo subtitles available");
    } else {
        println!("\nSubtitles: {} entries", report.subtitle_entry_count());
    }

    if !report.errors.is_empty() {
        println!("\nErrors:");
        for error in &report.errors {
            println!("  {}: {}", error.stage, error.message);
        }
    }

    println!("\nResults saved to: {}", output_dir.display());
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let vidtext_dir = std::env::current_dir()?.join(".vidtext");
    let log_dir = vidtext_dir.join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "vidtext.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    // Determine log level
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Create console layer
    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    // Create file layer
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    // Setup layered subscriber
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer);

    // Initialize the subscriber
    subscriber.try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
