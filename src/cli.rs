use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract transcription and subtitles from a single video file
    Process {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for report files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Use the remote transcription API instead of the local engine
        #[arg(long)]
        remote: bool,

        /// API key for remote transcription (falls back to OPENAI_API_KEY)
        #[arg(short = 'k', long)]
        api_key: Option<String>,

        /// Source language hint
        #[arg(short, long)]
        language: Option<String>,

        /// Only run audio extraction and transcription
        #[arg(long)]
        audio_only: bool,

        /// Only run subtitle extraction
        #[arg(long)]
        subtitles_only: bool,
    },

    /// Process all video files in a directory
    Batch {
        /// Input directory containing video files
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Output directory for report files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Use the remote transcription API instead of the local engine
        #[arg(long)]
        remote: bool,

        /// API key for remote transcription (falls back to OPENAI_API_KEY)
        #[arg(short = 'k', long)]
        api_key: Option<String>,

        /// Maximum number of parallel workers
        #[arg(short, long)]
        workers: Option<usize>,

        /// Video file extensions to process (comma-separated)
        #[arg(short, long)]
        extensions: Option<String>,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,
    },

    /// Extract audio from a video file
    Extract {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output audio file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Transcribe an existing audio file
    Transcribe {
        /// Input audio file
        #[arg(short, long)]
        input: PathBuf,

        /// Output text file (prints to stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Use the remote transcription API instead of the local engine
        #[arg(long)]
        remote: bool,

        /// API key for remote transcription (falls back to OPENAI_API_KEY)
        #[arg(short = 'k', long)]
        api_key: Option<String>,

        /// Source language hint
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Extract embedded subtitles from a video file
    Subtitles {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for the subtitle text file
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}
