use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "vidscript",
    about = "Turn a YouTube, Bilibili, or local video source into a structured transcript",
    version,
    long_about = "A CLI tool that produces structured transcripts (language, full text, timestamped segments) from video sources. Platform captions are reused when available; otherwise audio is extracted and transcribed locally with faster-whisper."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transcribe a URL or local file
    Transcribe {
        /// URL or file path (YouTube, Bilibili, or a local media file)
        #[arg(value_name = "URL_OR_FILE")]
        source: String,

        /// Directory for audio artifacts and the transcript document
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Keep the downloaded/transcoded audio file after the run
        #[arg(long)]
        keep_audio: bool,

        /// Whisper model size override (tiny, base, small, medium, large-v3)
        #[arg(long, value_name = "SIZE")]
        model_size: Option<String>,
    },

    /// Show or edit configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },

    /// List supported platforms
    Platforms,
}
