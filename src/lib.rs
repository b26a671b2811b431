//! vidscript - A Rust CLI tool for turning video sources into structured transcripts
//!
//! This library turns a YouTube URL, Bilibili URL, or local media file into a
//! structured transcript (language, full text, timestamped segments). Platform
//! captions are reused when available; otherwise audio is extracted and handed
//! to a local faster-whisper CLI.

pub mod captions;
pub mod cli;
pub mod config;
pub mod model;
pub mod output;
pub mod sources;
pub mod transcribe;
pub mod utils;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use model::{AudioMeta, Platform, Segment, TranscriptResult};
pub use transcribe::{Pipeline, PipelineOutput, Transcriber};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to transcript acquisition
#[derive(thiserror::Error, Debug)]
pub enum TranscriptError {
    #[error("Download failed: {0}")]
    Download(String),

    #[error("Audio extraction failed: {0}")]
    Transcode(String),

    #[error("Local file not found: {}", .0.display())]
    NotFound(std::path::PathBuf),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("No strategy registered for platform: {0}")]
    UnsupportedPlatform(String),
}
