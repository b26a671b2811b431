use async_trait::async_trait;
use std::path::Path;

use crate::config::Config;
use crate::model::{AudioMeta, Platform, TranscriptResult};
use crate::sources::StrategyRegistry;
use crate::Result;

pub mod whisper;

pub use whisper::WhisperTranscriber;

/// Speech-to-text collaborator. The pipeline hands it an audio file path
/// and gets back the same [`TranscriptResult`] shape caption normalization
/// produces.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptResult>;
}

/// Result of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// The acquired transcript
    pub transcript: TranscriptResult,

    /// Source title, empty when unavailable
    pub title: String,

    /// Platform the source was classified as
    pub platform: Platform,
}

/// Pipeline stages. Each state carries exactly the data the stage needs, so
/// the captions-found shortcut (straight to `Done`, no audio fetch for
/// transcription) is an explicit transition rather than a side effect.
enum PipelineState {
    Classifying,
    TryingCaptions {
        platform: Platform,
    },
    FetchingAudio {
        platform: Platform,
    },
    Transcribing {
        platform: Platform,
        audio: AudioMeta,
    },
    Cleanup {
        platform: Platform,
        audio: AudioMeta,
        transcript: TranscriptResult,
    },
    Done {
        platform: Platform,
        transcript: TranscriptResult,
        title: String,
    },
}

/// Transcript acquisition pipeline: captions first, audio plus speech-to-text
/// as the fallback. Owns the audio artifact for the duration of one run.
pub struct Pipeline {
    registry: StrategyRegistry,
    transcriber: Box<dyn Transcriber>,
}

impl Pipeline {
    /// Create a pipeline with the built-in strategies and the whisper CLI
    /// collaborator configured from `config`.
    pub fn new(config: &Config) -> Self {
        Self {
            registry: StrategyRegistry::new(),
            transcriber: Box::new(WhisperTranscriber::new(config.whisper.clone())),
        }
    }

    /// Create a pipeline from explicit parts
    pub fn with_parts(registry: StrategyRegistry, transcriber: Box<dyn Transcriber>) -> Self {
        Self {
            registry,
            transcriber,
        }
    }

    /// Run the pipeline for one source.
    ///
    /// Caption absence is recovered locally by falling back to
    /// transcription; every other strategy or collaborator error propagates
    /// unmodified. Unless `keep_audio` is set, the downloaded or transcoded
    /// audio artifact is deleted before returning.
    pub async fn run(
        &self,
        source: &str,
        output_dir: &Path,
        keep_audio: bool,
    ) -> Result<PipelineOutput> {
        let mut state = PipelineState::Classifying;

        loop {
            state = match state {
                PipelineState::Classifying => {
                    let platform = Platform::classify(source);
                    tracing::info!("Detected platform: {platform}");
                    // Resolve the strategy up front so a registry miss fails
                    // before any work happens
                    self.registry.strategy_for(platform)?;
                    if platform == Platform::Local {
                        PipelineState::FetchingAudio { platform }
                    } else {
                        PipelineState::TryingCaptions { platform }
                    }
                }

                PipelineState::TryingCaptions { platform } => {
                    let strategy = self.registry.strategy_for(platform)?;
                    tracing::info!("Trying {platform} captions...");
                    match strategy.fetch_captions(source, output_dir).await {
                        Some(transcript) => {
                            tracing::info!("Got {platform} captions, skipping audio download");
                            let title = match strategy.fetch_title(source).await {
                                Ok(title) => title,
                                Err(err) => {
                                    tracing::warn!(
                                        "Title lookup failed, continuing without one: {err:#}"
                                    );
                                    String::new()
                                }
                            };
                            PipelineState::Done {
                                platform,
                                transcript,
                                title,
                            }
                        }
                        None => {
                            tracing::info!("No captions, falling back to transcription");
                            PipelineState::FetchingAudio { platform }
                        }
                    }
                }

                PipelineState::FetchingAudio { platform } => {
                    let strategy = self.registry.strategy_for(platform)?;
                    let audio = strategy.fetch_audio(source, output_dir).await?;
                    tracing::info!("Audio ready: {}", audio.file_path.display());
                    PipelineState::Transcribing { platform, audio }
                }

                PipelineState::Transcribing { platform, audio } => {
                    tracing::info!("Transcribing audio: {}", audio.file_path.display());
                    let transcript = self.transcriber.transcribe(&audio.file_path).await?;
                    PipelineState::Cleanup {
                        platform,
                        audio,
                        transcript,
                    }
                }

                PipelineState::Cleanup {
                    platform,
                    audio,
                    transcript,
                } => {
                    if keep_audio {
                        tracing::info!("Keeping audio file: {}", audio.file_path.display());
                    } else if let Err(err) = fs_err::remove_file(&audio.file_path) {
                        // Deletion failure is logged, never fatal
                        tracing::warn!(
                            "Failed to delete audio file {}: {err}",
                            audio.file_path.display()
                        );
                    }
                    PipelineState::Done {
                        platform,
                        transcript,
                        title: audio.title,
                    }
                }

                PipelineState::Done {
                    platform,
                    transcript,
                    title,
                } => {
                    return Ok(PipelineOutput {
                        transcript,
                        title,
                        platform,
                    });
                }
            };
        }
    }
}
