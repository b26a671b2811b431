use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::Transcriber;
use crate::config::WhisperConfig;
use crate::model::{Segment, TranscriptResult};
use crate::{Result, TranscriptError};

/// JSON document written by the faster-whisper CLI (`--output_format json`)
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    #[serde(default)]
    start: f64,
    #[serde(default)]
    end: f64,
    #[serde(default)]
    text: String,
}

/// Speech-to-text via a local faster-whisper CLI (no API key needed).
///
/// Shells out to `whisper-ctranslate2` (binary configurable) with JSON
/// output, then trims and filters the segments the same way caption
/// normalization does, so both acquisition paths produce the same shape.
pub struct WhisperTranscriber {
    config: WhisperConfig,
}

impl WhisperTranscriber {
    pub fn new(config: WhisperConfig) -> Self {
        Self { config }
    }

    /// Check if the whisper binary is available
    pub async fn check_availability(&self) -> bool {
        Command::new(&self.config.binary)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn parse_output(raw: &str, model_size: &str) -> Result<TranscriptResult> {
        let output: WhisperOutput = serde_json::from_str(raw)
            .map_err(|e| TranscriptError::Transcription(format!("unreadable output: {e}")))?;

        let segments: Vec<Segment> = output
            .segments
            .iter()
            .filter_map(|seg| Segment::new(seg.start, seg.end, &seg.text))
            .collect();

        let raw_payload = serde_json::json!({
            "source": "whisper",
            "model": model_size,
        });
        TranscriptResult::from_segments(output.language, segments, Some(raw_payload)).ok_or_else(
            || TranscriptError::Transcription("transcription produced no speech segments".into()).into(),
        )
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptResult> {
        tracing::info!(
            "Loading whisper model: {} on {}",
            self.config.model_size,
            self.config.device
        );

        // The CLI writes one <stem>.json per input into --output_dir
        let scratch = tempfile::tempdir()
            .map_err(|e| TranscriptError::Transcription(format!("no scratch dir: {e}")))?;

        let audio = audio_path.to_string_lossy().into_owned();
        let scratch_dir = scratch.path().to_string_lossy().into_owned();
        let model_dir = self
            .config
            .model_dir
            .as_ref()
            .map(|dir| dir.to_string_lossy().into_owned());
        let mut args = vec![
            audio.as_str(),
            "--model",
            self.config.model_size.as_str(),
            "--device",
            self.config.device.as_str(),
            "--output_format",
            "json",
            "--output_dir",
            scratch_dir.as_str(),
        ];
        if let Some(dir) = model_dir.as_deref() {
            args.push("--model_directory");
            args.push(dir);
        }

        let progress = ProgressBar::new_spinner();
        progress.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        progress.enable_steady_tick(Duration::from_millis(120));
        progress.set_message(format!("Transcribing with whisper ({})...", self.config.model_size));

        let output = Command::new(&self.config.binary)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                TranscriptError::Transcription(format!(
                    "failed to run {}: {e}",
                    self.config.binary
                ))
            })?;

        if !output.status.success() {
            progress.finish_and_clear();
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(TranscriptError::Transcription(format!(
                "{} failed: {error}",
                self.config.binary
            ))
            .into());
        }

        progress.finish_with_message("Transcription complete");

        let stem = audio_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("audio");
        let json_path = scratch.path().join(format!("{stem}.json"));
        let raw = fs_err::read_to_string(&json_path).map_err(|e| {
            TranscriptError::Transcription(format!("missing whisper output: {e}"))
        })?;

        let result = Self::parse_output(&raw, &self.config.model_size)?;
        tracing::info!(
            "Transcription complete: {} segments, language={:?}",
            result.segments.len(),
            result.language
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whisper_json_and_filters_empty_segments() {
        let raw = r#"{
            "language": "en",
            "segments": [
                {"start": 0.0, "end": 2.5, "text": " Hello there. "},
                {"start": 2.5, "end": 3.0, "text": "   "},
                {"start": 3.0, "end": 5.0, "text": "General Kenobi."}
            ]
        }"#;

        let result = WhisperTranscriber::parse_output(raw, "base").unwrap();
        assert_eq!(result.language.as_deref(), Some("en"));
        assert_eq!(result.segments.len(), 2);
        assert_eq!(result.segments[0].text, "Hello there.");
        assert_eq!(result.full_text, "Hello there. General Kenobi.");
        assert_eq!(result.raw.unwrap()["model"], "base");
    }

    #[test]
    fn empty_transcription_is_an_error() {
        let raw = r#"{"language": "en", "segments": [{"start": 0.0, "end": 1.0, "text": " "}]}"#;
        let err = WhisperTranscriber::parse_output(raw, "base").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TranscriptError>(),
            Some(TranscriptError::Transcription(_))
        ));
    }

    #[test]
    fn garbage_output_is_an_error() {
        assert!(WhisperTranscriber::parse_output("not json", "base").is_err());
    }
}
