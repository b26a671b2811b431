use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::SourceStrategy;
use crate::model::{AudioMeta, Platform, TranscriptResult};
use crate::{Result, TranscriptError};

/// Local-file strategy: no captions, audio comes from an ffmpeg transcode.
pub struct LocalFileStrategy {
    ffmpeg_path: String,
}

impl LocalFileStrategy {
    pub fn new() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
        }
    }

    /// Extract the audio track to mp3
    async fn convert_to_mp3(&self, input: &Path, target: &Path) -> Result<()> {
        tracing::info!("Extracting audio: {} -> {}", input.display(), target.display());

        let output = Command::new(&self.ffmpeg_path)
            .args([
                "-i",
                &input.to_string_lossy(),
                "-vn",
                "-acodec",
                "libmp3lame",
                "-y",
                &target.to_string_lossy(),
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| TranscriptError::Transcode(format!("failed to run ffmpeg: {e}")))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(TranscriptError::Transcode(format!("ffmpeg failed: {error}")).into());
        }

        Ok(())
    }
}

#[async_trait]
impl SourceStrategy for LocalFileStrategy {
    fn platform(&self) -> Platform {
        Platform::Local
    }

    fn caption_languages(&self) -> &'static [&'static str] {
        &[]
    }

    async fn fetch_audio(&self, source: &str, output_dir: &Path) -> Result<AudioMeta> {
        let input = Path::new(source);
        if !input.exists() {
            return Err(TranscriptError::NotFound(input.to_path_buf()).into());
        }

        fs_err::create_dir_all(output_dir)?;

        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("audio")
            .to_string();
        let mp3_path = output_dir.join(format!("{stem}.mp3"));

        // Idempotent per (source, output_dir): a previous run's transcode
        // at the expected path is reused as-is.
        if mp3_path.exists() {
            tracing::debug!("Reusing existing audio: {}", mp3_path.display());
        } else {
            self.convert_to_mp3(input, &mp3_path).await?;
        }

        Ok(AudioMeta {
            file_path: mp3_path,
            title: stem.clone(),
            duration: 0.0,
            platform: Platform::Local,
            video_id: stem,
        })
    }

    async fn fetch_captions(&self, _source: &str, _output_dir: &Path) -> Option<TranscriptResult> {
        // Local files carry no platform caption tracks
        None
    }

    async fn fetch_title(&self, source: &str) -> Result<String> {
        Ok(Path::new(source)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string())
    }
}

impl Default for LocalFileStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_input_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = LocalFileStrategy::new();

        let err = strategy
            .fetch_audio("no/such/video.mp4", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TranscriptError>(),
            Some(TranscriptError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn reuses_existing_mp3_without_transcoding() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("lecture.mp4");
        fs_err::write(&input, b"fake video").unwrap();

        let out_dir = dir.path().join("out");
        fs_err::create_dir_all(&out_dir).unwrap();
        let existing = out_dir.join("lecture.mp3");
        fs_err::write(&existing, b"fake audio").unwrap();

        // ffmpeg is never invoked when the artifact already exists, so this
        // succeeds even with no ffmpeg installed
        let strategy = LocalFileStrategy::new();
        let meta = strategy
            .fetch_audio(input.to_str().unwrap(), &out_dir)
            .await
            .unwrap();

        assert_eq!(meta.file_path, existing);
        assert_eq!(meta.title, "lecture");
        assert_eq!(meta.video_id, "lecture");
        assert_eq!(meta.duration, 0.0);
        assert_eq!(meta.platform, Platform::Local);
        assert_eq!(fs_err::read(&existing).unwrap(), b"fake audio");
    }

    #[tokio::test]
    async fn local_files_have_no_captions() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = LocalFileStrategy::new();
        assert!(strategy.fetch_captions("anything", dir.path()).await.is_none());
    }

    #[tokio::test]
    async fn title_is_the_file_stem() {
        let strategy = LocalFileStrategy::new();
        let title = strategy.fetch_title("some/dir/talk.mkv").await.unwrap();
        assert_eq!(title, "talk");
    }
}
