use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::{available_caption_languages, select_caption_language, SourceStrategy};
use crate::captions;
use crate::model::{AudioMeta, Platform, TranscriptResult};
use crate::{Result, TranscriptError};

/// Caption preference order; Chinese and English variants ahead of the rest
const CAPTION_LANGUAGES: &[&str] = &["zh-Hans", "zh", "zh-CN", "zh-TW", "en", "en-US"];

/// YouTube strategy using yt-dlp for metadata, captions, and audio
pub struct YoutubeStrategy {
    yt_dlp_path: String,
}

impl YoutubeStrategy {
    pub fn new() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
        }
    }

    /// Get video metadata without downloading any media
    async fn probe(&self, url: &str) -> Result<Value> {
        tracing::debug!("Probing YouTube metadata for: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args(["--dump-json", "--no-playlist", "--skip-download", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| TranscriptError::Download(format!("failed to run yt-dlp: {e}")))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(TranscriptError::Download(format!("yt-dlp failed: {error}")).into());
        }

        let info: Value = serde_json::from_slice(&output.stdout)?;
        Ok(info)
    }

    /// Download exactly one caption track as a json3 file
    async fn download_caption_track(
        &self,
        url: &str,
        lang: &str,
        video_id: &str,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        let template = output_dir
            .join(format!("{video_id}.%(ext)s"))
            .to_string_lossy()
            .into_owned();

        let output = Command::new(&self.yt_dlp_path)
            .args([
                "--write-subs",
                "--write-auto-subs",
                "--sub-langs",
                lang,
                "--sub-format",
                "json3",
                "--skip-download",
                "--no-playlist",
                "--output",
                template.as_str(),
                url,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| TranscriptError::Download(format!("failed to run yt-dlp: {e}")))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(TranscriptError::Download(format!("yt-dlp failed: {error}")).into());
        }

        Ok(output_dir.join(format!("{video_id}.{lang}.json3")))
    }

    async fn try_fetch_captions(
        &self,
        source: &str,
        output_dir: &Path,
    ) -> Result<Option<TranscriptResult>> {
        fs_err::create_dir_all(output_dir)?;

        let info = self.probe(source).await?;
        let available = available_caption_languages(&info);
        let Some(lang) = select_caption_language(CAPTION_LANGUAGES, &available, &[]) else {
            tracing::debug!("No usable YouTube caption tracks for: {}", source);
            return Ok(None);
        };

        let video_id = info["id"].as_str().unwrap_or("unknown").to_string();
        tracing::info!("Fetching YouTube captions ({lang}) for video {video_id}");

        let subtitle_file = self
            .download_caption_track(source, &lang, &video_id, output_dir)
            .await?;
        if !subtitle_file.exists() {
            return Ok(None);
        }

        captions::parse_json3_file(&subtitle_file, &lang, "youtube_subtitle")
    }

    /// Download audio and extract it to mp3 via yt-dlp's ffmpeg postprocessor
    async fn download_audio(&self, url: &str, output_dir: &Path) -> Result<()> {
        let template = output_dir
            .join("%(id)s.%(ext)s")
            .to_string_lossy()
            .into_owned();

        tracing::info!("Downloading YouTube audio: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args([
                "--format",
                "bestaudio[ext=m4a]/bestaudio/best",
                "--extract-audio",
                "--audio-format",
                "mp3",
                "--audio-quality",
                "64K",
                "--no-playlist",
                "--output",
                template.as_str(),
                url,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| TranscriptError::Download(format!("failed to run yt-dlp: {e}")))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr).to_string();
            // Audio extraction runs through ffmpeg; report those failures
            // as transcode errors rather than download errors
            if error.contains("ffmpeg") || error.contains("ffprobe") {
                return Err(TranscriptError::Transcode(error).into());
            }
            return Err(TranscriptError::Download(error).into());
        }

        Ok(())
    }
}

#[async_trait]
impl SourceStrategy for YoutubeStrategy {
    fn platform(&self) -> Platform {
        Platform::Youtube
    }

    fn caption_languages(&self) -> &'static [&'static str] {
        CAPTION_LANGUAGES
    }

    async fn fetch_audio(&self, source: &str, output_dir: &Path) -> Result<AudioMeta> {
        fs_err::create_dir_all(output_dir)?;

        let info = self.probe(source).await?;
        let video_id = info["id"]
            .as_str()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                TranscriptError::Download(format!("yt-dlp returned no video id for: {source}"))
            })?
            .to_string();
        let title = info["title"].as_str().unwrap_or("").to_string();
        let duration = info["duration"].as_f64().unwrap_or(0.0);

        let audio_path = output_dir.join(format!("{video_id}.mp3"));
        if audio_path.exists() {
            tracing::debug!("Reusing existing audio: {}", audio_path.display());
        } else {
            self.download_audio(source, output_dir).await?;
            if !audio_path.exists() {
                return Err(TranscriptError::Transcode(format!(
                    "audio file missing after extraction: {}",
                    audio_path.display()
                ))
                .into());
            }
        }

        Ok(AudioMeta {
            file_path: audio_path,
            title,
            duration,
            platform: Platform::Youtube,
            video_id,
        })
    }

    async fn fetch_captions(&self, source: &str, output_dir: &Path) -> Option<TranscriptResult> {
        match self.try_fetch_captions(source, output_dir).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!("Failed to fetch YouTube captions: {err:#}");
                None
            }
        }
    }

    async fn fetch_title(&self, source: &str) -> Result<String> {
        let info = self.probe(source).await?;
        Ok(info["title"].as_str().unwrap_or("").to_string())
    }
}

impl Default for YoutubeStrategy {
    fn default() -> Self {
        Self::new()
    }
}
