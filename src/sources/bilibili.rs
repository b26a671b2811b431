use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::{available_caption_languages, select_caption_language, SourceStrategy};
use crate::captions;
use crate::model::{AudioMeta, Platform, TranscriptResult};
use crate::{Result, TranscriptError};

/// Caption preference order; `ai-zh` is Bilibili's machine-generated Chinese track
const CAPTION_LANGUAGES: &[&str] = &["zh-Hans", "zh", "zh-CN", "ai-zh", "en", "en-US"];

/// Non-linguistic tracks that must never be offered to the normalizer.
/// `danmaku` is Bilibili's scrolling chat overlay.
const EXCLUDED_TRACKS: &[&str] = &["danmaku"];

/// Bilibili strategy using yt-dlp for metadata, captions, and audio
pub struct BilibiliStrategy {
    yt_dlp_path: String,
}

/// Extract the video id from a Bilibili URL: a `BV…` id, else an `av<digits>`
/// id, else the last path component with any query stripped.
pub fn extract_video_id(url: &str) -> String {
    if let Some(pos) = url.find("BV") {
        let id: String = url[pos..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect();
        if id.len() > 2 {
            return id;
        }
    }
    if let Some(pos) = url.find("/av") {
        let digits: String = url[pos + 3..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if !digits.is_empty() {
            return format!("av{digits}");
        }
    }
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url)
        .split('?')
        .next()
        .unwrap_or("")
        .to_string()
}

impl BilibiliStrategy {
    pub fn new() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
        }
    }

    /// Get video metadata without downloading any media
    async fn probe(&self, url: &str) -> Result<Value> {
        tracing::debug!("Probing Bilibili metadata for: {}", url);

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
        let Some(lang) = select_caption_language(CAPTION_LANGUAGES, &available, EXCLUDED_TRACKS)
        else {
            tracing::debug!("No usable Bilibili caption tracks for: {}", source);
            return Ok(None);
        };

        let video_id = info["id"]
            .as_str()
            .map(|id| id.to_string())
            .unwrap_or_else(|| extract_video_id(source));
        tracing::info!("Fetching Bilibili captions ({lang}) for video {video_id}");

        let subtitle_file = self
            .download_caption_track(source, &lang, &video_id, output_dir)
            .await?;
        if !subtitle_file.exists() {
            return Ok(None);
        }

        captions::parse_json3_file(&subtitle_file, &lang, "bilibili_subtitle")
    }

    /// Download audio and extract it to mp3 via yt-dlp's ffmpeg postprocessor
    async fn download_audio(&self, url: &str, output_dir: &Path) -> Result<()> {
        let template = output_dir
            .join("%(id)s.%(ext)s")
            .to_string_lossy()
            .into_owned();

        tracing::info!("Downloading Bilibili audio: {}", url);

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
            if error.contains("ffmpeg") || error.contains("ffprobe") {
                return Err(TranscriptError::Transcode(error).into());
            }
            return Err(TranscriptError::Download(error).into());
        }

        Ok(())
    }
}

#[async_trait]
impl SourceStrategy for BilibiliStrategy {
    fn platform(&self) -> Platform {
        Platform::Bilibili
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
            .map(|id| id.to_string())
            .unwrap_or_else(|| extract_video_id(source));
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
            platform: Platform::Bilibili,
            video_id,
        })
    }

    async fn fetch_captions(&self, source: &str, output_dir: &Path) -> Option<TranscriptResult> {
        match self.try_fetch_captions(source, output_dir).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!("Failed to fetch Bilibili captions: {err:#}");
                None
            }
        }
    }

    async fn fetch_title(&self, source: &str) -> Result<String> {
        let info = self.probe(source).await?;
        Ok(info["title"].as_str().unwrap_or("").to_string())
    }
}

impl Default for BilibiliStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bv_ids() {
        assert_eq!(
            extract_video_id("https://www.bilibili.com/video/BV1xx411c7mD"),
            "BV1xx411c7mD"
        );
        assert_eq!(
            extract_video_id("https://www.bilibili.com/video/BV1xx411c7mD?p=2"),
            "BV1xx411c7mD"
        );
    }

    #[test]
    fn extracts_av_ids() {
        assert_eq!(
            extract_video_id("https://www.bilibili.com/video/av170001"),
            "av170001"
        );
    }

    #[test]
    fn falls_back_to_last_path_component() {
        assert_eq!(
            extract_video_id("https://b23.tv/abc123?share=1"),
            "abc123"
        );
        assert_eq!(extract_video_id("https://b23.tv/abc123/"), "abc123");
    }
}
