use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// One timed span of text within a transcript.
///
/// Invariants: `0 <= start <= end`, `text` is non-empty and trimmed. Use
/// [`Segment::new`] to build one; it trims the text and rejects empty spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start time in seconds
    pub start: f64,

    /// End time in seconds
    pub end: f64,

    /// Segment text, trimmed of surrounding whitespace
    pub text: String,
}

impl Segment {
    /// Build a segment, trimming the text. Returns `None` when the trimmed
    /// text is empty or the time span is invalid.
    pub fn new(start: f64, end: f64, text: &str) -> Option<Segment> {
        let text = text.trim();
        if text.is_empty() || start < 0.0 || end < start {
            return None;
        }
        Some(Segment {
            start,
            end,
            text: text.to_string(),
        })
    }
}

/// Structured transcript produced by either caption normalization or
/// machine transcription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptResult {
    /// Language tag (ISO-ish code or platform-specific tag), if known
    pub language: Option<String>,

    /// Space-joined concatenation of segment texts, in order
    pub full_text: String,

    /// Segments ordered by non-decreasing start time
    pub segments: Vec<Segment>,

    /// Opaque diagnostic payload identifying where the transcript came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
}

impl TranscriptResult {
    /// Build a transcript from segments. An empty segment list is never a
    /// valid terminal result, so this returns `None` for one; callers treat
    /// that as the signal to fall back to machine transcription.
    pub fn from_segments(
        language: Option<String>,
        segments: Vec<Segment>,
        raw: Option<serde_json::Value>,
    ) -> Option<TranscriptResult> {
        if segments.is_empty() {
            return None;
        }
        let full_text = segments
            .iter()
            .map(|seg| seg.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Some(TranscriptResult {
            language,
            full_text,
            segments,
            raw,
        })
    }
}

/// Metadata for a downloaded or transcoded audio artifact.
///
/// Created by a source strategy; the file it points at is owned by the
/// pipeline for the duration of one run and deleted afterwards unless the
/// caller asked to keep it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioMeta {
    /// Path to the audio file on disk
    pub file_path: PathBuf,

    /// Title of the source video (file stem for local files)
    pub title: String,

    /// Duration in seconds, 0 when unknown
    pub duration: f64,

    /// Platform the audio came from
    pub platform: Platform,

    /// Platform-specific video identifier
    pub video_id: String,
}

/// Supported source platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Local,
    Bilibili,
    Youtube,
}

impl Platform {
    /// Classify a source string into a platform tag. Never fails: anything
    /// that is neither an existing local path nor a known host falls back to
    /// `Local`, and the local strategy reports the missing path later.
    pub fn classify(source: &str) -> Platform {
        if Path::new(source).exists() {
            return Platform::Local;
        }
        let host = Url::parse(source)
            .ok()
            .and_then(|url| url.host_str().map(|h| h.to_lowercase()))
            .unwrap_or_else(|| source.to_lowercase());
        if host.contains("bilibili.com") || host.contains("b23.tv") {
            return Platform::Bilibili;
        }
        if host.contains("youtube.com") || host.contains("youtu.be") {
            return Platform::Youtube;
        }
        Platform::Local
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Local => "local",
            Platform::Bilibili => "bilibili",
            Platform::Youtube => "youtube",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
