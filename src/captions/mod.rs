//! Caption-track normalization.
//!
//! Platforms expose pre-existing caption tracks in yt-dlp's json3 format: a
//! list of timed events, each carrying a start offset, a duration, and one or
//! more text fragments. This module converts that format into the same
//! [`TranscriptResult`] shape that machine transcription produces.

use serde::Deserialize;
use std::path::Path;

use crate::model::{Segment, TranscriptResult};
use crate::Result;

/// A json3 caption track as written to disk by yt-dlp
#[derive(Debug, Default, Deserialize)]
pub struct CaptionTrack {
    #[serde(default)]
    pub events: Vec<CaptionEvent>,
}

/// One timed caption event
#[derive(Debug, Default, Deserialize)]
pub struct CaptionEvent {
    /// Start offset in milliseconds
    #[serde(rename = "tStartMs", default)]
    pub start_ms: u64,

    /// Duration in milliseconds
    #[serde(rename = "dDurationMs", default)]
    pub duration_ms: u64,

    /// Text fragments; an event's text is their concatenation
    #[serde(rename = "segs", default)]
    pub fragments: Vec<CaptionFragment>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CaptionFragment {
    #[serde(rename = "utf8", default)]
    pub text: String,
}

/// Normalize a caption track into a transcript.
///
/// Events whose concatenated, trimmed text is empty are dropped. Returns
/// `None` when nothing remains; the caller treats that as "no captions" and
/// falls back to transcription. `source_label` and `file` end up in the
/// result's diagnostic `raw` payload.
pub fn normalize(
    track: &CaptionTrack,
    language: &str,
    source_label: &str,
    file: &Path,
) -> Option<TranscriptResult> {
    let mut segments = Vec::new();
    for event in &track.events {
        let text: String = event
            .fragments
            .iter()
            .map(|frag| frag.text.as_str())
            .collect();
        let start = event.start_ms as f64 / 1000.0;
        let end = (event.start_ms + event.duration_ms) as f64 / 1000.0;
        if let Some(segment) = Segment::new(start, end, &text) {
            segments.push(segment);
        }
    }
    let raw = serde_json::json!({
        "source": source_label,
        "file": file.display().to_string(),
    });
    TranscriptResult::from_segments(Some(language.to_string()), segments, Some(raw))
}

/// Read a json3 subtitle file and normalize it in one step.
///
/// I/O and parse errors are real errors; an event list that normalizes to
/// nothing is `Ok(None)`.
pub fn parse_json3_file(
    path: &Path,
    language: &str,
    source_label: &str,
) -> Result<Option<TranscriptResult>> {
    let content = fs_err::read_to_string(path)?;
    let track: CaptionTrack = serde_json::from_str(&content)?;
    Ok(normalize(&track, language, source_label, path))
}
