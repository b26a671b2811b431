use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::model::{Platform, Segment};
use crate::transcribe::PipelineOutput;
use crate::utils::sanitize_filename;
use crate::Result;

/// The durable transcript document, one per run
#[derive(Debug, Serialize)]
pub struct TranscriptDocument {
    pub title: String,
    pub platform: Platform,
    pub source: String,
    pub language: Option<String>,
    pub full_text: String,
    pub segments: Vec<Segment>,
    pub generated_at: DateTime<Utc>,
}

impl TranscriptDocument {
    pub fn new(output: PipelineOutput, source: &str) -> Self {
        Self {
            title: output.title,
            platform: output.platform,
            source: source.to_string(),
            language: output.transcript.language,
            full_text: output.transcript.full_text,
            segments: output.transcript.segments,
            generated_at: Utc::now(),
        }
    }
}

/// Write the document to `<output_dir>/<safe-title>_transcript.json` and
/// return the path.
pub fn save_document(document: &TranscriptDocument, output_dir: &Path) -> Result<PathBuf> {
    fs_err::create_dir_all(output_dir)?;

    let mut safe_title = sanitize_filename(&document.title);
    if safe_title.is_empty() {
        safe_title = "untitled".to_string();
    }
    let path = output_dir.join(format!("{safe_title}_transcript.json"));

    let content = serde_json::to_string_pretty(document)?;
    fs_err::write(&path, content)?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TranscriptResult;

    fn pipeline_output(title: &str) -> PipelineOutput {
        PipelineOutput {
            transcript: TranscriptResult::from_segments(
                Some("en".to_string()),
                vec![Segment::new(0.0, 1.5, "hello world").unwrap()],
                None,
            )
            .unwrap(),
            title: title.to_string(),
            platform: Platform::Youtube,
        }
    }

    #[test]
    fn writes_document_with_expected_fields() {
        let dir = tempfile::tempdir().unwrap();
        let document = TranscriptDocument::new(
            pipeline_output("My Talk"),
            "https://www.youtube.com/watch?v=abc",
        );

        let path = save_document(&document, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "My Talk_transcript.json");

        let written: serde_json::Value =
            serde_json::from_str(&fs_err::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["title"], "My Talk");
        assert_eq!(written["platform"], "youtube");
        assert_eq!(written["source"], "https://www.youtube.com/watch?v=abc");
        assert_eq!(written["language"], "en");
        assert_eq!(written["full_text"], "hello world");
        assert_eq!(written["segments"][0]["start"], 0.0);
        assert_eq!(written["segments"][0]["end"], 1.5);
        assert_eq!(written["segments"][0]["text"], "hello world");
    }

    #[test]
    fn empty_title_becomes_untitled() {
        let dir = tempfile::tempdir().unwrap();
        let document = TranscriptDocument::new(pipeline_output(""), "source");

        let path = save_document(&document, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "untitled_transcript.json");
    }

    #[test]
    fn unsafe_titles_are_sanitized_for_the_filename() {
        let dir = tempfile::tempdir().unwrap();
        let document = TranscriptDocument::new(pipeline_output("a/b:c?d"), "source");

        let path = save_document(&document, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "a_b_c_d_transcript.json");
    }
}
