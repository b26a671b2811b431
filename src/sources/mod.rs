use async_trait::async_trait;
use std::path::Path;

pub mod bilibili;
pub mod local;
pub mod youtube;

use crate::model::{AudioMeta, Platform, TranscriptResult};
use crate::{Result, TranscriptError};

/// Platform-specific retrieval of audio and pre-existing caption tracks.
///
/// One implementation per platform; the pipeline picks one via
/// [`StrategyRegistry::strategy_for`] using the classifier's tag.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceStrategy: Send + Sync {
    /// Platform this strategy serves
    fn platform(&self) -> Platform;

    /// Caption language preference order, most preferred first
    fn caption_languages(&self) -> &'static [&'static str];

    /// Download or transcode the source's audio into `output_dir`.
    ///
    /// Idempotent per `(source, output_dir)`: an existing artifact at the
    /// expected path is reused rather than re-fetched. Fails with
    /// `TranscriptError::Download`, `Transcode`, or `NotFound`.
    async fn fetch_audio(&self, source: &str, output_dir: &Path) -> Result<AudioMeta>;

    /// Try to retrieve a pre-existing caption track in one of the preferred
    /// languages. Caption absence and retrieval failures both yield `None`;
    /// this operation never surfaces an error.
    async fn fetch_captions(&self, source: &str, output_dir: &Path) -> Option<TranscriptResult>;

    /// Cheap metadata-only title lookup, used when captions were found and
    /// no audio download is needed.
    async fn fetch_title(&self, source: &str) -> Result<String>;
}

#[cfg(test)]
impl std::fmt::Debug for dyn SourceStrategy + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SourceStrategy({:?})", self.platform())
    }
}

/// Registry mapping platform tags to their strategies
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn SourceStrategy>>,
}

impl StrategyRegistry {
    /// Create a registry with all built-in strategies
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(youtube::YoutubeStrategy::new()));
        registry.register(Box::new(bilibili::BilibiliStrategy::new()));
        registry.register(Box::new(local::LocalFileStrategy::new()));
        registry
    }

    /// Create an empty registry
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Register a strategy
    pub fn register(&mut self, strategy: Box<dyn SourceStrategy>) {
        self.strategies.push(strategy);
    }

    /// Find the strategy for a platform tag
    pub fn strategy_for(&self, platform: Platform) -> Result<&dyn SourceStrategy> {
        self.strategies
            .iter()
            .find(|strategy| strategy.platform() == platform)
            .map(|boxed| boxed.as_ref())
            .ok_or_else(|| TranscriptError::UnsupportedPlatform(platform.to_string()).into())
    }

    /// List all registered platforms
    pub fn list_platforms(&self) -> Vec<Platform> {
        self.strategies
            .iter()
            .map(|strategy| strategy.platform())
            .collect()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick a caption language: first preference-order match among the available
/// tracks, else the first available track that is not a known non-linguistic
/// one (e.g. Bilibili's `danmaku` chat overlay). Deterministic for a given
/// input; the tie-break never varies by run.
pub fn select_caption_language(
    preferred: &[&str],
    available: &[String],
    excluded: &[&str],
) -> Option<String> {
    for lang in preferred {
        if available.iter().any(|a| a == lang) {
            return Some((*lang).to_string());
        }
    }
    available
        .iter()
        .find(|a| !excluded.contains(&a.as_str()))
        .cloned()
}

/// Collect the caption language tags a yt-dlp metadata dump reports, manual
/// subtitles first, then automatic captions.
pub(crate) fn available_caption_languages(info: &serde_json::Value) -> Vec<String> {
    let mut languages = Vec::new();
    for key in ["subtitles", "automatic_captions"] {
        if let Some(map) = info[key].as_object() {
            for lang in map.keys() {
                if !languages.contains(lang) {
                    languages.push(lang.clone());
                }
            }
        }
    }
    languages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn langs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn selects_first_preference_order_match() {
        let available = langs(&["ko", "en", "zh-Hans"]);
        let selected = select_caption_language(&["zh-Hans", "en"], &available, &[]);
        assert_eq!(selected.as_deref(), Some("zh-Hans"));

        let available = langs(&["ja", "en"]);
        let selected = select_caption_language(&["zh-Hans", "en"], &available, &[]);
        assert_eq!(selected.as_deref(), Some("en"));
    }

    #[test]
    fn falls_through_to_first_non_excluded_track() {
        let available = langs(&["danmaku", "ko", "ja"]);
        let selected = select_caption_language(&["zh-Hans", "en"], &available, &["danmaku"]);
        assert_eq!(selected.as_deref(), Some("ko"));
    }

    #[test]
    fn returns_none_when_only_excluded_tracks_exist() {
        let available = langs(&["danmaku"]);
        assert!(select_caption_language(&["zh", "en"], &available, &["danmaku"]).is_none());
        assert!(select_caption_language(&["zh", "en"], &[], &[]).is_none());
    }

    #[test]
    fn collects_manual_then_automatic_caption_languages() {
        let info = serde_json::json!({
            "subtitles": {"en": [], "zh-Hans": []},
            "automatic_captions": {"en": [], "ja": []},
        });
        let languages = available_caption_languages(&info);
        assert!(languages.contains(&"zh-Hans".to_string()));
        assert!(languages.contains(&"ja".to_string()));
        assert_eq!(languages.iter().filter(|l| *l == "en").count(), 1);

        assert!(available_caption_languages(&serde_json::json!({})).is_empty());
    }

    #[test]
    fn registry_resolves_builtin_strategies() {
        let registry = StrategyRegistry::new();
        assert_eq!(
            registry.strategy_for(Platform::Youtube).unwrap().platform(),
            Platform::Youtube
        );
        assert_eq!(
            registry.strategy_for(Platform::Local).unwrap().platform(),
            Platform::Local
        );
        assert_eq!(registry.list_platforms().len(), 3);
    }

    #[test]
    fn registry_miss_is_unsupported_platform() {
        let registry = StrategyRegistry::empty();
        let err = registry.strategy_for(Platform::Bilibili).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::TranscriptError>(),
            Some(crate::TranscriptError::UnsupportedPlatform(_))
        ));
    }
}
