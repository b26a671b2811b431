use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Whisper model sizes the CLI accepts
const MODEL_SIZES: &[&str] = &["tiny", "base", "small", "medium", "large-v2", "large-v3"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Speech-to-text settings
    pub whisper: WhisperConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperConfig {
    /// Model size (tiny, base, small, medium, large-v2, large-v3)
    pub model_size: String,

    /// Device preference: auto, cpu, or cuda
    pub device: String,

    /// Name or path of the faster-whisper CLI binary
    pub binary: String,

    /// Optional model download root
    pub model_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory for audio artifacts and transcript documents
    pub output_dir: Option<PathBuf>,

    /// Keep audio files after transcription
    pub keep_audio: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            whisper: WhisperConfig {
                model_size: "base".to_string(),
                device: "auto".to_string(),
                binary: "whisper-ctranslate2".to_string(),
                model_dir: None,
            },
            app: AppConfig {
                output_dir: None,
                keep_audio: false,
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content =
                fs_err::read_to_string(&config_path).context("Failed to read config file")?;

            let config: Config =
                serde_yaml::from_str(&content).context("Failed to parse config file")?;

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("vidscript").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if !MODEL_SIZES.contains(&self.whisper.model_size.as_str()) {
            anyhow::bail!(
                "Unknown whisper model size '{}' (expected one of: {})",
                self.whisper.model_size,
                MODEL_SIZES.join(", ")
            );
        }

        if !matches!(self.whisper.device.as_str(), "auto" | "cpu" | "cuda") {
            anyhow::bail!(
                "Unknown device '{}' (expected auto, cpu, or cuda)",
                self.whisper.device
            );
        }

        Ok(())
    }

    /// Resolve the working directory for one run: CLI flag, then config,
    /// then a per-user data directory.
    pub fn resolve_output_dir(&self, cli_override: Option<PathBuf>) -> PathBuf {
        cli_override
            .or_else(|| self.app.output_dir.clone())
            .unwrap_or_else(|| {
                dirs::data_dir()
                    .map(|dir| dir.join("vidscript").join("output"))
                    .unwrap_or_else(|| PathBuf::from("output"))
            })
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Whisper Model: {}", self.whisper.model_size);
        println!("  Device: {}", self.whisper.device);
        println!("  Whisper Binary: {}", self.whisper.binary);
        if let Some(dir) = &self.whisper.model_dir {
            println!("  Model Directory: {}", dir.display());
        }
        if let Some(dir) = &self.app.output_dir {
            println!("  Output Directory: {}", dir.display());
        }
        println!("  Keep Audio: {}", self.app.keep_audio);
    }

    /// Interactive configuration setup
    pub async fn interactive_setup(&self) -> Result<()> {
        println!("Interactive configuration setup coming soon!");
        println!("For now, please edit the config file manually:");
        println!("  {}", Self::config_path()?.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.whisper.model_size, "base");
        assert_eq!(config.whisper.device, "auto");
        assert!(!config.app.keep_audio);
    }

    #[test]
    fn rejects_unknown_model_size_and_device() {
        let mut config = Config::default();
        config.whisper.model_size = "enormous".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.whisper.device = "tpu".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn cli_override_wins_for_output_dir() {
        let mut config = Config::default();
        config.app.output_dir = Some(PathBuf::from("/configured"));

        let resolved = config.resolve_output_dir(Some(PathBuf::from("/flag")));
        assert_eq!(resolved, PathBuf::from("/flag"));

        let resolved = config.resolve_output_dir(None);
        assert_eq!(resolved, PathBuf::from("/configured"));
    }

    #[test]
    fn config_round_trips_through_yaml() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.whisper.binary, config.whisper.binary);
        assert_eq!(parsed.app.keep_audio, config.app.keep_audio);
    }
}
