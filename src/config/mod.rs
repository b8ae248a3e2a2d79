use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            level: "warn".to_string(),
        }
    }
}

/// How a playlist is handed to the extractor.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistStrategy {
    /// One download call scoped to the whole playlist
    #[default]
    Whole,
    /// Expand into member URLs and download each one as a single video
    Expand,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DownloadSettings {
    pub root: PathBuf,
    pub unknown_playlist_title: String,
    pub playlist_strategy: PlaylistStrategy,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./Videos"),
            unknown_playlist_title: "Unknown Playlist".to_string(),
            playlist_strategy: PlaylistStrategy::Whole,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct QualitySettings {
    /// Container extension a format must have to show up in the video menu
    pub container: String,
    /// Fixed menu offered for playlists
    pub static_choices: Vec<u32>,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            container: "mp4".to_string(),
            static_choices: vec![144, 360, 480, 720, 1080],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct YtDlpSettings {
    pub binary: String,
    pub ffmpeg: String,
    pub restrict_filenames: bool,
    pub metadata_timeout_secs: u64,
}

impl Default for YtDlpSettings {
    fn default() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            ffmpeg: "ffmpeg".to_string(),
            restrict_filenames: false,
            metadata_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub downloads: DownloadSettings,
    pub quality: QualitySettings,
    pub ytdlp: YtDlpSettings,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.downloads.root, PathBuf::from("./Videos"));
        assert_eq!(config.downloads.unknown_playlist_title, "Unknown Playlist");
        assert_eq!(config.downloads.playlist_strategy, PlaylistStrategy::Whole);
        assert_eq!(config.quality.static_choices, vec![144, 360, 480, 720, 1080]);
        assert_eq!(config.quality.container, "mp4");
        assert_eq!(config.logging.format, LogFormat::Text);
        assert_eq!(config.ytdlp.binary, "yt-dlp");
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.downloads.root, PathBuf::from("./Videos"));
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::from_toml(
            r#"
            [logging]
            format = "json"

            [downloads]
            root = "/srv/media"
            playlist_strategy = "expand"

            [quality]
            static_choices = [480, 2160]
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.downloads.root, PathBuf::from("/srv/media"));
        assert_eq!(config.downloads.playlist_strategy, PlaylistStrategy::Expand);
        assert_eq!(config.downloads.unknown_playlist_title, "Unknown Playlist");
        assert_eq!(config.quality.static_choices, vec![480, 2160]);
        assert_eq!(config.quality.container, "mp4");
    }

    #[test]
    fn test_invalid_strategy_is_rejected() {
        let result = Config::from_toml("[downloads]\nplaylist_strategy = \"parallel\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[ytdlp]\nbinary = \"/opt/yt-dlp\"\nrestrict_filenames = true\n")
            .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.ytdlp.binary, "/opt/yt-dlp");
        assert!(config.ytdlp.restrict_filenames);
        assert_eq!(config.ytdlp.metadata_timeout_secs, 60);
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_file(dir.path().join("nope.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read config file"));
    }
}
