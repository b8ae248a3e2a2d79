use serde::Deserialize;
use std::fmt;

/// One entry of the `formats` array yt-dlp reports for a video.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FormatEntry {
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl FormatEntry {
    /// yt-dlp marks audio-only streams with `vcodec: "none"`
    pub fn has_video(&self) -> bool {
        self.vcodec
            .as_deref()
            .is_some_and(|codec| !codec.is_empty() && codec != "none")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub formats: Vec<FormatEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Best,
    Height(u32),
}

impl Quality {
    /// yt-dlp `--format` expression: best video at or below the height, plus best audio
    pub fn format_selector(&self) -> String {
        match self {
            Quality::Best => "bestvideo+bestaudio/best".to_string(),
            Quality::Height(height) => format!("bestvideo[height<={height}]+bestaudio/best"),
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Best => write!(f, "best"),
            Quality::Height(height) => write!(f, "{height}p"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadScope {
    Video,
    Playlist,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub format: String,
    pub output_template: String,
    pub scope: DownloadScope,
}
