use super::{
    extractor::Extractor,
    types::{DownloadRequest, DownloadScope, Quality},
    utils::{output_template, sanitize_dir_name},
};
use crate::config::{DownloadSettings, PlaylistStrategy};
use anyhow::{Context, Result};
use std::{
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

/// Runs downloads one item at a time and reports each outcome on the console.
///
/// Extraction failures never leave this type: they are printed and logged, and the
/// `Result`s returned here only carry console write errors.
pub struct Orchestrator {
    extractor: Box<dyn Extractor>,
    settings: DownloadSettings,
}

impl Orchestrator {
    pub fn new(extractor: Box<dyn Extractor>, settings: DownloadSettings) -> Self {
        info!(
            "Orchestrator initialized with {} into {}",
            extractor.name(),
            settings.root.display()
        );
        Self {
            extractor,
            settings,
        }
    }

    pub fn extractor(&self) -> &dyn Extractor {
        self.extractor.as_ref()
    }

    pub fn settings(&self) -> &DownloadSettings {
        &self.settings
    }

    pub fn video_dir(&self, explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.settings.root.clone())
    }

    /// Playlists nest under `<root>/<title>` unless an explicit, non-default path was given.
    pub fn playlist_dir(&self, explicit: Option<&Path>, title: &str) -> PathBuf {
        match explicit {
            Some(path) if path != self.settings.root => path.to_path_buf(),
            _ => self.settings.root.join(sanitize_dir_name(
                title,
                &self.settings.unknown_playlist_title,
            )),
        }
    }

    /// Downloads one video into `dir`. Returns whether the download succeeded.
    pub async fn download_video<W: Write>(
        &self,
        url: &str,
        quality: Quality,
        dir: &Path,
        out: &mut W,
    ) -> Result<bool> {
        writeln!(out, "Downloading video: {url}...")?;

        match self.try_download_video(url, quality, dir).await {
            Ok(()) => {
                writeln!(out, "Download complete!")?;
                Ok(true)
            }
            Err(e) => {
                warn!("Video download failed for {}: {:#}", url, e);
                writeln!(out, "An error occurred while downloading {url}: {e:#}")?;
                Ok(false)
            }
        }
    }

    async fn try_download_video(&self, url: &str, quality: Quality, dir: &Path) -> Result<()> {
        create_dir(dir).await?;
        let request = DownloadRequest {
            url: url.to_string(),
            format: quality.format_selector(),
            output_template: output_template(dir),
            scope: DownloadScope::Video,
        };
        self.extractor.download(&request).await
    }

    pub async fn download_playlist<W: Write>(
        &self,
        url: &str,
        quality: Quality,
        explicit: Option<&Path>,
        out: &mut W,
    ) -> Result<()> {
        let title = self.resolve_playlist_title(url, out).await?;
        let dir = self.playlist_dir(explicit, &title);

        if let Err(e) = create_dir(&dir).await {
            warn!("{:#}", e);
            writeln!(out, "An error occurred while downloading the playlist: {e:#}")?;
            return Ok(());
        }

        writeln!(
            out,
            "Downloading playlist: {title} with quality {quality} to {}...",
            dir.display()
        )?;

        match self.settings.playlist_strategy {
            PlaylistStrategy::Whole => {
                self.download_whole_playlist(url, &title, quality, &dir, out)
                    .await
            }
            PlaylistStrategy::Expand => {
                self.download_playlist_members(url, &title, quality, &dir, out)
                    .await
            }
        }
    }

    async fn resolve_playlist_title<W: Write>(&self, url: &str, out: &mut W) -> Result<String> {
        match self.extractor.playlist_title(url).await {
            Ok(title) => Ok(title),
            Err(e) => {
                warn!("Playlist title lookup failed for {}: {:#}", url, e);
                writeln!(out, "Failed to fetch playlist title: {e:#}")?;
                Ok(self.settings.unknown_playlist_title.clone())
            }
        }
    }

    async fn download_whole_playlist<W: Write>(
        &self,
        url: &str,
        title: &str,
        quality: Quality,
        dir: &Path,
        out: &mut W,
    ) -> Result<()> {
        let request = DownloadRequest {
            url: url.to_string(),
            format: quality.format_selector(),
            output_template: output_template(dir),
            scope: DownloadScope::Playlist,
        };

        match self.extractor.download(&request).await {
            Ok(()) => writeln!(out, "Playlist '{title}' download complete!")?,
            Err(e) => {
                let message = format!("{e:#}");
                warn!("Playlist download failed for {}: {}", url, message);
                if message.contains("Private video") {
                    writeln!(
                        out,
                        "An error occurred: Some videos in the playlist are private or restricted."
                    )?;
                } else {
                    writeln!(out, "An error occurred while downloading the playlist: {message}")?;
                }
            }
        }
        Ok(())
    }

    async fn download_playlist_members<W: Write>(
        &self,
        url: &str,
        title: &str,
        quality: Quality,
        dir: &Path,
        out: &mut W,
    ) -> Result<()> {
        let entries = match self.extractor.playlist_entries(url).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Playlist expansion failed for {}: {:#}", url, e);
                writeln!(out, "An error occurred while downloading the playlist: {e:#}")?;
                return Ok(());
            }
        };

        info!("Playlist {} expanded into {} videos", url, entries.len());

        let mut succeeded = 0;
        for entry in &entries {
            if self.download_video(entry, quality, dir, out).await? {
                succeeded += 1;
            }
        }

        writeln!(
            out,
            "Playlist '{title}' download complete! ({succeeded}/{} videos)",
            entries.len()
        )?;
        Ok(())
    }
}

async fn create_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create directory {}", dir.display()))
}
