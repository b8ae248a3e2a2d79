use super::{
    extractor::Extractor,
    types::{FormatEntry, Quality},
};
use crate::config::QualitySettings;
use anyhow::Result;
use std::collections::BTreeSet;
use tracing::debug;

/// Sorted, duplicate-free heights of the formats that carry video in `container`.
pub fn available_heights(formats: &[FormatEntry], container: &str) -> Vec<u32> {
    formats
        .iter()
        .filter(|fmt| fmt.has_video() && fmt.ext.as_deref() == Some(container))
        .filter_map(|fmt| fmt.height)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Maps a 1-indexed menu answer onto `options`, or `fallback` for anything else.
pub fn pick(options: &[u32], choice: &str, fallback: Quality) -> Quality {
    choice
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=options.len()).contains(n))
        .map(|n| Quality::Height(options[n - 1]))
        .unwrap_or(fallback)
}

pub struct QualityResolver<'a> {
    extractor: &'a dyn Extractor,
    settings: &'a QualitySettings,
}

impl<'a> QualityResolver<'a> {
    pub fn new(extractor: &'a dyn Extractor, settings: &'a QualitySettings) -> Self {
        Self {
            extractor,
            settings,
        }
    }

    /// Menu entries for a single video, queried from the extractor.
    pub async fn video_options(&self, url: &str) -> Result<Vec<u32>> {
        let formats = self.extractor.list_formats(url).await?;
        let heights = available_heights(&formats, &self.settings.container);
        debug!(
            "{} of {} formats usable for {}: {:?}",
            heights.len(),
            formats.len(),
            url,
            heights
        );
        Ok(heights)
    }

    /// Invalid answers on the video menu fall back to the best available stream.
    pub fn pick_video(&self, options: &[u32], choice: &str) -> Quality {
        pick(options, choice, Quality::Best)
    }

    /// Playlists are offered the fixed menu rather than a per-video query.
    pub fn playlist_options(&self) -> Vec<u32> {
        let mut choices = self.settings.static_choices.clone();
        choices.sort_unstable();
        choices.dedup();
        choices
    }

    /// Invalid answers on the playlist menu fall back to its highest entry.
    pub fn pick_playlist(&self, choice: &str) -> Quality {
        let options = self.playlist_options();
        let fallback = options
            .last()
            .map(|&height| Quality::Height(height))
            .unwrap_or(Quality::Best);
        pick(&options, choice, fallback)
    }
}
