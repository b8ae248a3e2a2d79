use super::{
    extractor::Extractor,
    types::{DownloadRequest, FormatEntry},
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

#[derive(Default)]
struct Script {
    formats: HashMap<String, Vec<FormatEntry>>,
    download_failures: HashMap<String, String>,
    titles: HashMap<String, String>,
    entries: HashMap<String, Vec<String>>,
    downloads: Vec<DownloadRequest>,
}

/// In-memory extractor driven by canned answers. Clones share the same script,
/// so a test can hand one clone to the orchestrator and inspect another.
#[derive(Default, Clone)]
pub struct ScriptedExtractor {
    script: Arc<Mutex<Script>>,
}

impl ScriptedExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_formats(self, url: &str, formats: Vec<FormatEntry>) -> Self {
        self.script
            .lock()
            .unwrap()
            .formats
            .insert(url.to_string(), formats);
        self
    }

    pub fn with_video_heights(self, url: &str, heights: &[u32]) -> Self {
        let formats = heights
            .iter()
            .map(|&height| FormatEntry {
                ext: Some("mp4".to_string()),
                vcodec: Some("avc1".to_string()),
                height: Some(height),
            })
            .collect();
        self.with_formats(url, formats)
    }

    pub fn with_download_failure(self, url: &str, message: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .download_failures
            .insert(url.to_string(), message.to_string());
        self
    }

    pub fn with_playlist(self, url: &str, title: Option<&str>, entries: &[&str]) -> Self {
        {
            let mut script = self.script.lock().unwrap();
            if let Some(title) = title {
                script.titles.insert(url.to_string(), title.to_string());
            }
            script.entries.insert(
                url.to_string(),
                entries.iter().map(|entry| entry.to_string()).collect(),
            );
        }
        self
    }

    /// Every download request received so far, successful or not
    pub fn downloads(&self) -> Vec<DownloadRequest> {
        self.script.lock().unwrap().downloads.clone()
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn list_formats(&self, url: &str) -> Result<Vec<FormatEntry>> {
        self.script
            .lock()
            .unwrap()
            .formats
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("ERROR: [generic] {url}: Unsupported URL"))
    }

    async fn download(&self, request: &DownloadRequest) -> Result<()> {
        let mut script = self.script.lock().unwrap();
        script.downloads.push(request.clone());
        match script.download_failures.get(&request.url) {
            Some(message) => Err(anyhow!("{message}")),
            None => Ok(()),
        }
    }

    async fn playlist_title(&self, url: &str) -> Result<String> {
        self.script
            .lock()
            .unwrap()
            .titles
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("no playlist title for {url}"))
    }

    async fn playlist_entries(&self, url: &str) -> Result<Vec<String>> {
        self.script
            .lock()
            .unwrap()
            .entries
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("no playlist entries for {url}"))
    }

    async fn test_availability(&self) -> bool {
        true
    }
}
