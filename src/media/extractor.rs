use super::types::{DownloadRequest, FormatEntry};
use anyhow::Result;
use async_trait::async_trait;

/// The extraction backend: everything that talks to the video site goes through here.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Human-readable name of the extractor
    fn name(&self) -> &'static str;

    /// Stream formats available for a single video
    async fn list_formats(&self, url: &str) -> Result<Vec<FormatEntry>>;

    /// Download a video or a whole playlist into the request's output template
    async fn download(&self, request: &DownloadRequest) -> Result<()>;

    /// Display title of a playlist
    async fn playlist_title(&self, url: &str) -> Result<String>;

    /// Member video URLs of a playlist, in playlist order
    async fn playlist_entries(&self, url: &str) -> Result<Vec<String>>;

    /// Test if the backing tools are available on the system
    async fn test_availability(&self) -> bool;
}
