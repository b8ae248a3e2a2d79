use super::{
    extractor::Extractor,
    types::{DownloadRequest, DownloadScope, FormatEntry, VideoInfo},
};
use crate::config::YtDlpSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::{io::Write, process::Stdio, time::Duration};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::Command,
};
use tracing::{debug, info, warn};

pub struct YtDlpExtractor {
    settings: YtDlpSettings,
}

impl YtDlpExtractor {
    pub fn new(settings: YtDlpSettings) -> Self {
        Self { settings }
    }

    fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.metadata_timeout_secs)
    }

    /// Runs a metadata query and returns its stdout, failing on a non-zero exit.
    async fn query(&self, args: &[&str], what: &str) -> Result<String> {
        debug!("Running {} {:?}", self.settings.binary, args);

        let output = tokio::time::timeout(
            self.metadata_timeout(),
            Command::new(&self.settings.binary)
                .args(args)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .with_context(|| format!("{what} timed out"))?
        .with_context(|| format!("Failed to run {} for {what}", self.settings.binary))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow::anyhow!("{what} failed: {}", error.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn download_args(&self, request: &DownloadRequest) -> Vec<String> {
        let mut args = vec![
            "--format".to_string(),
            request.format.clone(),
            "--output".to_string(),
            request.output_template.clone(),
            "--no-warnings".to_string(),
        ];

        args.push(
            match request.scope {
                DownloadScope::Video => "--no-playlist",
                DownloadScope::Playlist => "--yes-playlist",
            }
            .to_string(),
        );

        if self.settings.restrict_filenames {
            args.push("--restrict-filenames".to_string());
        }

        args.push(request.url.clone());
        args
    }

    async fn tool_version(binary: &str, flag: &str) -> Option<String> {
        match Command::new(binary).arg(flag).output().await {
            Ok(output) if output.status.success() => Some(
                String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .next()
                    .unwrap_or("unknown")
                    .trim()
                    .to_string(),
            ),
            Ok(_) => {
                warn!("❌ {} command failed", binary);
                None
            }
            Err(e) => {
                warn!("❌ {} not found: {}", binary, e);
                None
            }
        }
    }
}

/// Copies each line of `reader` to `sink` as it arrives and returns them all.
async fn relay_lines<R, W>(reader: R, sink: &mut W) -> Result<Vec<String>>
where
    R: AsyncRead + Unpin,
    W: Write,
{
    let mut lines = BufReader::new(reader).lines();
    let mut captured = Vec::new();
    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read yt-dlp stderr")?
    {
        writeln!(sink, "{line}").context("Failed to relay yt-dlp output")?;
        captured.push(line);
    }
    Ok(captured)
}

fn parse_formats(json_str: &str) -> Result<Vec<FormatEntry>> {
    let info: VideoInfo =
        serde_json::from_str(json_str.trim()).context("Failed to parse media metadata")?;
    Ok(info.formats)
}

/// yt-dlp prints `NA` for fields it could not resolve
fn parse_playlist_title(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .filter(|line| *line != "NA")
        .map(str::to_string)
}

fn parse_entries(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != "NA")
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn list_formats(&self, url: &str) -> Result<Vec<FormatEntry>> {
        debug!("Extracting formats with yt-dlp for: {}", url);
        let json_str = self
            .query(
                &["--dump-json", "--no-download", "--no-warnings", "--no-playlist", url],
                "Media metadata extraction",
            )
            .await?;
        parse_formats(&json_str)
    }

    async fn download(&self, request: &DownloadRequest) -> Result<()> {
        info!("Downloading {:?} with yt-dlp: {}", request.scope, request.url);

        // stdout stays on the terminal for yt-dlp's own progress lines
        let mut child = Command::new(&self.settings.binary)
            .args(self.download_args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to run {}", self.settings.binary))?;

        let stderr = child
            .stderr
            .take()
            .context("Failed to get yt-dlp stderr")?;
        let captured = relay_lines(stderr, &mut std::io::stderr()).await?;

        let status = child.wait().await.context("Failed to wait for yt-dlp")?;
        if !status.success() {
            return Err(anyhow::anyhow!(
                "Media download failed: {}",
                captured.join("\n").trim()
            ));
        }

        Ok(())
    }

    async fn playlist_title(&self, url: &str) -> Result<String> {
        let stdout = self
            .query(
                &[
                    url,
                    "-I",
                    "1:1",
                    "--skip-download",
                    "--no-warnings",
                    "--print",
                    "playlist_title",
                ],
                "Playlist title lookup",
            )
            .await?;

        parse_playlist_title(&stdout)
            .ok_or_else(|| anyhow::anyhow!("yt-dlp reported no playlist title for {url}"))
    }

    async fn playlist_entries(&self, url: &str) -> Result<Vec<String>> {
        let stdout = self
            .query(
                &["--flat-playlist", "--no-warnings", "--print", "url", url],
                "Playlist expansion",
            )
            .await?;

        let entries = parse_entries(&stdout);
        if entries.is_empty() {
            return Err(anyhow::anyhow!("No videos found in playlist {url}"));
        }
        Ok(entries)
    }

    async fn test_availability(&self) -> bool {
        let yt_dlp_available = match Self::tool_version(&self.settings.binary, "--version").await
        {
            Some(version) => {
                info!("✅ yt-dlp is available, version: {}", version);
                true
            }
            None => false,
        };

        // ffmpeg merges the separate video and audio streams
        match Self::tool_version(&self.settings.ffmpeg, "-version").await {
            Some(version_line) => info!("✅ ffmpeg is available: {}", version_line),
            None if yt_dlp_available => {
                warn!("⚠️  yt-dlp will work but merging video and audio streams will fail")
            }
            None => {}
        }

        yt_dlp_available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(scope: DownloadScope) -> DownloadRequest {
        DownloadRequest {
            url: "https://example.com/watch?v=abc".to_string(),
            format: "bestvideo[height<=720]+bestaudio/best".to_string(),
            output_template: "./Videos/%(title)s.%(ext)s".to_string(),
            scope,
        }
    }

    #[test]
    fn test_download_args_video() {
        let extractor = YtDlpExtractor::new(YtDlpSettings::default());
        assert_eq!(
            extractor.download_args(&request(DownloadScope::Video)),
            vec![
                "--format",
                "bestvideo[height<=720]+bestaudio/best",
                "--output",
                "./Videos/%(title)s.%(ext)s",
                "--no-warnings",
                "--no-playlist",
                "https://example.com/watch?v=abc",
            ]
        );
    }

    #[test]
    fn test_download_args_playlist_restricted() {
        let extractor = YtDlpExtractor::new(YtDlpSettings {
            restrict_filenames: true,
            ..Default::default()
        });
        let args = extractor.download_args(&request(DownloadScope::Playlist));
        assert!(args.contains(&"--yes-playlist".to_string()));
        assert!(args.contains(&"--restrict-filenames".to_string()));
        assert!(!args.contains(&"--no-playlist".to_string()));
        assert_eq!(args.last().unwrap(), "https://example.com/watch?v=abc");
    }

    #[test]
    fn test_parse_formats() {
        let formats = parse_formats(
            r#"{"id":"abc","title":"T","formats":[{"ext":"mp4","vcodec":"avc1","height":720}]}
            "#,
        )
        .unwrap();
        assert_eq!(formats.len(), 1);
        assert_eq!(formats[0].height, Some(720));

        assert!(parse_formats("not json").is_err());
        assert!(parse_formats(r#"{"id":"abc"}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_playlist_title() {
        assert_eq!(parse_playlist_title("My Mix\n"), Some("My Mix".to_string()));
        assert_eq!(parse_playlist_title("\n  Lectures 2024  \n"), Some("Lectures 2024".to_string()));
        assert_eq!(parse_playlist_title("NA\n"), None);
        assert_eq!(parse_playlist_title(""), None);
    }

    #[test]
    fn test_parse_entries() {
        let entries = parse_entries(
            "https://www.youtube.com/watch?v=a\n\nNA\nhttps://www.youtube.com/watch?v=b\n",
        );
        assert_eq!(
            entries,
            vec![
                "https://www.youtube.com/watch?v=a",
                "https://www.youtube.com/watch?v=b"
            ]
        );
    }

    #[tokio::test]
    async fn test_relay_lines_streams_and_captures() {
        let stderr = "ERROR: [youtube] a: Private video\nERROR: [youtube] b: Video unavailable\n";
        let mut sink = Vec::new();

        let captured = relay_lines(stderr.as_bytes(), &mut sink).await.unwrap();

        assert_eq!(
            captured,
            vec![
                "ERROR: [youtube] a: Private video",
                "ERROR: [youtube] b: Video unavailable"
            ]
        );
        assert_eq!(String::from_utf8(sink).unwrap(), stderr);
    }

    #[tokio::test]
    async fn test_relay_lines_empty() {
        let mut sink = Vec::new();
        assert!(relay_lines("".as_bytes(), &mut sink).await.unwrap().is_empty());
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_missing_binary_is_reported() {
        let extractor = YtDlpExtractor::new(YtDlpSettings {
            binary: "grabtube-no-such-binary".to_string(),
            ffmpeg: "grabtube-no-such-ffmpeg".to_string(),
            ..Default::default()
        });
        assert!(!extractor.test_availability().await);
        assert!(extractor.list_formats("https://example.com").await.is_err());
        assert!(extractor.playlist_title("https://example.com").await.is_err());
    }

    #[tokio::test]
    #[ignore] // Requires yt-dlp and network access
    async fn test_list_formats_live() {
        let extractor = YtDlpExtractor::new(YtDlpSettings::default());
        let formats = extractor
            .list_formats("https://www.youtube.com/watch?v=jNQXAC9IVRw")
            .await
            .unwrap();
        assert!(!formats.is_empty());
    }
}
