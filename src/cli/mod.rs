mod console;

pub use console::Console;

use crate::{
    config::QualitySettings,
    media::{clean_video_url, Orchestrator, Quality, QualityResolver},
};
use anyhow::Result;
use std::{
    io::Write,
    path::{Path, PathBuf},
};
use tokio::io::AsyncBufRead;
use tracing::{debug, info, warn};

const MODE_PROMPT: &str = "Do you want to download\n(1) A single video\n(2) Multiple videos\n(3) A playlist\n(4) Multiple playlists\nEnter 1, 2, 3 or 4: ";
const INVALID_MODE: &str = "Invalid choice. Please enter 1, 2, 3 or 4.";
const QUALITY_PROMPT: &str = "Enter the number of the desired quality: ";
const CONTINUE_PROMPT: &str = "You want to download any more videos? [y/n] ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    SingleVideo,
    MultipleVideos,
    SinglePlaylist,
    MultiplePlaylists,
}

impl Mode {
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(Mode::SingleVideo),
            "2" => Some(Mode::MultipleVideos),
            "3" => Some(Mode::SinglePlaylist),
            "4" => Some(Mode::MultiplePlaylists),
            _ => None,
        }
    }

    fn is_multiple(self) -> bool {
        matches!(self, Mode::MultipleVideos | Mode::MultiplePlaylists)
    }

    fn is_playlist(self) -> bool {
        matches!(self, Mode::SinglePlaylist | Mode::MultiplePlaylists)
    }

    fn target_prompt(self) -> &'static str {
        match self {
            Mode::SingleVideo => "Enter the URL of the video: ",
            Mode::MultipleVideos => "Enter the URLs of the videos separated by spaces: ",
            Mode::SinglePlaylist => "Enter the URL of the playlist: ",
            Mode::MultiplePlaylists => "Enter the URLs of the playlists separated by spaces: ",
        }
    }

    /// Single-target modes take the first token only; video URLs lose their playlist context.
    fn parse_targets(self, input: &str) -> Vec<String> {
        let tokens = input.split_whitespace();
        let tokens: Vec<&str> = if self.is_multiple() {
            tokens.collect()
        } else {
            tokens.take(1).collect()
        };

        tokens
            .into_iter()
            .map(|token| {
                if self.is_playlist() {
                    token.to_string()
                } else {
                    clean_video_url(token)
                }
            })
            .collect()
    }
}

/// Destination paths as typed by the user, picked positionally per item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathPlan {
    paths: Vec<PathBuf>,
}

impl PathPlan {
    /// An empty line keeps the default root. Multi-target modes split on whitespace,
    /// single-target modes treat the whole line as one path.
    pub fn parse(input: &str, mode: Mode) -> Self {
        let input = input.trim();
        let paths = if input.is_empty() {
            Vec::new()
        } else if mode.is_multiple() {
            input.split_whitespace().map(PathBuf::from).collect()
        } else {
            vec![PathBuf::from(input)]
        };
        Self { paths }
    }

    /// Path for item `index`, falling back to the first path; `None` means the default root.
    pub fn for_item(&self, index: usize) -> Option<&Path> {
        self.paths
            .get(index)
            .or_else(|| self.paths.first())
            .map(PathBuf::as_path)
    }
}

enum Flow {
    Continue,
    Exit,
}

enum Resolved {
    Quality(Quality),
    Skipped,
    EndOfInput,
}

/// The interactive prompt loop: mode, paths, targets, quality, run, continue?
pub struct Session<'a, R, W> {
    console: Console<R, W>,
    orchestrator: &'a Orchestrator,
    quality: &'a QualitySettings,
}

impl<'a, R, W> Session<'a, R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(
        console: Console<R, W>,
        orchestrator: &'a Orchestrator,
        quality: &'a QualitySettings,
    ) -> Self {
        Self {
            console,
            orchestrator,
            quality,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        loop {
            if let Flow::Exit = self.iteration().await? {
                break;
            }

            match self.console.prompt(CONTINUE_PROMPT).await? {
                Some(answer) if wants_more(&answer) => continue,
                _ => break,
            }
        }

        info!("Session finished");
        Ok(())
    }

    async fn iteration(&mut self) -> Result<Flow> {
        let Some(choice) = self.console.prompt(MODE_PROMPT).await? else {
            return Ok(Flow::Exit);
        };
        let Some(mode) = Mode::from_choice(&choice) else {
            debug!("Rejected mode choice {:?}", choice);
            self.console.say(INVALID_MODE)?;
            return Ok(Flow::Continue);
        };

        let path_prompt = format!(
            "Enter the download path or paths if more than one video or playlist arranged (default is {}): ",
            self.orchestrator.settings().root.display()
        );
        let Some(path_input) = self.console.prompt(&path_prompt).await? else {
            return Ok(Flow::Exit);
        };
        let paths = PathPlan::parse(&path_input, mode);

        let Some(target_input) = self.console.prompt(mode.target_prompt()).await? else {
            return Ok(Flow::Exit);
        };
        let targets = mode.parse_targets(&target_input);
        if targets.is_empty() {
            self.console.say("No URL entered.")?;
            return Ok(Flow::Continue);
        }

        info!("Starting {:?} batch with {} targets", mode, targets.len());

        if mode.is_playlist() {
            self.run_playlists(&targets, &paths).await
        } else {
            self.run_videos(&targets, &paths).await
        }
    }

    async fn run_videos(&mut self, urls: &[String], paths: &PathPlan) -> Result<Flow> {
        let orchestrator = self.orchestrator;

        for (index, url) in urls.iter().enumerate() {
            let quality = match self.video_quality(url).await? {
                Resolved::Quality(quality) => quality,
                Resolved::Skipped => continue,
                Resolved::EndOfInput => return Ok(Flow::Exit),
            };

            let dir = orchestrator.video_dir(paths.for_item(index));
            orchestrator
                .download_video(url, quality, &dir, self.console.output())
                .await?;
        }

        Ok(Flow::Continue)
    }

    async fn run_playlists(&mut self, urls: &[String], paths: &PathPlan) -> Result<Flow> {
        let orchestrator = self.orchestrator;

        let quality = match self.playlist_quality().await? {
            Resolved::Quality(quality) => quality,
            Resolved::Skipped => return Ok(Flow::Continue),
            Resolved::EndOfInput => return Ok(Flow::Exit),
        };

        for (index, url) in urls.iter().enumerate() {
            orchestrator
                .download_playlist(url, quality, paths.for_item(index), self.console.output())
                .await?;
        }

        Ok(Flow::Continue)
    }

    async fn video_quality(&mut self, url: &str) -> Result<Resolved> {
        let resolver = QualityResolver::new(self.orchestrator.extractor(), self.quality);

        let options = match resolver.video_options(url).await {
            Ok(options) => options,
            Err(e) => {
                warn!("Quality lookup failed for {}: {:#}", url, e);
                self.console
                    .say(format_args!("An error occurred while fetching qualities for {url}: {e:#}"))?;
                return Ok(Resolved::Skipped);
            }
        };

        self.console.say("Available qualities:")?;
        for (i, height) in options.iter().enumerate() {
            self.console.say(format_args!("{}. {}", i + 1, height))?;
        }

        let Some(choice) = self.console.prompt(QUALITY_PROMPT).await? else {
            return Ok(Resolved::EndOfInput);
        };
        Ok(Resolved::Quality(resolver.pick_video(&options, &choice)))
    }

    async fn playlist_quality(&mut self) -> Result<Resolved> {
        let resolver = QualityResolver::new(self.orchestrator.extractor(), self.quality);

        self.console.say("Available qualities for playlist download:")?;
        for (i, height) in resolver.playlist_options().iter().enumerate() {
            self.console.say(format_args!("{}. {}p", i + 1, height))?;
        }

        let Some(choice) = self.console.prompt(QUALITY_PROMPT).await? else {
            return Ok(Resolved::EndOfInput);
        };
        Ok(Resolved::Quality(resolver.pick_playlist(&choice)))
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.console.into_output()
    }
}

fn wants_more(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
