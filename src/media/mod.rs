mod extractor;
mod orchestrator;
mod quality;
mod types;
mod utils;
mod ytdlp;

#[cfg(test)]
pub(crate) mod testing;

pub use extractor::Extractor;
pub use orchestrator::Orchestrator;
pub use quality::QualityResolver;
pub use types::Quality;
pub use utils::clean_video_url;
pub use ytdlp::YtDlpExtractor;
