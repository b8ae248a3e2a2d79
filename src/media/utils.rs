use std::path::Path;
use url::Url;

const OUTPUT_FILE_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Drops playlist context (`list` and every parameter after it) from a video URL.
/// URLs whose first query parameter is `list` are actual playlist URLs and stay untouched.
pub fn clean_video_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return match raw.find("&list") {
            Some(idx) => raw[..idx].to_string(),
            None => raw.to_string(),
        };
    };
    let Some(query) = url.query() else {
        return raw.to_string();
    };

    // Byte offset of the first `list` pair inside the raw query
    let mut offset = 0;
    let mut cut = None;
    for segment in query.split('&') {
        if segment.split('=').next() == Some("list") {
            cut = Some(offset);
            break;
        }
        offset += segment.len() + 1;
    }

    match cut {
        None | Some(0) => raw.to_string(),
        Some(start) => {
            let kept = query[..start].trim_end_matches('&').to_string();
            url.set_query((!kept.is_empty()).then_some(kept.as_str()));
            url.to_string()
        }
    }
}

/// yt-dlp output template placing files named after the video title inside `dir`
pub fn output_template(dir: &Path) -> String {
    dir.join(OUTPUT_FILE_TEMPLATE).to_string_lossy().into_owned()
}

/// Turns a remote playlist title into a single, safe directory name.
pub fn sanitize_dir_name(title: &str, fallback: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = replaced.trim().trim_end_matches(['.', ' ']);
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}
