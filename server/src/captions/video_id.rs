use once_cell::sync::Lazy;
use regex::Regex;

/// Tried in order; the first capture wins.
static VIDEO_ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?:youtube\.com/watch\?v=|youtu\.be/)([A-Za-z0-9_-]+)",
        r"youtube\.com/embed/([A-Za-z0-9_-]+)",
        r"youtube\.com/v/([A-Za-z0-9_-]+)",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Pull the video id out of a YouTube watch, short, embed or `/v/` URL.
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
