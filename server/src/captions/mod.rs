//! YouTube captions
//!
//! Probes the public `timedtext` endpoint with a fixed list of URL variants
//! and converts the first transcript found to SRT or WebVTT.

pub mod probe;
pub mod render;
pub mod transcript;
pub mod video_id;

use std::fmt;
use std::str::FromStr;

pub use probe::{CaptionFetcher, ProbeOutcome};
pub use render::{format_srt_time, format_vtt_time, render_srt, render_vtt};
pub use transcript::{parse_transcript, TranscriptError};
pub use video_id::extract_video_id;

/// Output format of a caption request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionFormat {
    /// Transcript XML as served
    Xml,
    Srt,
    Vtt,
}

impl CaptionFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptionFormat::Xml => "xml",
            CaptionFormat::Srt => "srt",
            CaptionFormat::Vtt => "vtt",
        }
    }
}

impl FromStr for CaptionFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xml" => Ok(CaptionFormat::Xml),
            "srt" => Ok(CaptionFormat::Srt),
            "vtt" => Ok(CaptionFormat::Vtt),
            other => Err(format!("Unsupported caption format '{}'. Use xml, srt or vtt.", other)),
        }
    }
}

impl fmt::Display for CaptionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timed caption line.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    /// 1-based position among non-empty cues
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing_is_case_insensitive() {
        assert_eq!("SRT".parse::<CaptionFormat>(), Ok(CaptionFormat::Srt));
        assert_eq!("Vtt".parse::<CaptionFormat>(), Ok(CaptionFormat::Vtt));
        assert_eq!("xml".parse::<CaptionFormat>(), Ok(CaptionFormat::Xml));
        assert!("json".parse::<CaptionFormat>().is_err());
    }
}
