//! SRT and WebVTT rendering.

use super::Cue;

/// `HH:MM:SS<sep>mmm`, truncating to whole milliseconds. Negative or
/// non-finite input renders as zero.
fn format_timestamp(seconds: f64, separator: char) -> String {
    let seconds = if seconds.is_finite() && seconds > 0.0 { seconds } else { 0.0 };

    let hours = (seconds / 3600.0).floor() as u64;
    let minutes = ((seconds % 3600.0) / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    let millis = ((seconds * 1000.0).floor() as u64) % 1000;

    format!("{:02}:{:02}:{:02}{}{:03}", hours, minutes, secs, separator, millis)
}

pub fn format_srt_time(seconds: f64) -> String {
    format_timestamp(seconds, ',')
}

pub fn format_vtt_time(seconds: f64) -> String {
    format_timestamp(seconds, '.')
}

pub fn render_srt(cues: &[Cue]) -> String {
    let mut out = String::new();
    for cue in cues {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            cue.index,
            format_srt_time(cue.start),
            format_srt_time(cue.end),
            cue.text
        ));
    }
    out
}

pub fn render_vtt(cues: &[Cue]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for cue in cues {
        out.push_str(&format!(
            "{} --> {}\n{}\n\n",
            format_vtt_time(cue.start),
            format_vtt_time(cue.end),
            cue.text
        ));
    }
    out
}
