//! Transcript XML parsing.
//!
//! The document is `<transcript><text start=".." dur="..">…</text>…</transcript>`.
//! Every `text` element contributes a cue; attribute values that are missing
//! or not numbers count as zero.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::Cue;

#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("malformed caption XML: {0}")]
    Xml(String),

    #[error("caption XML ended inside an open element")]
    Truncated,
}

/// Parse a transcript into cues, dropping those whose text is empty.
pub fn parse_transcript(xml: &str) -> Result<Vec<Cue>, TranscriptError> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut current: Option<(f64, f64, String)> = None;
    let mut cues = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                if e.name().as_ref() == b"text" {
                    current = Some((number_attr(&e, b"start"), number_attr(&e, b"dur"), String::new()));
                }
            }
            Ok(Event::Text(t)) => {
                if let Some((_, _, buf)) = current.as_mut() {
                    let text = t.unescape().map_err(|e| TranscriptError::Xml(e.to_string()))?;
                    buf.push_str(&text);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some((_, _, buf)) = current.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::End(e)) => {
                depth = depth.saturating_sub(1);
                if e.name().as_ref() == b"text" {
                    if let Some((start, dur, raw)) = current.take() {
                        if !raw.is_empty() {
                            cues.push(Cue {
                                index: cues.len() + 1,
                                start,
                                end: start + dur,
                                text: html_unescape(&raw).into_owned(),
                            });
                        }
                    }
                }
            }
            Ok(Event::Eof) => {
                if depth > 0 {
                    return Err(TranscriptError::Truncated);
                }
                break;
            }
            Err(e) => return Err(TranscriptError::Xml(e.to_string())),
            // Self-closing <text/> carries no content
            Ok(_) => {}
        }
    }

    Ok(cues)
}

fn number_attr(element: &BytesStart<'_>, name: &[u8]) -> f64 {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok().and_then(|v| v.trim().parse::<f64>().ok()))
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Decode HTML entities left after XML unescaping (YouTube double-escapes
/// apostrophes and quotes). Stray `&` and unknown references stay literal.
fn html_unescape(raw: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(raw)
}
