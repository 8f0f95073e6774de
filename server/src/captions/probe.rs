//! Caption endpoint probing.
//!
//! Candidates are tried one at a time in a fixed order; the first one that
//! answers 200 with a transcript body (and, for SRT/VTT, parses) wins.

use gbridge_protocol::{CaptionResult, CaptionsFound, CaptionsMissing};

use super::{parse_transcript, render_srt, render_vtt, CaptionFormat};
use crate::common::browser_http_client;

/// Marker a body must contain to count as a transcript.
const TRANSCRIPT_MARKER: &str = "<transcript>";

/// What one candidate URL produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// Transcript body
    Accepted(String),
    /// Why the candidate was skipped
    Rejected(String),
}

pub struct CaptionFetcher {
    http: reqwest::Client,
    base_url: String,
}

impl CaptionFetcher {
    pub fn new(base_url: &str) -> Result<Self, String> {
        Ok(Self {
            http: browser_http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Candidate caption URLs for a video, in probing order.
    pub fn candidate_urls(&self, video_id: &str, language: &str) -> Vec<String> {
        let base = format!("{}/api/timedtext", self.base_url);
        let v = urlencoding::encode(video_id);
        let lang = urlencoding::encode(language);
        vec![
            format!("{}?v={}&lang={}", base, v, lang),
            format!("{}?v={}&lang={}&fmt=srv3", base, v, lang),
            format!("{}?v={}&lang={}&kind=asr", base, v, lang),
            format!("{}?v={}&lang={}-orig", base, v, lang),
            format!("{}?v={}&lang={}_orig", base, v, lang),
        ]
    }

    /// Fetch captions for `video_id`. Running out of candidates is reported
    /// in the result, not as an error.
    pub async fn fetch(&self, video_id: &str, language: &str, format: CaptionFormat) -> CaptionResult {
        self.warm_up(video_id).await;

        let candidates = self.candidate_urls(video_id, language);
        for url in &candidates {
            tracing::info!(url = %url, "Probing caption URL");
            let body = match self.probe(url).await {
                ProbeOutcome::Accepted(body) => body,
                ProbeOutcome::Rejected(reason) => {
                    tracing::debug!(url = %url, "Caption candidate rejected: {}", reason);
                    continue;
                }
            };

            let captions = match format {
                CaptionFormat::Xml => body,
                CaptionFormat::Srt | CaptionFormat::Vtt => match parse_transcript(&body) {
                    Ok(cues) if format == CaptionFormat::Srt => render_srt(&cues),
                    Ok(cues) => render_vtt(&cues),
                    Err(e) => {
                        tracing::error!(url = %url, "Failed to parse caption XML: {}", e);
                        continue;
                    }
                },
            };

            tracing::info!(video_id = %video_id, format = %format, "Captions found");
            return CaptionResult::Found(CaptionsFound {
                success: true,
                captions,
                format: format.to_string(),
                url: url.clone(),
            });
        }

        tracing::warn!(video_id = %video_id, language = %language, "No caption candidate succeeded");
        CaptionResult::Missing(CaptionsMissing {
            success: false,
            error: format!("No captions available for language {}", language),
            video_id: video_id.to_string(),
            tested_urls: candidates,
        })
    }

    /// One GET against a candidate.
    pub async fn probe(&self, url: &str) -> ProbeOutcome {
        let response = match self.http.get(url).send().await {
            Ok(r) => r,
            Err(e) => return ProbeOutcome::Rejected(format!("request failed: {}", e)),
        };
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return ProbeOutcome::Rejected(format!("status {}", status.as_u16()));
        }
        match response.text().await {
            Ok(body) if body.contains(TRANSCRIPT_MARKER) => ProbeOutcome::Accepted(body),
            Ok(_) => ProbeOutcome::Rejected("no transcript in body".to_string()),
            Err(e) => ProbeOutcome::Rejected(format!("body read failed: {}", e)),
        }
    }

    /// Best-effort visit of the watch page; only the outcome is logged.
    async fn warm_up(&self, video_id: &str) {
        let url = format!("{}/watch?v={}", self.base_url, urlencoding::encode(video_id));
        match self.http.get(&url).send().await {
            Ok(r) => tracing::info!(status = r.status().as_u16(), "Fetched video page"),
            Err(e) => tracing::warn!("Video page request failed: {}", e),
        }
    }
}
