//! YouTube caption endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use gbridge_protocol::CaptionResult;
use serde::Deserialize;
use tracing::info;

use super::common::{ApiPath, ApiQuery};
use crate::captions::{extract_video_id, CaptionFormat};
use crate::common::{AppError, AppResult};
use crate::proxy::AppState;

#[derive(Debug, Deserialize)]
pub struct CaptionParams {
    #[serde(default = "default_language")]
    language: String,
    #[serde(default = "default_format")]
    format: String,
}

#[derive(Debug, Deserialize)]
pub struct CaptionUrlParams {
    url: String,
    #[serde(flatten)]
    options: CaptionParams,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_format() -> String {
    "srt".to_string()
}

async fn fetch(state: &AppState, video_id: &str, params: &CaptionParams) -> AppResult<Json<CaptionResult>> {
    let format: CaptionFormat = params.format.parse().map_err(AppError::bad_request)?;
    info!(video_id = %video_id, language = %params.language, format = %format, "Fetching captions");
    Ok(Json(state.captions.fetch(video_id, &params.language, format).await))
}

pub async fn captions_by_id(
    State(state): State<Arc<AppState>>,
    ApiPath(video_id): ApiPath<String>,
    ApiQuery(params): ApiQuery<CaptionParams>,
) -> AppResult<Json<CaptionResult>> {
    fetch(&state, &video_id, &params).await
}

pub async fn captions_by_url(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<CaptionUrlParams>,
) -> AppResult<Json<CaptionResult>> {
    let video_id = extract_video_id(&params.url)
        .ok_or_else(|| AppError::bad_request("Invalid YouTube URL or video ID not found"))?;
    fetch(&state, &video_id, &params.options).await
}
