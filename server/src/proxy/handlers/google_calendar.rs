//! Google Calendar Handler
//!
//! Reminders are timed events on the primary calendar using its default
//! notification settings.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use gbridge_protocol::{
    CreateReminderParams, CreateReminderResponse, MessageResponse, ReadRemindersResponse, ReminderQuery,
};
use serde::Deserialize;
use tracing::info;

use super::common::{calendar_api, upstream, ApiQuery};
use crate::common::{AppError, AppResult};
use crate::google::calendar_api::{reminder_event, EventTime};
use crate::proxy::AppState;

const PRIMARY_CALENDAR: &str = "primary";
const DEFAULT_MAX_EVENTS: u32 = 30;

fn parse_time(field: &str, raw: &str) -> AppResult<EventTime> {
    EventTime::parse(raw).map_err(|e| AppError::bad_request(format!("Invalid {}: {}", field, e)))
}

pub async fn create_reminder(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<CreateReminderParams>,
) -> AppResult<Json<CreateReminderResponse>> {
    info!("Handling calendar create-reminder");

    let start = parse_time("start_time", &params.start_time)?;
    let end = parse_time("end_time", &params.end_time)?;

    let calendar = calendar_api(&state).await?;
    let event = reminder_event(&params.title, &params.description, &start, &end, &params.timezone);
    let created = calendar
        .insert_event(PRIMARY_CALENDAR, &event)
        .await
        .map_err(upstream("Error creating reminder"))?;

    let field = |name: &str| {
        created
            .get(name)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };

    Ok(Json(CreateReminderResponse {
        message: "Reminder created successfully".to_string(),
        event_id: field("id"),
        html_link: field("htmlLink"),
    }))
}

pub async fn read_reminders(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ReminderQuery>,
) -> AppResult<Json<ReadRemindersResponse>> {
    info!("Handling calendar read-reminders");

    let time_min = query
        .time_min
        .as_deref()
        .map(|raw| parse_time("time_min", raw))
        .transpose()?
        .map(|t| t.to_query_bound());
    let time_max = query
        .time_max
        .as_deref()
        .map(|raw| parse_time("time_max", raw))
        .transpose()?
        .map(|t| t.to_query_bound());
    let max_results = query.max_results.unwrap_or(DEFAULT_MAX_EVENTS) as usize;

    let calendar = calendar_api(&state).await?;
    let events = calendar
        .list_events(PRIMARY_CALENDAR, time_min.as_deref(), time_max.as_deref(), max_results)
        .await
        .map_err(upstream("Error reading reminders"))?;

    Ok(Json(ReadRemindersResponse { events }))
}

#[derive(Debug, Deserialize)]
pub struct RemoveParams {
    event_id: String,
}

pub async fn remove_reminder(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<RemoveParams>,
) -> AppResult<Json<MessageResponse>> {
    info!("Handling calendar remove-reminder for {}", params.event_id);

    let calendar = calendar_api(&state).await?;
    calendar
        .delete_event(PRIMARY_CALENDAR, &params.event_id)
        .await
        .map_err(upstream("Error removing reminder"))?;

    Ok(Json(MessageResponse {
        message: "Reminder removed successfully".to_string(),
    }))
}
