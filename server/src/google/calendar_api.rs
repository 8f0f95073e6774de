//! Google Calendar API v3 Client
//!
//! Event insert, list and delete on a calendar, plus the datetime handling
//! shared by the reminder endpoints.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::client::{GoogleClient, GoogleError};

pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

pub struct CalendarApi {
    client: GoogleClient,
    base_url: String,
}

super::google_api_wrapper!(CalendarApi);

/// An ISO 8601 datetime as accepted from callers.
#[derive(Debug, Clone, PartialEq)]
pub enum EventTime {
    /// Carries its own UTC offset
    Offset(DateTime<FixedOffset>),
    /// Wall-clock time, interpreted in the event's time zone
    Naive(NaiveDateTime),
}

impl EventTime {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(EventTime::Offset(dt));
        }
        for fmt in NAIVE_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Ok(EventTime::Naive(dt));
            }
        }
        if let Some(dt) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return Ok(EventTime::Naive(dt));
        }
        Err(format!("'{}' is not an ISO 8601 datetime", raw))
    }

    /// Value for an event's `start.dateTime` / `end.dateTime`.
    pub fn to_event_string(&self) -> String {
        match self {
            EventTime::Offset(dt) => dt.to_rfc3339(),
            EventTime::Naive(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }

    /// Value for `timeMin` / `timeMax`, which must carry an offset; naive
    /// times are taken as UTC.
    pub fn to_query_bound(&self) -> String {
        match self {
            EventTime::Offset(dt) => dt.to_rfc3339(),
            EventTime::Naive(dt) => format!("{}Z", dt.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

/// Body of a timed event with the calendar's default reminders.
pub fn reminder_event(title: &str, description: &str, start: &EventTime, end: &EventTime, time_zone: &str) -> Value {
    json!({
        "summary": title,
        "description": description,
        "start": {"dateTime": start.to_event_string(), "timeZone": time_zone},
        "end": {"dateTime": end.to_event_string(), "timeZone": time_zone},
        "reminders": {"useDefault": true},
    })
}

impl CalendarApi {
    /// List events in a calendar, expanded and ordered by start time
    pub async fn list_events(
        &self,
        calendar_id: &str,
        time_min: Option<&str>,
        time_max: Option<&str>,
        max_results: usize,
    ) -> Result<Vec<Value>, GoogleError> {
        info!("Listing events for calendar: {}", calendar_id);

        let mut query_params = vec![];
        if let Some(min) = time_min {
            query_params.push(("timeMin", min.to_string()));
        }
        if let Some(max) = time_max {
            query_params.push(("timeMax", max.to_string()));
        }
        query_params.push(("singleEvents", "true".to_string()));
        query_params.push(("orderBy", "startTime".to_string()));

        let url = self.events_url(calendar_id);
        let events = self
            .client
            .get_paginated(&url, &query_params, Some(max_results))
            .await?;

        debug!("Retrieved {} events", events.len());
        Ok(events)
    }

    /// Insert an event and return the created resource
    pub async fn insert_event(&self, calendar_id: &str, event: &Value) -> Result<Value, GoogleError> {
        info!("Creating event in calendar: {}", calendar_id);

        let response = self.client.post(&self.events_url(calendar_id), event).await?;

        info!("Event created successfully");
        Ok(response)
    }

    pub async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), GoogleError> {
        info!("Deleting event: {} from calendar: {}", event_id, calendar_id);

        let url = format!("{}/{}", self.events_url(calendar_id), urlencoding::encode(event_id));
        self.client.delete(&url).await?;

        info!("Event deleted successfully");
        Ok(())
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!("{}/calendars/{}/events", self.base_url, urlencoding::encode(calendar_id))
    }
}
