//! Response shapes accepted from the events endpoints.
//!
//! The real handler answers `{ events: [...] }` with flattened, already
//! converted records. The development stand-in answers `{ items: [...] }` with
//! provider-native records (`summary`, nested `start.dateTime`). Both are turned
//! into [`CalendarEvent`]s here so nothing past the gateway has to care.
//!
//! Records are adapted one at a time. A record that doesn't fit the expected
//! shape still becomes an event, just one without a start, so the binder
//! leaves it off the grid instead of the whole response being lost.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::event::{Attendee, CalendarEvent, EventTime, UNTITLED_EVENT};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum EventsResponse {
    Flattened { events: Vec<Value> },
    Nested { items: Vec<Value> },
}

impl EventsResponse {
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Flattened { .. } => "flattened",
            Self::Nested { .. } => "nested",
        }
    }

    pub fn into_events(self) -> Vec<CalendarEvent> {
        let records = match self {
            Self::Flattened { events } => events,
            Self::Nested { items } => items,
        };
        records.iter().map(adapt_record).collect()
    }
}

fn adapt_record(record: &Value) -> CalendarEvent {
    match WireEvent::deserialize(record) {
        Ok(wire) => wire.into_calendar_event(),
        Err(e) => {
            warn!("Event record has an unexpected shape ({}); keeping it off the grid", e);
            unplaceable_event(record)
        }
    }
}

/// Salvage id and title from a record that failed to deserialize
fn unplaceable_event(record: &Value) -> CalendarEvent {
    let id = match record.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => Uuid::new_v4().to_string(),
    };
    let title = ["title", "summary"]
        .iter()
        .find_map(|field| record.get(*field).and_then(Value::as_str))
        .filter(|t| !t.is_empty())
        .unwrap_or(UNTITLED_EVENT);

    CalendarEvent {
        id,
        title: title.to_string(),
        start: None,
        end: None,
        is_all_day: false,
        location: String::new(),
        description: String::new(),
        attendees: Vec::new(),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireEvent {
    pub id: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub start: Option<WireTime>,
    pub end: Option<WireTime>,
    pub location: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "isAllDay")]
    pub is_all_day: Option<bool>,
    pub attendees: Option<Vec<WireAttendee>>,
}

/// Either a bare string or the provider's `{dateTime, date}` object
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireTime {
    Text(String),
    Fields {
        #[serde(rename = "dateTime")]
        date_time: Option<String>,
        date: Option<String>,
        #[serde(rename = "timeZone")]
        time_zone: Option<String>,
    },
    /// Anything else, e.g. an epoch number; resolves to no time at all
    Other(Value),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireAttendee {
    pub email: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthUrlResponse {
    #[serde(rename = "authUrl")]
    pub auth_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenExchangeRequest<'a> {
    pub code: &'a str,
}

/// `{ success, tokens }`; tokens are passed through untouched
#[derive(Debug, Clone, Deserialize)]
pub struct TokenExchange {
    pub success: bool,
    #[serde(default)]
    pub tokens: serde_json::Value,
}

impl TokenExchange {
    pub fn access_token(&self) -> Option<String> {
        self.tokens
            .get("access_token")
            .and_then(|t| t.as_str())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }
}

impl WireTime {
    fn into_event_time(self, all_day_hint: Option<bool>) -> Option<EventTime> {
        match self {
            Self::Text(text) => {
                if let Ok(instant) = DateTime::parse_from_rfc3339(text.trim()) {
                    let instant = instant.with_timezone(&Utc);
                    if all_day_hint == Some(true) {
                        // Serialized all-day dates arrive as midnight UTC; keep the literal day
                        return Some(EventTime::Date(instant.format("%Y-%m-%d").to_string()));
                    }
                    return Some(EventTime::Instant(instant));
                }
                if NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").is_ok() {
                    return EventTime::resolve(None, Some(text), None);
                }
                EventTime::resolve(None, None, Some(text))
            }
            Self::Fields {
                date_time, date, ..
            } => EventTime::resolve(None, date, date_time),
            Self::Other(_) => None,
        }
    }
}

impl WireEvent {
    pub fn into_calendar_event(self) -> CalendarEvent {
        let start = self
            .start
            .and_then(|start| start.into_event_time(self.is_all_day));
        let end = self.end.and_then(|end| end.into_event_time(self.is_all_day));
        let is_all_day = self
            .is_all_day
            .unwrap_or_else(|| start.as_ref().is_some_and(EventTime::is_date_only));

        let title = self
            .title
            .or(self.summary)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED_EVENT.to_string());

        let attendees = self
            .attendees
            .unwrap_or_default()
            .into_iter()
            .map(|a| Attendee {
                name: a.display_name.or(a.name),
                email: a.email.unwrap_or_default(),
            })
            .collect();

        CalendarEvent {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            title,
            start,
            end,
            is_all_day,
            location: self.location.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            attendees,
        }
    }
}
