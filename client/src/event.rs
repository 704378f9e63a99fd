use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

pub const UNTITLED_EVENT: &str = "Untitled Event";

/// One of the time representations a provider may hand us
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventTime {
    /// Already-resolved point in time
    Instant(DateTime<Utc>),
    /// `YYYY-MM-DD` literal, as sent for all-day events
    Date(String),
    /// Unparsed datetime literal, usually RFC 3339
    DateTime(String),
}

impl EventTime {
    /// Pick one representation out of the raw fields.
    /// An instant wins over a date-only literal, which wins over a datetime literal.
    pub fn resolve(
        instant: Option<DateTime<Utc>>,
        date: Option<String>,
        date_time: Option<String>,
    ) -> Option<Self> {
        if let Some(instant) = instant {
            return Some(Self::Instant(instant));
        }
        if let Some(date) = date.filter(|d| !d.trim().is_empty()) {
            return Some(Self::Date(date));
        }
        date_time
            .filter(|dt| !dt.trim().is_empty())
            .map(Self::DateTime)
    }

    pub fn is_date_only(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// Point in time for timed values; date-only values have none
    pub fn to_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Instant(instant) => Some(*instant),
            Self::Date(_) => None,
            Self::DateTime(text) => DateTime::parse_from_rfc3339(text.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    // Offset-less literal; treat as UTC for ordering purposes only
                    parse_naive_datetime(text).map(|naive| naive.and_utc())
                }),
        }
    }
}

pub(crate) fn parse_naive_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M"))
        .ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub name: Option<String>,
    pub email: String,
}

impl Attendee {
    /// Name when the provider has one, email otherwise
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.email)
    }
}

/// An event as the grid sees it, built once per fetch and never mutated afterwards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub is_all_day: bool,
    pub location: String,
    pub description: String,
    pub attendees: Vec<Attendee>,
}

impl CalendarEvent {
    /// Minimal timed event; used by adapters and tests
    pub fn timed(id: impl Into<String>, title: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start: Some(EventTime::Instant(start)),
            end: None,
            is_all_day: false,
            location: String::new(),
            description: String::new(),
            attendees: Vec::new(),
        }
    }

    pub fn all_day(id: impl Into<String>, title: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start: Some(EventTime::Date(date.into())),
            end: None,
            is_all_day: true,
            location: String::new(),
            description: String::new(),
            attendees: Vec::new(),
        }
    }

    pub fn start_instant(&self) -> Option<DateTime<Utc>> {
        self.start.as_ref().and_then(EventTime::to_instant)
    }

    pub fn end_instant(&self) -> Option<DateTime<Utc>> {
        self.end.as_ref().and_then(EventTime::to_instant)
    }
}
