//! Canonical calendar-day keys for events.
//!
//! Every event is reduced to the day it starts on, as seen from the viewer's
//! zone. Date-only literals are taken at face value and never shifted.

use chrono::{DateTime, Local, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{CalendarError, CalendarResult};
use crate::event::{parse_naive_datetime, CalendarEvent, EventTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// The zone whose calendar days the grid shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerZone {
    /// Whatever the host reports
    Local,
    Named(Tz),
}

impl ViewerZone {
    pub fn date_of(&self, instant: &DateTime<Utc>) -> NaiveDate {
        match self {
            Self::Local => instant.with_timezone(&Local).date_naive(),
            Self::Named(tz) => instant.with_timezone(tz).date_naive(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.date_of(&Utc::now())
    }

    /// Render an instant as wall-clock time in this zone
    pub fn format(&self, instant: &DateTime<Utc>, pattern: &str) -> String {
        match self {
            Self::Local => instant.with_timezone(&Local).format(pattern).to_string(),
            Self::Named(tz) => instant.with_timezone(tz).format(pattern).to_string(),
        }
    }
}

/// Maps events to the day they belong to
#[derive(Debug, Clone, Copy)]
pub struct DateKeyNormalizer {
    zone: ViewerZone,
}

impl DateKeyNormalizer {
    pub fn new(zone: ViewerZone) -> Self {
        Self { zone }
    }

    pub fn zone(&self) -> ViewerZone {
        self.zone
    }

    /// Day key for an event, or `None` when its start cannot be placed on any day
    pub fn normalize(&self, event: &CalendarEvent) -> Option<DateKey> {
        self.try_normalize(event).ok()
    }

    pub fn try_normalize(&self, event: &CalendarEvent) -> CalendarResult<DateKey> {
        let start = event.start.as_ref().ok_or_else(|| CalendarError::MalformedEvent {
            id: event.id.clone(),
            message: "event has no start time".to_string(),
        })?;

        self.key_for(start).ok_or_else(|| CalendarError::MalformedEvent {
            id: event.id.clone(),
            message: format!("unrecognized start time {:?}", start),
        })
    }

    pub fn key_for(&self, time: &EventTime) -> Option<DateKey> {
        match time {
            EventTime::Instant(instant) => Some(DateKey(self.zone.date_of(instant))),
            EventTime::Date(text) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
                .ok()
                .map(DateKey),
            EventTime::DateTime(text) => {
                if let Ok(parsed) = DateTime::parse_from_rfc3339(text.trim()) {
                    return Some(DateKey(self.zone.date_of(&parsed.with_timezone(&Utc))));
                }
                // No offset: already wall-clock time in the viewer's zone
                parse_naive_datetime(text).map(|naive| DateKey(naive.date()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc_normalizer() -> DateKeyNormalizer {
        DateKeyNormalizer::new(ViewerZone::Named(chrono_tz::UTC))
    }

    fn day(y: i32, m: u32, d: u32) -> DateKey {
        DateKey::new(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_date_only_and_datetime_share_a_key() {
        let normalizer = utc_normalizer();
        let all_day = CalendarEvent::all_day("a", "Offsite", "2024-03-05");
        let mut timed = CalendarEvent::all_day("b", "Standup", "");
        timed.start = Some(EventTime::DateTime("2024-03-05T09:00:00Z".to_string()));
        timed.is_all_day = false;

        assert_eq!(normalizer.normalize(&all_day), Some(day(2024, 3, 5)));
        assert_eq!(normalizer.normalize(&timed), Some(day(2024, 3, 5)));
    }

    #[test]
    fn test_instant_truncates_in_viewer_zone() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 5, 2, 0, 0).unwrap();
        let event = CalendarEvent::timed("late", "Late call", instant);

        let new_york = DateKeyNormalizer::new(ViewerZone::Named(chrono_tz::America::New_York));
        assert_eq!(new_york.normalize(&event), Some(day(2024, 3, 4)));
        assert_eq!(utc_normalizer().normalize(&event), Some(day(2024, 3, 5)));
    }

    #[test]
    fn test_date_only_is_never_shifted() {
        let event = CalendarEvent::all_day("holiday", "Holiday", "2024-03-05");
        let tokyo = DateKeyNormalizer::new(ViewerZone::Named(chrono_tz::Asia::Tokyo));
        let honolulu = DateKeyNormalizer::new(ViewerZone::Named(chrono_tz::Pacific::Honolulu));

        assert_eq!(tokyo.normalize(&event), Some(day(2024, 3, 5)));
        assert_eq!(honolulu.normalize(&event), Some(day(2024, 3, 5)));
    }

    #[test]
    fn test_offsetless_datetime_is_wall_clock() {
        let normalizer = DateKeyNormalizer::new(ViewerZone::Named(chrono_tz::Asia::Tokyo));
        let time = EventTime::DateTime("2024-03-05T23:30:00".to_string());
        assert_eq!(normalizer.key_for(&time), Some(day(2024, 3, 5)));
    }

    #[test]
    fn test_missing_or_garbage_start_fails_closed() {
        let normalizer = utc_normalizer();
        let mut event = CalendarEvent::all_day("x", "Nothing", "not-a-date");
        assert_eq!(normalizer.normalize(&event), None);

        event.start = None;
        let err = normalizer.try_normalize(&event).unwrap_err();
        assert!(matches!(err, CalendarError::MalformedEvent { ref id, .. } if id == "x"));
    }

    #[test]
    fn test_normalize_is_repeatable() {
        let normalizer = utc_normalizer();
        let event = CalendarEvent::timed("r", "Review", Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap());
        let first = normalizer.normalize(&event);
        let second = normalizer.normalize(&event);
        assert_eq!(first, second);
        assert_eq!(first.map(|k| k.to_string()), Some("2024-12-31".to_string()));
    }
}
