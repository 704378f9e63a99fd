//! The 6x7 month grid.

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::Serialize;
use std::fmt;

use crate::errors::{CalendarError, CalendarResult};
use crate::event::CalendarEvent;

/// Six weeks always cover 31 days plus up to 6 leading spillover days
pub const GRID_CELLS: usize = 42;

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// Supported year range; a grid never spills out of chrono's date range
pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub fn weekday_labels() -> [&'static str; 7] {
    WEEKDAY_LABELS
}

/// A calendar month, always anchored on its first day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MonthView {
    first: NaiveDate,
}

impl MonthView {
    pub fn new(year: i32, month: u32) -> CalendarResult<Self> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(CalendarError::Parsing {
                format: "month".to_string(),
                message: format!("year {} is outside {}..={}", year, MIN_YEAR, MAX_YEAR),
            });
        }
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first| Self { first })
            .ok_or_else(|| CalendarError::Parsing {
                format: "month".to_string(),
                message: format!("{}-{:02} is not a valid month", year, month),
            })
    }

    /// Month holding `date`, clamped to the supported year range
    pub fn containing(date: NaiveDate) -> Self {
        let (year, month) = if date.year() > MAX_YEAR {
            (MAX_YEAR, 12)
        } else if date.year() < MIN_YEAR {
            (MIN_YEAR, 1)
        } else {
            (date.year(), date.month())
        };
        Self {
            first: NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date),
        }
    }

    /// Parse `YYYY-MM`
    pub fn parse(text: &str) -> CalendarResult<Self> {
        let first = NaiveDate::parse_from_str(&format!("{}-01", text.trim()), "%Y-%m-%d")
            .map_err(|e| CalendarError::Parsing {
                format: "month".to_string(),
                message: format!("'{}': {}", text, e),
            })?;
        Self::new(first.year(), first.month())
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    /// Previous month; stays put at the start of the supported range
    pub fn previous(&self) -> Self {
        self.step(self.first.checked_sub_months(Months::new(1)))
    }

    /// Next month; stays put at the end of the supported range
    pub fn next(&self) -> Self {
        self.step(self.first.checked_add_months(Months::new(1)))
    }

    fn step(&self, candidate: Option<NaiveDate>) -> Self {
        match candidate {
            Some(first) if (MIN_YEAR..=MAX_YEAR).contains(&first.year()) => Self { first },
            _ => *self,
        }
    }

    pub fn days_in_month(&self) -> u32 {
        let next = self.next().first;
        if next == self.first {
            // December of the last supported year
            return 31;
        }
        next.signed_duration_since(self.first).num_days() as u32
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    /// e.g. "March 2024"
    pub fn title(&self) -> String {
        format!("{} {}", MONTH_NAMES[self.first.month0() as usize], self.year())
    }
}

impl fmt::Display for MonthView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year(), self.month())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridCell {
    pub date: NaiveDate,
    pub day_of_month: u32,
    pub is_current_month: bool,
    pub is_today: bool,
    pub is_selected: bool,
    pub events: Vec<CalendarEvent>,
}

impl GridCell {
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthGrid {
    pub month: MonthView,
    pub cells: Vec<GridCell>,
}

impl MonthGrid {
    pub fn start(&self) -> NaiveDate {
        self.cells[0].date
    }

    pub fn end(&self) -> NaiveDate {
        self.cells[GRID_CELLS - 1].date
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&GridCell> {
        let offset = date.signed_duration_since(self.start()).num_days();
        if (0..GRID_CELLS as i64).contains(&offset) {
            self.cells.get(offset as usize)
        } else {
            None
        }
    }

    pub fn weeks(&self) -> impl Iterator<Item = &[GridCell]> {
        self.cells.chunks(7)
    }
}

/// Sunday on or before the first of the month
pub fn grid_start(month: MonthView) -> NaiveDate {
    let first = month.first_day();
    let back = first.weekday().num_days_from_sunday() as i64;
    first - Duration::days(back)
}

/// Lay out 42 consecutive days starting on the Sunday on or before the 1st.
/// Cells come back with empty event lists; binding is a separate step.
pub fn build_grid(month: MonthView, today: NaiveDate, selected: Option<NaiveDate>) -> MonthGrid {
    let start = grid_start(month);

    let cells = (0..GRID_CELLS as i64)
        .map(|offset| {
            let date = start + Duration::days(offset);
            GridCell {
                date,
                day_of_month: date.day(),
                is_current_month: month.contains(date),
                is_today: date == today,
                is_selected: selected == Some(date),
                events: Vec::new(),
            }
        })
        .collect();

    MonthGrid { month, cells }
}
