use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

use crate::date_key::{DateKey, DateKeyNormalizer};
use crate::event::CalendarEvent;
use crate::grid::MonthGrid;

/// Events from one fetch, grouped by the day they start on.
/// Both the grid and day selection read through this index.
#[derive(Debug, Clone, Default)]
pub struct EventIndex {
    events: Vec<CalendarEvent>,
    by_day: BTreeMap<DateKey, Vec<usize>>,
    excluded: usize,
}

impl EventIndex {
    pub fn new(events: Vec<CalendarEvent>, normalizer: &DateKeyNormalizer) -> Self {
        let mut by_day: BTreeMap<DateKey, Vec<usize>> = BTreeMap::new();
        let mut excluded = 0;

        for (position, event) in events.iter().enumerate() {
            match normalizer.try_normalize(event) {
                Ok(key) => by_day.entry(key).or_default().push(position),
                Err(e) => {
                    debug!("Excluding event from grid: {}", e);
                    excluded += 1;
                }
            }
        }

        debug!(
            "Indexed {} events across {} days ({} excluded)",
            events.len() - excluded,
            by_day.len(),
            excluded
        );

        Self {
            events,
            by_day,
            excluded,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of events that normalized to no day
    pub fn excluded(&self) -> usize {
        self.excluded
    }

    /// Everything from the fetch in provider order, placed or not
    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    /// Events starting on `date`, in fetch order
    pub fn events_on(&self, date: NaiveDate) -> Vec<CalendarEvent> {
        self.by_day
            .get(&DateKey::new(date))
            .map(|positions| positions.iter().map(|&i| self.events[i].clone()).collect())
            .unwrap_or_default()
    }

    /// Replace every cell's events with this index's events for that day
    pub fn bind(&self, grid: &MonthGrid) -> MonthGrid {
        let mut bound = grid.clone();
        for cell in &mut bound.cells {
            cell.events = self.events_on(cell.date);
        }
        bound
    }
}
