use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::binder::EventIndex;
use crate::date_key::DateKeyNormalizer;
use crate::errors::CalendarResult;
use crate::event::CalendarEvent;
use crate::gateway::EventsGateway;
use crate::grid::{build_grid, MonthGrid, MonthView};
use crate::session::SessionManager;

/// Message the UI should show above the grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Session is gone; offer to reconnect
    Reconnect(String),
    /// Something went wrong but the last grid is still valid
    Error(String),
}

/// Identifies one fetch. Results carrying an outdated generation are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    month: MonthView,
}

impl FetchTicket {
    pub fn month(&self) -> MonthView {
        self.month
    }
}

/// State behind the month view: which month, which day is selected, and the
/// events from the most recent fetch that was allowed to land.
pub struct CalendarView {
    normalizer: DateKeyNormalizer,
    month: MonthView,
    today: NaiveDate,
    selected: Option<NaiveDate>,
    index: EventIndex,
    grid: MonthGrid,
    generation: u64,
    notice: Option<Notice>,
}

impl CalendarView {
    pub fn new(normalizer: DateKeyNormalizer, month: MonthView, today: NaiveDate) -> Self {
        let index = EventIndex::empty();
        let grid = index.bind(&build_grid(month, today, None));
        Self {
            normalizer,
            month,
            today,
            selected: None,
            index,
            grid,
            generation: 0,
            notice: None,
        }
    }

    /// View of the month containing today, in the normalizer's zone
    pub fn current(normalizer: DateKeyNormalizer) -> Self {
        let today = normalizer.zone().today();
        Self::new(normalizer, MonthView::containing(today), today)
    }

    pub fn month(&self) -> MonthView {
        self.month
    }

    pub fn grid(&self) -> &MonthGrid {
        &self.grid
    }

    pub fn selected(&self) -> Option<NaiveDate> {
        self.selected
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn events(&self) -> &EventIndex {
        &self.index
    }

    pub fn normalizer(&self) -> &DateKeyNormalizer {
        &self.normalizer
    }

    fn rebuild(&mut self) {
        self.grid = self
            .index
            .bind(&build_grid(self.month, self.today, self.selected));
    }

    /// Switch months; anything still in flight for the old month is ignored
    pub fn go_to(&mut self, month: MonthView) {
        self.month = month;
        self.generation += 1;
        self.rebuild();
        debug!("Viewing {}", month.title());
    }

    pub fn previous_month(&mut self) {
        self.go_to(self.month.previous());
    }

    pub fn next_month(&mut self) {
        self.go_to(self.month.next());
    }

    /// Select a day and return its events, read from the same binding the grid shows
    pub fn select_date(&mut self, date: NaiveDate) -> Vec<CalendarEvent> {
        self.selected = Some(date);
        for cell in &mut self.grid.cells {
            cell.is_selected = cell.date == date;
        }
        match self.grid.cell(date) {
            Some(cell) => cell.events.clone(),
            None => self.index.events_on(date),
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        for cell in &mut self.grid.cells {
            cell.is_selected = false;
        }
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        FetchTicket {
            generation: self.generation,
            month: self.month,
        }
    }

    /// Apply a fetch result. Returns false when the result was stale and dropped.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, result: CalendarResult<Vec<CalendarEvent>>) -> bool {
        if ticket.generation != self.generation {
            debug!(
                "Discarding stale fetch for {} (generation {} < {})",
                ticket.month, ticket.generation, self.generation
            );
            return false;
        }

        match result {
            Ok(events) => {
                self.index = EventIndex::new(events, &self.normalizer);
                self.notice = None;
                info!("Loaded {} events into {}", self.index.len(), self.month.title());
            }
            Err(e) if e.requires_reconnect() => {
                self.index = EventIndex::empty();
                self.notice = Some(Notice::Reconnect(e.user_message()));
                warn!("Calendar needs reconnecting: {}", e);
            }
            Err(e) => {
                // Keep the last good binding
                self.notice = Some(Notice::Error(e.user_message()));
                warn!("Failed to load calendar events: {}", e);
                return true;
            }
        }
        self.rebuild();
        true
    }

    /// Fetch through the session and apply the result
    pub async fn refresh(&mut self, session: &SessionManager, gateway: &dyn EventsGateway) -> bool {
        let ticket = self.begin_fetch();
        let result = session.fetch_events(gateway).await;
        self.complete_fetch(ticket, result)
    }

    /// Drop everything fetched under the old session
    pub fn on_signed_out(&mut self) {
        self.generation += 1;
        self.index = EventIndex::empty();
        self.notice = None;
        self.rebuild();
    }
}
