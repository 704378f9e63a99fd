//! Month calendar client: a 6x7 day grid bound to events from a hosted
//! calendar gateway, plus the authentication session used to fetch them.

pub mod binder;
pub mod calendar_view;
pub mod commands;
pub mod config;
pub mod date_key;
pub mod errors;
pub mod event;
pub mod flow;
pub mod formatters;
pub mod gateway;
pub mod grid;
pub mod http_utils;
pub mod session;
pub mod token_store;
pub mod wire;

pub use binder::EventIndex;
pub use calendar_view::{CalendarView, FetchTicket, Notice};
pub use date_key::{DateKey, DateKeyNormalizer, ViewerZone};
pub use errors::{CalendarError, CalendarResult};
pub use event::{Attendee, CalendarEvent, EventTime};
pub use gateway::{EventsGateway, HttpEventsGateway};
pub use grid::{build_grid, GridCell, MonthGrid, MonthView, GRID_CELLS};
pub use session::{SessionManager, SessionState};
