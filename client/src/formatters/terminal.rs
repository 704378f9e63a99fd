use chrono::NaiveDate;

use crate::calendar_view::Notice;
use crate::config::DisplayConfig;
use crate::date_key::ViewerZone;
use crate::event::{CalendarEvent, EventTime};
use crate::grid::{weekday_labels, GridCell, MonthGrid};

/// What a cell shows: the first few titles plus how many were left out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellPreview {
    pub titles: Vec<String>,
    pub overflow: usize,
}

/// Terminal formatter for the month grid and day details, with color support
pub struct TerminalFormatter {
    pub use_colors: bool,
    max_events_per_cell: usize,
    title_max_chars: usize,
    zone: ViewerZone,
}

impl TerminalFormatter {
    pub fn new(display: &DisplayConfig, zone: ViewerZone, use_colors: bool) -> Self {
        Self {
            use_colors,
            max_events_per_cell: display.max_events_per_cell,
            title_max_chars: display.title_max_chars.max(1),
            zone,
        }
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            match color {
                "red" => format!("\x1b[31m{}\x1b[0m", text),
                "orange" => format!("\x1b[33m{}\x1b[0m", text),
                "blue" => format!("\x1b[34m{}\x1b[0m", text),
                "gray" => format!("\x1b[90m{}\x1b[0m", text),
                "green" => format!("\x1b[32m{}\x1b[0m", text),
                "bold" => format!("\x1b[1m{}\x1b[0m", text),
                "inverse" => format!("\x1b[7m{}\x1b[0m", text),
                _ => text.to_string(),
            }
        } else {
            text.to_string()
        }
    }

    fn cell_width(&self) -> usize {
        self.title_max_chars + 3
    }

    /// Preview of a cell's bound events; the cell itself is left alone
    pub fn cell_preview(&self, cell: &GridCell) -> CellPreview {
        let titles = cell
            .events
            .iter()
            .take(self.max_events_per_cell)
            .map(|event| truncate_title(&event.title, self.title_max_chars))
            .collect();

        CellPreview {
            titles,
            overflow: cell.events.len().saturating_sub(self.max_events_per_cell),
        }
    }

    pub fn format_month(&self, grid: &MonthGrid, notice: Option<&Notice>) -> String {
        let width = self.cell_width();
        let mut output = String::new();

        output.push_str(&self.colorize(&format!("📅 {}", grid.month.title()), "bold"));
        output.push('\n');

        if let Some(notice) = notice {
            let line = match notice {
                Notice::Reconnect(message) => self.colorize(&format!("🔐 {}", message), "orange"),
                Notice::Error(message) => self.colorize(&format!("❌ {}", message), "red"),
            };
            output.push_str(&line);
            output.push('\n');
        }
        output.push('\n');

        let header: Vec<String> = weekday_labels()
            .iter()
            .map(|label| format!("{:<width$}", label, width = width))
            .collect();
        output.push_str(&self.colorize(header.join(" ").trim_end(), "bold"));
        output.push('\n');

        for week in grid.weeks() {
            let previews: Vec<CellPreview> = week.iter().map(|cell| self.cell_preview(cell)).collect();

            let numbers: Vec<String> = week.iter().map(|cell| self.day_label(cell, width)).collect();
            output.push_str(numbers.join(" ").trim_end());
            output.push('\n');

            for line in 0..=self.max_events_per_cell {
                let row: Vec<String> = previews
                    .iter()
                    .map(|preview| {
                        let text = if line < preview.titles.len() {
                            preview.titles[line].clone()
                        } else if line == preview.titles.len() && preview.overflow > 0 {
                            format!("+{} more", preview.overflow)
                        } else {
                            String::new()
                        };
                        format!("{:<width$}", text, width = width)
                    })
                    .collect();
                let row = row.join(" ");
                if !row.trim().is_empty() {
                    output.push_str(&self.colorize(row.trim_end(), "blue"));
                    output.push('\n');
                }
            }
        }

        output
    }

    fn day_label(&self, cell: &GridCell, width: usize) -> String {
        let marker = if cell.is_selected {
            format!("[{}]", cell.day_of_month)
        } else if cell.is_today {
            format!("*{}", cell.day_of_month)
        } else {
            cell.day_of_month.to_string()
        };
        let padded = format!("{:<width$}", marker, width = width);

        if cell.is_today {
            self.colorize(&padded, "green")
        } else if !cell.is_current_month {
            self.colorize(&padded, "gray")
        } else {
            padded
        }
    }

    /// Detail view for a selected day
    pub fn format_day(&self, date: NaiveDate, events: &[CalendarEvent]) -> String {
        let mut output = String::new();
        output.push_str(&self.colorize(
            &format!("Events for {}", date.format("%A, %B %-d")),
            "bold",
        ));
        output.push('\n');

        if events.is_empty() {
            output.push_str(&self.colorize("No events", "gray"));
            output.push('\n');
            return output;
        }

        output.push('\n');
        for event in events {
            output.push_str(&self.format_event(event));
        }
        output
    }

    /// Flat list, used for today's and upcoming events
    pub fn format_list(&self, heading: &str, events: &[CalendarEvent]) -> String {
        let mut output = String::new();
        output.push_str(&self.colorize(heading, "bold"));
        output.push('\n');

        if events.is_empty() {
            output.push_str(&self.colorize("No events", "gray"));
            output.push('\n');
            return output;
        }

        output.push('\n');
        for event in events {
            if let Some(day) = self.start_day_label(event) {
                output.push_str(&self.colorize(&day, "gray"));
                output.push('\n');
            }
            output.push_str(&self.format_event(event));
        }
        output
    }

    fn start_day_label(&self, event: &CalendarEvent) -> Option<String> {
        if let Some(start) = event.start_instant() {
            return Some(self.zone.format(&start, "%a %b %-d"));
        }
        // All-day events carry a date literal, which is shown as-is
        match &event.start {
            Some(EventTime::Date(text)) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
                .ok()
                .map(|date| date.format("%a %b %-d").to_string()),
            _ => None,
        }
    }

    fn format_event(&self, event: &CalendarEvent) -> String {
        let mut output = String::new();
        output.push_str(&self.colorize(&event.title, "bold"));
        output.push('\n');
        output.push_str(&format!("   🕐 {}\n", self.time_range(event)));

        if !event.description.is_empty() {
            output.push_str(&format!("   {}\n", event.description));
        }
        if !event.location.is_empty() {
            output.push_str(&format!("   📍 {}\n", event.location));
        }
        if !event.attendees.is_empty() {
            let names: Vec<&str> = event.attendees.iter().map(|a| a.display_name()).collect();
            output.push_str(&format!("   With: {}\n", names.join(", ")));
        }
        output.push('\n');
        output
    }

    fn time_range(&self, event: &CalendarEvent) -> String {
        if event.is_all_day {
            return "All day".to_string();
        }
        match (event.start_instant(), event.end_instant()) {
            (Some(start), Some(end)) => format!(
                "{} - {}",
                self.zone.format(&start, "%-I:%M %p"),
                self.zone.format(&end, "%-I:%M %p")
            ),
            (Some(start), None) => self.zone.format(&start, "%-I:%M %p"),
            _ => "Time unknown".to_string(),
        }
    }
}

/// Cut a title to `max_chars` characters, marking the cut with "..."
pub fn truncate_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() > max_chars {
        let kept: String = title.chars().take(max_chars).collect();
        format!("{}...", kept)
    } else {
        title.to_string()
    }
}
