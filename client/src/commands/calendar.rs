use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::info;

use crate::calendar_view::CalendarView;
use crate::grid::MonthView;
use crate::session::DEFAULT_UPCOMING_LIMIT;
use super::{Command, CommandContext};

/// Command to print a month grid, optionally with one day's details
pub struct MonthCommand {
    pub month: Option<MonthView>,
    pub select: Option<NaiveDate>,
}

/// Command to print one day's events
pub struct DayCommand {
    pub date: NaiveDate,
}

/// Command to list today's events
pub struct TodayCommand;

/// Command to list the next few events
pub struct UpcomingCommand {
    pub max_results: usize,
}

impl Default for UpcomingCommand {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_UPCOMING_LIMIT,
        }
    }
}

async fn load_view(context: &CommandContext, month: Option<MonthView>) -> CalendarView {
    let mut view = CalendarView::current(context.normalizer());
    if let Some(month) = month {
        view.go_to(month);
    }

    if !context.session.is_signed_in() && context.gateway.requires_token() {
        info!("Not authenticated - showing empty calendar");
    }
    view.refresh(&context.session, context.gateway.as_ref()).await;
    view
}

#[async_trait]
impl Command for MonthCommand {
    async fn execute(&mut self, context: &CommandContext) -> Result<()> {
        let month = self.month.or_else(|| self.select.map(MonthView::containing));
        let mut view = load_view(context, month).await;
        let formatter = context.formatter();

        let selected_events = self.select.map(|date| (date, view.select_date(date)));

        println!("{}", formatter.format_month(view.grid(), view.notice()));

        if let Some((date, events)) = selected_events {
            println!("{}", formatter.format_day(date, &events));
        }

        let excluded = view.events().excluded();
        if excluded > 0 {
            info!("{} events had no usable start time and were left off the grid", excluded);
        }

        Ok(())
    }
}

#[async_trait]
impl Command for DayCommand {
    async fn execute(&mut self, context: &CommandContext) -> Result<()> {
        let mut view = load_view(context, Some(MonthView::containing(self.date))).await;
        let events = view.select_date(self.date);
        let formatter = context.formatter();

        if let Some(notice) = view.notice() {
            println!("{}", formatter.format_month(view.grid(), Some(notice)));
        }
        println!("{}", formatter.format_day(self.date, &events));
        Ok(())
    }
}

#[async_trait]
impl Command for TodayCommand {
    async fn execute(&mut self, context: &CommandContext) -> Result<()> {
        let normalizer = context.normalizer();
        let formatter = context.formatter();

        match context
            .session
            .today_events(context.gateway.as_ref(), &normalizer)
            .await
        {
            Ok(events) => println!("{}", formatter.format_list("📅 Today", &events)),
            Err(e) => println!("🔐 {}", e.user_message()),
        }
        Ok(())
    }
}

#[async_trait]
impl Command for UpcomingCommand {
    async fn execute(&mut self, context: &CommandContext) -> Result<()> {
        let formatter = context.formatter();

        match context
            .session
            .upcoming_events(context.gateway.as_ref(), self.max_results)
            .await
        {
            Ok(events) => println!("{}", formatter.format_list("📅 Upcoming", &events)),
            Err(e) => println!("❌ {}", e.user_message()),
        }
        Ok(())
    }
}
