use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gridcal_client::commands::{
    auth::{ConnectCommand, SignOutCommand},
    calendar::{DayCommand, MonthCommand, TodayCommand, UpcomingCommand},
    status::StatusCommand,
    Command, CommandContext,
};
use gridcal_client::config::Config;
use gridcal_client::gateway::{EventsGateway, HttpEventsGateway};
use gridcal_client::grid::MonthView;
use gridcal_client::session::{SessionManager, DEFAULT_UPCOMING_LIMIT};
use gridcal_client::token_store::{FileTokenStore, TokenStore};

#[derive(Parser)]
#[command(name = "gridcal")]
#[command(about = "Month calendar backed by your hosted calendar events")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Read canned events from the development endpoint
    #[arg(long)]
    mock: bool,

    /// Disable ANSI colors
    #[arg(long)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a month grid
    Month {
        /// Month to show, as YYYY-MM (defaults to the current month)
        #[arg(long)]
        month: Option<String>,
        /// Day to open, as YYYY-MM-DD
        #[arg(long)]
        select: Option<String>,
    },
    /// Show the events of one day
    Day {
        /// Date as YYYY-MM-DD
        date: String,
    },
    /// List today's events
    Today,
    /// List the next few events
    Upcoming {
        #[arg(long, default_value_t = DEFAULT_UPCOMING_LIMIT)]
        max: usize,
    },
    /// Connect your calendar
    Connect,
    /// Forget the stored access token
    SignOut,
    /// Show session status
    Status,
}

fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", text))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()
        .await
        .context("Failed to load application configuration")?;
    if cli.mock {
        config.gateway.use_mock = true;
    }

    // Initialize logging; stdout is reserved for the calendar itself
    let log_level = if cli.debug {
        "debug".to_string()
    } else {
        config.general.log_level.clone()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("gridcal_client={},gridcal={}", log_level, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Configuration loaded successfully");

    let token_path = config.get_token_path()?;
    let token_store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(token_path.clone()));

    let session = SessionManager::open(token_store.clone())
        .context("Failed to read the stored access token")?
        .with_poll_interval(config.poll_interval())
        .with_max_wait(config.max_auth_wait());

    let gateway: Arc<dyn EventsGateway> = Arc::new(
        HttpEventsGateway::new(config.gateway.clone(), config.request_timeout())
            .context("Failed to build HTTP client")?,
    );

    let context = CommandContext::new(
        config,
        Arc::new(session),
        gateway,
        token_store,
        token_path,
        !cli.no_color,
    );

    let mut command: Box<dyn Command + Send> = match cli.command.unwrap_or(Commands::Month {
        month: None,
        select: None,
    }) {
        Commands::Month { month, select } => Box::new(MonthCommand {
            month: month.as_deref().map(MonthView::parse).transpose()?,
            select: select.as_deref().map(parse_date).transpose()?,
        }),
        Commands::Day { date } => Box::new(DayCommand {
            date: parse_date(&date)?,
        }),
        Commands::Today => Box::new(TodayCommand),
        Commands::Upcoming { max } => Box::new(UpcomingCommand { max_results: max }),
        Commands::Connect => Box::new(ConnectCommand),
        Commands::SignOut => Box::new(SignOutCommand),
        Commands::Status => Box::new(StatusCommand),
    };

    command
        .execute(&context)
        .await
        .context("Failed to execute command")?;

    Ok(())
}
