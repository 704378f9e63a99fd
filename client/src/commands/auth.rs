use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::calendar_view::CalendarView;
use crate::flow::ConsoleFlow;
use super::{Command, CommandContext};

/// Command to connect a calendar through the interactive authorization flow
pub struct ConnectCommand;

/// Command to forget the stored token
pub struct SignOutCommand;

#[async_trait]
impl Command for ConnectCommand {
    async fn execute(&mut self, context: &CommandContext) -> Result<()> {
        if context.session.is_signed_in() {
            println!("✅ Already connected");
            println!("💡 Run 'gridcal sign-out' first to connect a different account");
            return Ok(());
        }

        info!("Setting up calendar authentication...");
        println!("🔐 Calendar authentication required");

        let flow = ConsoleFlow::new(context.gateway.clone(), context.token_store.clone());
        let cancel = CancellationToken::new();

        // Ctrl-C abandons the wait instead of killing the process mid-write
        let ctrl_c = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    debug!("Interrupt received, cancelling authentication");
                    cancel.cancel();
                }
            })
        };

        let result = context
            .session
            .authenticate(context.gateway.as_ref(), &flow, &cancel)
            .await;
        ctrl_c.abort();

        match result {
            Ok(()) => {
                println!("✅ Calendar connected!");
                println!("🔄 Loading events...");

                let mut view = CalendarView::current(context.normalizer());
                view.refresh(&context.session, context.gateway.as_ref()).await;
                match view.notice() {
                    None => println!("📅 Loaded {} events", view.events().len()),
                    Some(_) => println!(
                        "{}",
                        context.formatter().format_month(view.grid(), view.notice())
                    ),
                }
            }
            Err(e) => {
                println!("❌ {}", e.user_message());
                println!("   ({})", e);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Command for SignOutCommand {
    async fn execute(&mut self, context: &CommandContext) -> Result<()> {
        context
            .session
            .sign_out()
            .context("Failed to clear the stored token")?;
        println!("👋 Signed out; removed {}", context.token_path.display());
        Ok(())
    }
}
