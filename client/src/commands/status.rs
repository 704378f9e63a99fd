use anyhow::Result;
use async_trait::async_trait;

use crate::session::SessionState;
use super::{Command, CommandContext};

/// Command to show session and gateway settings
pub struct StatusCommand;

#[async_trait]
impl Command for StatusCommand {
    async fn execute(&mut self, context: &CommandContext) -> Result<()> {
        let state = context.session.state();
        let icon = match state {
            SessionState::SignedIn => "✅",
            SessionState::Authenticating => "⏳",
            SessionState::Expired => "⚠️ ",
            SessionState::SignedOut => "❌",
        };

        println!("Calendar client status");
        println!("======================");
        println!("Session:     {} {:?}", icon, state);
        println!("Token file:  {}", context.token_path.display());
        println!("Gateway:     {}", context.config.gateway.base_url);
        println!(
            "Source:      {}",
            if context.config.gateway.use_mock { "mock events" } else { "live events" }
        );
        println!("Timezone:    {}", context.config.general.timezone);
        Ok(())
    }
}
