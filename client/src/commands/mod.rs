use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::date_key::DateKeyNormalizer;
use crate::formatters::TerminalFormatter;
use crate::gateway::EventsGateway;
use crate::session::SessionManager;
use crate::token_store::TokenStore;

pub mod auth;
pub mod calendar;
pub mod status;

/// Trait for all command implementations
#[async_trait]
pub trait Command {
    /// Execute the command with the provided context
    async fn execute(&mut self, context: &CommandContext) -> Result<()>;
}

/// Shared context for all commands. Holds the one session for the process.
pub struct CommandContext {
    pub config: Config,
    pub session: Arc<SessionManager>,
    pub gateway: Arc<dyn EventsGateway>,
    pub token_store: Arc<dyn TokenStore>,
    pub token_path: PathBuf,
    pub use_colors: bool,
}

impl CommandContext {
    pub fn new(
        config: Config,
        session: Arc<SessionManager>,
        gateway: Arc<dyn EventsGateway>,
        token_store: Arc<dyn TokenStore>,
        token_path: PathBuf,
        use_colors: bool,
    ) -> Self {
        Self {
            config,
            session,
            gateway,
            token_store,
            token_path,
            use_colors,
        }
    }

    pub fn normalizer(&self) -> DateKeyNormalizer {
        DateKeyNormalizer::new(self.config.viewer_zone())
    }

    pub fn formatter(&self) -> TerminalFormatter {
        TerminalFormatter::new(&self.config.display, self.config.viewer_zone(), self.use_colors)
    }
}
