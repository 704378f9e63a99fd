use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tracing::{info, warn};

use crate::date_key::ViewerZone;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub general: GeneralConfig,
    pub gateway: GatewayConfig,
    pub auth: AuthConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level
    pub log_level: String,
    /// "local" or an IANA zone name; decides which calendar day an instant falls on
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Host serving the auth and calendar handlers
    pub base_url: String,
    pub auth_path: String,
    pub events_path: String,
    /// Development stand-in that returns canned events without a token
    pub mock_events_path: String,
    pub use_mock: bool,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// How often to check whether the authorization window closed
    pub poll_interval_ms: u64,
    /// Upper bound on the whole interactive flow
    pub max_wait_secs: u64,
    /// Overrides the default token location under the data dir
    pub token_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub max_events_per_cell: usize,
    pub title_max_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig {
                log_level: "info".to_string(),
                timezone: "local".to_string(),
            },
            gateway: GatewayConfig {
                base_url: "http://localhost:3000".to_string(),
                auth_path: "/api/auth/google".to_string(),
                events_path: "/api/calendar/events".to_string(),
                mock_events_path: "/api/calendar/simple".to_string(),
                use_mock: false,
                request_timeout_secs: 30,
            },
            auth: AuthConfig {
                poll_interval_ms: 1000,
                max_wait_secs: 300,
                token_file: None,
            },
            display: DisplayConfig {
                max_events_per_cell: 2,
                title_max_chars: 12,
            },
        }
    }
}

impl Config {
    pub async fn load() -> Result<Config> {
        let config_path = Self::get_config_path()?;

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .await
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            toml::from_str(&content).with_context(|| "Failed to parse config file")
        } else {
            info!("Config file not found, creating default configuration");
            let default_config = Config::default();
            default_config.save().await?;
            Ok(default_config)
        }
    }

    pub async fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, content)
            .await
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        info!("Configuration saved to {:?}", config_path);
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("gridcal");

        Ok(config_dir.join("config.toml"))
    }

    pub fn get_data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
            .context("Failed to get data directory")?
            .join("gridcal");

        Ok(data_dir)
    }

    pub fn get_token_path(&self) -> Result<PathBuf> {
        match &self.auth.token_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::get_data_dir()?.join("access_token")),
        }
    }

    /// Get the viewer's zone, falling back to the system zone if the name is invalid
    pub fn viewer_zone(&self) -> ViewerZone {
        let name = self.general.timezone.trim();
        if name.is_empty() || name.eq_ignore_ascii_case("local") {
            return ViewerZone::Local;
        }
        match name.parse::<chrono_tz::Tz>() {
            Ok(tz) => ViewerZone::Named(tz),
            Err(e) => {
                warn!("Invalid timezone '{}' ({}), using system local time", name, e);
                ViewerZone::Local
            }
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.auth.poll_interval_ms.max(1))
    }

    pub fn max_auth_wait(&self) -> Duration {
        Duration::from_secs(self.auth.max_wait_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed.gateway.events_path, "/api/calendar/events");
        assert_eq!(parsed.auth.poll_interval_ms, 1000);
        assert_eq!(parsed.display.max_events_per_cell, 2);
        assert!(parsed.auth.token_file.is_none());
    }

    #[test]
    fn test_viewer_zone_resolution() {
        let mut config = Config::default();
        assert_eq!(config.viewer_zone(), ViewerZone::Local);

        config.general.timezone = "America/Detroit".to_string();
        assert_eq!(config.viewer_zone(), ViewerZone::Named(chrono_tz::America::Detroit));

        config.general.timezone = "Not/AZone".to_string();
        assert_eq!(config.viewer_zone(), ViewerZone::Local);
    }

    #[test]
    fn test_token_path_override() {
        let mut config = Config::default();
        config.auth.token_file = Some(PathBuf::from("/tmp/gridcal-token"));
        assert_eq!(config.get_token_path().unwrap(), PathBuf::from("/tmp/gridcal-token"));
    }
}
