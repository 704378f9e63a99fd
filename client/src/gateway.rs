use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::GatewayConfig;
use crate::errors::{CalendarError, CalendarResult};
use crate::event::CalendarEvent;
use crate::http_utils::{check_gateway_response, parse_json_response};
use crate::wire::{AuthUrlResponse, EventsResponse, TokenExchange, TokenExchangeRequest};

/// Call surface of the hosting handlers. No retries happen at this layer;
/// every failure is terminal for the call that hit it.
#[async_trait]
pub trait EventsGateway: Send + Sync {
    /// Where to send the user to grant access
    async fn authorization_url(&self) -> CalendarResult<String>;

    /// Trade an authorization code for provider tokens
    async fn exchange_code(&self, code: &str) -> CalendarResult<TokenExchange>;

    /// Fetch events, already adapted into one shape
    async fn get_events(&self, access_token: &str) -> CalendarResult<Vec<CalendarEvent>>;

    /// False for sources that answer without a bearer token
    fn requires_token(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    Live,
    Mock,
}

pub struct HttpEventsGateway {
    config: GatewayConfig,
    source: EventSource,
    http_client: reqwest::Client,
}

impl HttpEventsGateway {
    pub fn new(config: GatewayConfig, timeout: Duration) -> CalendarResult<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        let source = if config.use_mock {
            EventSource::Mock
        } else {
            EventSource::Live
        };

        Ok(Self {
            config,
            source,
            http_client,
        })
    }

    pub fn source(&self) -> EventSource {
        self.source
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl EventsGateway for HttpEventsGateway {
    async fn authorization_url(&self) -> CalendarResult<String> {
        let response = self
            .http_client
            .get(self.url(&self.config.auth_path))
            .send()
            .await?;

        let response = check_gateway_response(response, "Authorization URL request").await?;
        let body: AuthUrlResponse = parse_json_response(response, "authorization URL response").await?;
        if body.auth_url.is_empty() {
            return Err(CalendarError::transport("Authorization URL response was empty"));
        }
        Ok(body.auth_url)
    }

    async fn exchange_code(&self, code: &str) -> CalendarResult<TokenExchange> {
        debug!("Exchanging authorization code (length {})", code.len());
        let response = self
            .http_client
            .post(self.url(&self.config.auth_path))
            .json(&TokenExchangeRequest { code })
            .send()
            .await?;

        let response = match check_gateway_response(response, "Token exchange").await {
            // A 401 here is a rejected code, not an expired session
            Err(CalendarError::AuthExpired) => return Err(CalendarError::AuthFailed),
            other => other?,
        };
        parse_json_response(response, "token exchange response").await
    }

    async fn get_events(&self, access_token: &str) -> CalendarResult<Vec<CalendarEvent>> {
        let request = match self.source {
            EventSource::Live => self
                .http_client
                .get(self.url(&self.config.events_path))
                .query(&[("accessToken", access_token)]),
            EventSource::Mock => self.http_client.get(self.url(&self.config.mock_events_path)),
        };

        let response = request.send().await?;
        let response = check_gateway_response(response, "Events fetch").await?;
        let body: EventsResponse = parse_json_response(response, "events response").await?;

        let shape = body.shape();
        let events = body.into_events();
        info!("Fetched {} events ({} response)", events.len(), shape);
        Ok(events)
    }

    fn requires_token(&self) -> bool {
        self.source == EventSource::Live
    }
}
