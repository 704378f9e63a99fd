//! Authentication session: the one owner of the stored bearer token.
//!
//! ```text
//! SignedOut --authenticate()--> Authenticating --token stored--> SignedIn
//!                                     |--no token / timeout / cancel--> SignedOut
//! SignedIn --fetch answers 401--> Expired (token cleared)
//! SignedIn | Expired --sign_out()--> SignedOut
//! ```

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::date_key::DateKeyNormalizer;
use crate::errors::{CalendarError, CalendarResult};
use crate::event::CalendarEvent;
use crate::flow::{FlowWindow, InteractiveFlow};
use crate::gateway::EventsGateway;
use crate::token_store::TokenStore;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(300);
pub const DEFAULT_UPCOMING_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    SignedOut,
    Authenticating,
    SignedIn,
    Expired,
}

#[derive(Debug)]
struct SessionInner {
    token: Option<String>,
    state: SessionState,
}

pub struct SessionManager {
    store: Arc<dyn TokenStore>,
    inner: RwLock<SessionInner>,
    poll_interval: Duration,
    max_wait: Duration,
}

/// Puts the session back to SignedOut if an authentication attempt is dropped
/// before it reaches a verdict.
struct AttemptGuard<'a> {
    session: &'a SessionManager,
    settled: bool,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let mut inner = self.session.inner.write();
            if inner.state == SessionState::Authenticating {
                debug!("Authentication attempt abandoned");
                inner.state = SessionState::SignedOut;
            }
        }
    }
}

impl SessionManager {
    /// Read the persisted token once and derive the starting state from it
    pub fn open(store: Arc<dyn TokenStore>) -> CalendarResult<Self> {
        let token = store.load()?;
        let state = if token.is_some() {
            SessionState::SignedIn
        } else {
            SessionState::SignedOut
        };
        info!("Session opened: has_token={}, state={:?}", token.is_some(), state);

        Ok(Self {
            store,
            inner: RwLock::new(SessionInner { token, state }),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
        })
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn state(&self) -> SessionState {
        self.inner.read().state
    }

    /// Cached answer only; the provider may still reject the token on the next fetch
    pub fn is_signed_in(&self) -> bool {
        self.inner.read().state == SessionState::SignedIn
    }

    /// The only sanctioned way to read the stored token
    pub fn token(&self) -> Option<String> {
        self.inner.read().token.clone()
    }

    /// Drive the interactive flow until its window closes, then look for a token.
    ///
    /// Polls the window every `poll_interval`, gives up after `max_wait` with
    /// `AuthTimeout`, and stops early with `AuthCancelled` when `cancel` fires.
    /// A concurrent call is rejected with `AuthInProgress`. A `sign_out()` made
    /// while the window is open wins, and the attempt ends in `AuthCancelled`.
    pub async fn authenticate(
        &self,
        gateway: &dyn EventsGateway,
        flow: &dyn InteractiveFlow,
        cancel: &CancellationToken,
    ) -> CalendarResult<()> {
        {
            let mut inner = self.inner.write();
            match inner.state {
                SessionState::Authenticating => return Err(CalendarError::AuthInProgress),
                SessionState::SignedIn => {
                    debug!("authenticate() called while already signed in");
                    return Ok(());
                }
                SessionState::SignedOut | SessionState::Expired => {
                    inner.state = SessionState::Authenticating;
                }
            }
        }
        info!("Starting interactive authentication");

        let mut guard = AttemptGuard {
            session: self,
            settled: false,
        };
        let outcome = self.run_flow(gateway, flow, cancel).await;

        let mut inner = self.inner.write();
        guard.settled = true;
        match outcome {
            Ok(_) if inner.state != SessionState::Authenticating => {
                // sign_out() ran while the window was open; the sign-out stands
                if let Err(e) = self.store.clear() {
                    warn!("Failed to clear token granted after sign-out: {}", e);
                }
                inner.token = None;
                inner.state = SessionState::SignedOut;
                info!("Discarding token granted after sign-out");
                Err(CalendarError::AuthCancelled)
            }
            Ok(token) => {
                inner.token = Some(token);
                inner.state = SessionState::SignedIn;
                info!("Authentication succeeded");
                Ok(())
            }
            Err(e) => {
                inner.token = None;
                inner.state = SessionState::SignedOut;
                warn!("Authentication failed: {}", e);
                Err(e)
            }
        }
    }

    async fn run_flow(
        &self,
        gateway: &dyn EventsGateway,
        flow: &dyn InteractiveFlow,
        cancel: &CancellationToken,
    ) -> CalendarResult<String> {
        let auth_url = gateway.authorization_url().await?;
        let window = flow.open(&auth_url).await?;

        if let Err(e) = self.wait_for_close(window.as_ref(), cancel).await {
            window.close();
            return Err(e);
        }

        self.store.load()?.ok_or(CalendarError::AuthFailed)
    }

    async fn wait_for_close(
        &self,
        window: &dyn FlowWindow,
        cancel: &CancellationToken,
    ) -> CalendarResult<()> {
        let deadline = tokio::time::sleep(self.max_wait);
        tokio::pin!(deadline);

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Err(CalendarError::AuthCancelled),
                _ = &mut deadline => {
                    return Err(CalendarError::AuthTimeout {
                        timeout_seconds: self.max_wait.as_secs(),
                    })
                }
                _ = ticker.tick() => {
                    if window.is_closed() {
                        debug!("Authorization window closed");
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Fetch through the gateway with the current token.
    /// A 401 expires the session; nothing is retried.
    pub async fn fetch_events(&self, gateway: &dyn EventsGateway) -> CalendarResult<Vec<CalendarEvent>> {
        let token = match self.token() {
            Some(token) => token,
            None if !gateway.requires_token() => String::new(),
            None => return Err(CalendarError::Unauthenticated),
        };

        match gateway.get_events(&token).await {
            Err(CalendarError::AuthExpired) => {
                self.expire(&token);
                Err(CalendarError::AuthExpired)
            }
            other => other,
        }
    }

    /// First `max_results` events in provider order
    pub async fn upcoming_events(
        &self,
        gateway: &dyn EventsGateway,
        max_results: usize,
    ) -> CalendarResult<Vec<CalendarEvent>> {
        let mut events = self.fetch_events(gateway).await?;
        events.truncate(max_results);
        Ok(events)
    }

    /// Events that fall on today's date. Transport trouble degrades to an
    /// empty list; auth problems still surface so the caller can prompt.
    pub async fn today_events(
        &self,
        gateway: &dyn EventsGateway,
        normalizer: &DateKeyNormalizer,
    ) -> CalendarResult<Vec<CalendarEvent>> {
        let today = normalizer.zone().today();
        match self.fetch_events(gateway).await {
            Ok(events) => Ok(events
                .into_iter()
                .filter(|event| normalizer.normalize(event).map(|key| key.date()) == Some(today))
                .collect()),
            Err(e) if e.requires_reconnect() => Err(e),
            Err(e) => {
                warn!("Error fetching today's events: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Clear the stored token. Safe to call in any state, any number of times.
    pub fn sign_out(&self) -> CalendarResult<()> {
        self.store.clear()?;
        let mut inner = self.inner.write();
        inner.token = None;
        inner.state = SessionState::SignedOut;
        info!("Signed out");
        Ok(())
    }

    fn expire(&self, rejected_token: &str) {
        let mut inner = self.inner.write();
        if inner.token.as_deref() != Some(rejected_token) {
            // Signed out or re-authenticated while the fetch was in flight
            return;
        }
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear expired token: {}", e);
        }
        inner.token = None;
        inner.state = SessionState::Expired;
        warn!("Access token rejected by provider; session expired");
    }
}
