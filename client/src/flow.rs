use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::CalendarResult;
use crate::gateway::EventsGateway;
use crate::token_store::TokenStore;

/// The externally hosted authorization step. Opening it hands back a window
/// whose only observable property is whether it has closed.
#[async_trait]
pub trait InteractiveFlow: Send + Sync {
    async fn open(&self, auth_url: &str) -> CalendarResult<Box<dyn FlowWindow>>;
}

pub trait FlowWindow: Send + Sync {
    fn is_closed(&self) -> bool;

    /// Called when the caller stops waiting (timeout or cancellation)
    fn close(&self) {}
}

/// Terminal version of the authorization popup.
///
/// Prints the URL, then waits on stdin for the authorization code (or the
/// whole redirect URL). The code is exchanged through the gateway and the
/// resulting access token is written to the token store, which is what the
/// popup's callback page does in a browser. The window counts as closed once
/// that attempt finishes, successful or not.
pub struct ConsoleFlow {
    gateway: Arc<dyn EventsGateway>,
    store: Arc<dyn TokenStore>,
}

impl ConsoleFlow {
    pub fn new(gateway: Arc<dyn EventsGateway>, store: Arc<dyn TokenStore>) -> Self {
        Self { gateway, store }
    }
}

struct ConsoleWindow {
    closed: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl FlowWindow for ConsoleWindow {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn close(&self) {
        self.task.abort();
        self.closed.store(true, Ordering::Release);
    }
}

impl Drop for ConsoleWindow {
    // An abandoned attempt must not write a token behind the session's back
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[async_trait]
impl InteractiveFlow for ConsoleFlow {
    async fn open(&self, auth_url: &str) -> CalendarResult<Box<dyn FlowWindow>> {
        println!("\n📋 Follow these steps:");
        println!("1. Open this URL in your browser:");
        println!("   {}", auth_url);
        println!("2. Grant read access to your calendar");
        println!("3. Paste the authorization code (or the full redirect URL) below");
        println!("\n🔑 Authorization code: ");

        let closed = Arc::new(AtomicBool::new(false));
        let gateway = self.gateway.clone();
        let store = self.store.clone();
        let done = closed.clone();

        let task = tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            let input = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => String::new(),
                Err(e) => {
                    warn!("Failed to read authorization code: {}", e);
                    String::new()
                }
            };

            match extract_code(&input) {
                Some(code) => complete_exchange(gateway.as_ref(), store.as_ref(), &code).await,
                None => warn!("No authorization code provided"),
            }

            done.store(true, Ordering::Release);
        });

        Ok(Box::new(ConsoleWindow { closed, task }))
    }
}

async fn complete_exchange(gateway: &dyn EventsGateway, store: &dyn TokenStore, code: &str) {
    match gateway.exchange_code(code).await {
        Ok(exchange) if exchange.success => match exchange.access_token() {
            Some(token) => {
                if let Err(e) = store.save(&token) {
                    warn!("Failed to store access token: {}", e);
                } else {
                    info!("Authorization code exchanged for an access token");
                }
            }
            None => warn!("Token exchange succeeded but returned no access token"),
        },
        Ok(_) => warn!("Token exchange reported failure"),
        Err(e) => warn!("Token exchange failed: {}", e),
    }
}

/// Accept either a bare code or a redirect URL carrying `code=...`
pub fn extract_code(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let Some((_, query)) = input.split_once('?') else {
        return Some(input.to_string());
    };

    let code = query
        .split(['&', '#'])
        .find_map(|pair| pair.strip_prefix("code="))?;

    let code = match urlencoding::decode(code) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            debug!("Authorization code was not valid percent-encoding ({}), using it raw", e);
            code.to_string()
        }
    };
    (!code.is_empty()).then_some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bare_code() {
        assert_eq!(extract_code("  4/0AbCd  \n").as_deref(), Some("4/0AbCd"));
        assert_eq!(extract_code("   "), None);
    }

    #[test]
    fn test_extract_code_from_redirect_url() {
        let url = "http://localhost:3000/auth/callback?state=xyz&code=4%2F0AbCd&scope=calendar.readonly";
        assert_eq!(extract_code(url).as_deref(), Some("4/0AbCd"));

        assert_eq!(extract_code("http://localhost:3000/auth/callback?error=access_denied"), None);
        assert_eq!(extract_code("http://localhost:3000/cb?code="), None);
    }

    #[tokio::test]
    async fn test_dropped_window_stops_its_task() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
        });

        let window = ConsoleWindow {
            closed: Arc::new(AtomicBool::new(false)),
            task,
        };
        assert!(!window.is_closed());
        drop(window);

        tokio::time::sleep(std::time::Duration::from_millis(120)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }
}
