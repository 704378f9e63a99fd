//! HTTP utility functions for consistent error handling across gateway calls

use reqwest::{Response, StatusCode};
use tracing::warn;

use crate::errors::{CalendarError, CalendarResult};

/// Map gateway statuses onto the error taxonomy: 401 means the token is dead,
/// anything else that isn't 2xx is a transport failure.
pub async fn check_gateway_response(response: Response, context: &str) -> CalendarResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    warn!("{} failed: {} - {}", context, status, error_text);

    match status {
        StatusCode::UNAUTHORIZED => Err(CalendarError::AuthExpired),
        StatusCode::METHOD_NOT_ALLOWED => Err(CalendarError::transport(format!(
            "{}: method not allowed",
            context
        ))),
        _ => Err(CalendarError::transport(format!(
            "{}: {} - {}",
            context, status, error_text
        ))),
    }
}

/// Parse JSON response with consistent error handling
pub async fn parse_json_response<T>(response: Response, context: &str) -> CalendarResult<T>
where
    T: serde::de::DeserializeOwned,
{
    let body = response
        .text()
        .await
        .map_err(|e| CalendarError::transport(format!("Failed to read {}: {}", context, e)))?;

    serde_json::from_str(&body)
        .map_err(|e| CalendarError::transport(format!("Failed to parse {}: {}", context, e)))
}
