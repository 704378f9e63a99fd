use thiserror::Error;

/// Structured error types for the calendar client
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalendarError {
    /// The interactive flow closed without leaving a token behind
    #[error("Authentication failed: the authorization window closed without granting access")]
    AuthFailed,

    /// The provider rejected a token that used to work
    #[error("Authentication expired: please reconnect your calendar")]
    AuthExpired,

    /// A fetch was attempted with no stored token
    #[error("Not authenticated")]
    Unauthenticated,

    /// Gave up waiting for the interactive flow
    #[error("Authentication timed out after {timeout_seconds}s")]
    AuthTimeout { timeout_seconds: u64 },

    /// The caller cancelled a pending authentication
    #[error("Authentication cancelled")]
    AuthCancelled,

    /// A second authenticate() arrived while one was still pending
    #[error("Authentication already in progress")]
    AuthInProgress,

    /// Network failures, unexpected statuses and unparseable bodies
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// An event record that resolves to no calendar day
    #[error("Malformed event '{id}': {message}")]
    MalformedEvent { id: String, message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Token storage errors
    #[error("Storage error: {operation} failed for path '{path}': {message}")]
    Storage {
        operation: String,
        path: String,
        message: String,
    },

    /// Parsing errors (JSON, TOML, dates)
    #[error("Parsing error: Failed to parse {format}: {message}")]
    Parsing { format: String, message: String },
}

/// Coarse grouping used by the view layer to pick a reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    Expired,
    Network,
    Data,
    Configuration,
}

/// Result type alias using CalendarError
pub type CalendarResult<T> = std::result::Result<T, CalendarError>;

impl CalendarError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AuthExpired => ErrorCategory::Expired,
            Self::AuthFailed
            | Self::Unauthenticated
            | Self::AuthTimeout { .. }
            | Self::AuthCancelled
            | Self::AuthInProgress => ErrorCategory::Authentication,
            Self::Transport { .. } => ErrorCategory::Network,
            Self::MalformedEvent { .. } | Self::Parsing { .. } => ErrorCategory::Data,
            Self::Config { .. } | Self::Storage { .. } => ErrorCategory::Configuration,
        }
    }

    /// True when the only way forward is a fresh interactive sign-in
    pub fn requires_reconnect(&self) -> bool {
        matches!(self, Self::AuthExpired | Self::Unauthenticated)
    }

    /// Short message suitable for an inline banner
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthExpired => {
                "Your calendar session expired. Run 'gridcal connect' to reconnect.".to_string()
            }
            Self::Unauthenticated => {
                "Not connected. Run 'gridcal connect' to link your calendar.".to_string()
            }
            Self::AuthFailed | Self::AuthTimeout { .. } | Self::AuthCancelled => {
                "Failed to connect to your calendar.".to_string()
            }
            Self::AuthInProgress => "A connection attempt is already running.".to_string(),
            _ => "Failed to load calendar events. Please try connecting your calendar.".to_string(),
        }
    }
}

impl From<std::io::Error> for CalendarError {
    fn from(error: std::io::Error) -> Self {
        Self::Storage {
            operation: "io".to_string(),
            path: "unknown".to_string(),
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for CalendarError {
    fn from(error: serde_json::Error) -> Self {
        Self::Parsing {
            format: "JSON".to_string(),
            message: error.to_string(),
        }
    }
}

impl From<toml::de::Error> for CalendarError {
    fn from(error: toml::de::Error) -> Self {
        Self::Parsing {
            format: "TOML".to_string(),
            message: error.to_string(),
        }
    }
}

impl From<reqwest::Error> for CalendarError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::transport(format!("request timed out: {}", error))
        } else if error.is_connect() {
            Self::transport(format!("connection failed: {}", error))
        } else if error.is_decode() {
            Self::transport(format!("malformed response: {}", error))
        } else {
            Self::transport(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_maps_to_reconnect_prompt() {
        let error = CalendarError::AuthExpired;
        assert_eq!(error.category(), ErrorCategory::Expired);
        assert!(error.requires_reconnect());
        assert!(error.user_message().contains("reconnect"));
    }

    #[test]
    fn test_transport_is_inline_error() {
        let error = CalendarError::transport("boom");
        assert_eq!(error.category(), ErrorCategory::Network);
        assert!(!error.requires_reconnect());
        assert_eq!(error.to_string(), "Transport error: boom");
    }

    #[test]
    fn test_json_error_conversion() {
        let parse_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: CalendarError = parse_error.into();
        assert!(matches!(error, CalendarError::Parsing { ref format, .. } if format == "JSON"));
    }
}
