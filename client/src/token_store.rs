use parking_lot::Mutex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{CalendarError, CalendarResult};

/// Durable home of the single bearer token. Absence means signed out.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> CalendarResult<Option<String>>;
    fn save(&self, token: &str) -> CalendarResult<()>;
    /// Removing a token that isn't there is not an error
    fn clear(&self) -> CalendarResult<()>;
}

/// One file holding the opaque token string
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn storage_error(&self, operation: &str, error: std::io::Error) -> CalendarError {
        CalendarError::Storage {
            operation: operation.to_string(),
            path: self.path.display().to_string(),
            message: error.to_string(),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> CalendarResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.storage_error("read", e)),
        }
    }

    fn save(&self, token: &str) -> CalendarResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.storage_error("create_dir", e))?;
        }
        fs::write(&self.path, token).map_err(|e| self.storage_error("write", e))?;
        debug!("Stored access token to {:?}", self.path);
        Ok(())
    }

    fn clear(&self) -> CalendarResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Removed access token at {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.storage_error("remove", e)),
        }
    }
}

/// In-process store for tests and throwaway sessions
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> CalendarResult<Option<String>> {
        Ok(self.token.lock().clone())
    }

    fn save(&self, token: &str) -> CalendarResult<()> {
        *self.token.lock() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> CalendarResult<()> {
        *self.token.lock() = None;
        Ok(())
    }
}
