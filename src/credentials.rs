//! API credential source for remote models.
//!
//! The router asks the store for a fresh token exactly once per routing call when a
//! remote model rejects the current one, so the store must be able to re-read its
//! sources at runtime.

use keyring::Entry;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info};

/// Keyring service name used for stored API keys.
pub const KEYRING_SERVICE: &str = "luna-assistant";

/// Environment variable holding the OpenRouter API key.
pub const OPENROUTER_KEY_VAR: &str = "OPENROUTER_API_KEY";

pub trait CredentialStore: Send + Sync {
    /// Current token, if any. Cheap; called on every remote request.
    fn token(&self) -> Option<String>;

    /// Re-read the underlying sources. Returns true iff a non-empty token is now held.
    fn reload_from_environment(&self) -> bool;
}

/// Resolves a token from, in order: the process environment, a `.env` file, the OS keyring.
pub struct EnvCredentials {
    var: String,
    dotenv_path: Option<PathBuf>,
    keyring_user: Option<String>,
    token: RwLock<Option<String>>,
}

impl EnvCredentials {
    /// Store for [`OPENROUTER_KEY_VAR`], looking at `./.env` and the keyring.
    pub fn openrouter() -> Self {
        let store = Self {
            var: OPENROUTER_KEY_VAR.to_string(),
            dotenv_path: Some(PathBuf::from(".env")),
            keyring_user: Some("openrouter".to_string()),
            token: RwLock::new(None),
        };
        store.reload_from_environment();
        store
    }

    /// Store reading only the given variable; no `.env`, no keyring.
    pub fn from_var(var: impl Into<String>) -> Self {
        let store = Self {
            var: var.into(),
            dotenv_path: None,
            keyring_user: None,
            token: RwLock::new(None),
        };
        store.reload_from_environment();
        store
    }

    pub fn with_dotenv(mut self, path: impl Into<PathBuf>) -> Self {
        self.dotenv_path = Some(path.into());
        self.reload_from_environment();
        self
    }

    /// Fixed token, mainly for tests and embedding.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            var: String::new(),
            dotenv_path: None,
            keyring_user: None,
            token: RwLock::new(non_empty(token.into())),
        }
    }

    fn resolve(&self) -> Option<String> {
        if !self.var.is_empty() {
            if let Some(v) = env::var(&self.var).ok().and_then(non_empty) {
                return Some(v);
            }
            if let Some(path) = &self.dotenv_path {
                if let Some(v) = read_dotenv_value(path, &self.var) {
                    debug!(path = %path.display(), "API key loaded from dotenv file");
                    return Some(v);
                }
            }
        }
        let user = self.keyring_user.as_deref()?;
        let entry = Entry::new(KEYRING_SERVICE, user).ok()?;
        entry.get_password().ok().and_then(non_empty)
    }
}

impl CredentialStore for EnvCredentials {
    fn token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn reload_from_environment(&self) -> bool {
        // A store built with a fixed token has nothing to re-read.
        if self.var.is_empty() && self.keyring_user.is_none() {
            return self.token().is_some();
        }
        let fresh = self.resolve();
        let found = fresh.is_some();
        match self.token.write() {
            Ok(mut guard) => *guard = fresh,
            Err(poisoned) => *poisoned.into_inner() = fresh,
        }
        info!(var = %self.var, found, "credentials reloaded");
        found
    }
}

fn non_empty(s: String) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// Minimal `KEY=value` reader. Skips comments, tolerates `export ` and surrounding quotes.
fn read_dotenv_value(path: &Path, key: &str) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((k, v)) = line.split_once('=') else {
            continue;
        };
        if k.trim() != key {
            continue;
        }
        let v = v.trim().trim_matches('"').trim_matches('\'');
        return non_empty(v.to_string());
    }
    None
}
