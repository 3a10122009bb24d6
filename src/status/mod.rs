//! Model status cache.
//!
//! Process-wide map of model id to last known availability. Written by the router after
//! every remote attempt and by the background [`StatusMonitor`]; read by UIs. Concurrent
//! readers are fine and the last writer wins.

mod monitor;

pub use monitor::{StatusMonitor, PAUSE_GUIDANCE};

use crate::client::RemoteError;
use crate::error_code::ErrorKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelState {
    #[default]
    Available,
    Paused,
    Loading,
    Error,
    RequiresApiKey,
}

impl ModelState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Paused => "paused",
            Self::Loading => "loading",
            Self::Error => "error",
            Self::RequiresApiKey => "requires_api_key",
        }
    }

    /// State recorded after a routing failure of the given kind.
    pub fn from_error_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Paused => Self::Paused,
            ErrorKind::Transient => Self::Loading,
            ErrorKind::Auth => Self::RequiresApiKey,
            _ => Self::Error,
        }
    }

    fn default_message(&self) -> &'static str {
        match self {
            Self::Paused => "Paused",
            Self::Loading => "Loading",
            Self::RequiresApiKey => "API key required",
            _ => "Unavailable",
        }
    }
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastError {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Status plus optional last error. `Available` never carries an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelStatus {
    pub state: ModelState,
    pub last_error: Option<LastError>,
}

impl Default for ModelStatus {
    fn default() -> Self {
        Self {
            state: ModelState::Available,
            last_error: None,
        }
    }
}

pub trait StatusStore: Send + Sync {
    /// Record a state. Non-available states always end up with a non-empty message.
    fn set_status(&self, model_id: &str, state: ModelState, error: Option<&str>);

    /// Current state; unknown ids are `Available`.
    fn get_status(&self, model_id: &str) -> ModelState;

    fn get_error(&self, model_id: &str) -> Option<LastError>;

    fn clear_error(&self, model_id: &str);

    /// Copy of every tracked entry.
    fn snapshot(&self) -> HashMap<String, ModelStatus>;

    fn record_failure(&self, model_id: &str, err: &RemoteError) {
        self.set_status(
            model_id,
            ModelState::from_error_kind(err.kind),
            Some(&err.message),
        );
    }
}

#[derive(Default)]
pub struct InMemoryStatusStore {
    entries: RwLock<HashMap<String, ModelStatus>>,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn write<R>(&self, f: impl FnOnce(&mut HashMap<String, ModelStatus>) -> R) -> R {
        match self.entries.write() {
            Ok(mut g) => f(&mut g),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    fn read<R>(&self, f: impl FnOnce(&HashMap<String, ModelStatus>) -> R) -> R {
        match self.entries.read() {
            Ok(g) => f(&g),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }
}

impl StatusStore for InMemoryStatusStore {
    fn set_status(&self, model_id: &str, state: ModelState, error: Option<&str>) {
        let last_error = match state {
            ModelState::Available => None,
            other => {
                let message = error
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| other.default_message());
                Some(LastError {
                    message: message.to_string(),
                    timestamp: Utc::now(),
                })
            }
        };
        self.write(|m| {
            m.insert(model_id.to_string(), ModelStatus { state, last_error });
        });
    }

    fn get_status(&self, model_id: &str) -> ModelState {
        self.read(|m| m.get(model_id).map(|s| s.state).unwrap_or_default())
    }

    fn get_error(&self, model_id: &str) -> Option<LastError> {
        self.read(|m| m.get(model_id).and_then(|s| s.last_error.clone()))
    }

    fn clear_error(&self, model_id: &str) {
        self.write(|m| {
            if let Some(entry) = m.get_mut(model_id) {
                entry.last_error = None;
                entry.state = ModelState::Available;
            }
        });
    }

    fn snapshot(&self) -> HashMap<String, ModelStatus> {
        self.read(|m| m.clone())
    }
}
