//! Shared test doubles: a scripted backend and a counting credential store.

#![allow(dead_code)]

use async_trait::async_trait;
use luna_assistant::{CredentialStore, ErrorKind, ModelBackend, RemoteError, RemoteResult};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Backend replaying per-model queues of results and recording every call.
#[derive(Default)]
pub struct ScriptedBackend {
    scripts: Mutex<HashMap<String, VecDeque<RemoteResult<String>>>>,
    /// Result used once a model's queue is empty.
    exhausted: Mutex<HashMap<String, RemoteResult<String>>>,
    calls: Mutex<Vec<String>>,
    probes: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue results for `model_id`, consumed in order.
    pub fn script(self, model_id: &str, results: Vec<RemoteResult<String>>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(model_id.to_string())
            .or_default()
            .extend(results);
        self
    }

    /// Result returned for `model_id` every time after its queue runs out.
    pub fn always(self, model_id: &str, result: RemoteResult<String>) -> Self {
        self.exhausted
            .lock()
            .unwrap()
            .insert(model_id.to_string(), result);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, model_id: &str) -> usize {
        self.calls().iter().filter(|c| *c == model_id).count()
    }

    pub fn probes(&self) -> Vec<String> {
        self.probes.lock().unwrap().clone()
    }

    fn next(&self, model_id: &str) -> RemoteResult<String> {
        if let Some(r) = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(model_id)
            .and_then(VecDeque::pop_front)
        {
            return r;
        }
        self.exhausted
            .lock()
            .unwrap()
            .get(model_id)
            .cloned()
            .unwrap_or_else(|| Err(err(ErrorKind::NotFound, "not scripted")))
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    async fn invoke(&self, model_id: &str, _prompt: &str, _max_tokens: u32) -> RemoteResult<String> {
        self.calls.lock().unwrap().push(model_id.to_string());
        self.next(model_id)
    }

    async fn probe(&self, model_id: &str) -> RemoteResult<()> {
        self.probes.lock().unwrap().push(model_id.to_string());
        self.next(model_id).map(|_| ())
    }
}

pub fn ok(text: &str) -> RemoteResult<String> {
    Ok(text.to_string())
}

pub fn err(kind: ErrorKind, message: &str) -> RemoteError {
    RemoteError::new(kind, message)
}

pub fn fail(kind: ErrorKind) -> RemoteResult<String> {
    Err(err(kind, kind.name()))
}

/// Credential store counting reloads; reload succeeds when `reload_ok`.
pub struct CountingCredentials {
    reload_ok: bool,
    reloads: AtomicU32,
}

impl CountingCredentials {
    pub fn new(reload_ok: bool) -> Self {
        Self {
            reload_ok,
            reloads: AtomicU32::new(0),
        }
    }

    pub fn reloads(&self) -> u32 {
        self.reloads.load(Ordering::SeqCst)
    }
}

impl CredentialStore for CountingCredentials {
    fn token(&self) -> Option<String> {
        Some("test-key".to_string())
    }

    fn reload_from_environment(&self) -> bool {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        self.reload_ok
    }
}
