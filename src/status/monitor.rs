use super::{ModelState, StatusStore};
use crate::catalog::{effective_catalog, ModelCatalog};
use crate::client::{ModelBackend, RemoteError};
use crate::error_code::ErrorKind;
use crate::settings::{AdvancedSettings, SettingsProvider};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub const PAUSE_GUIDANCE: &str = "Endpoint paused. See how pause works: https://openrouter.ai/docs";

const NOT_FOUND_GUIDANCE: &str = "Model not found or endpoint removed. Check OpenRouter documentation: \
     https://openrouter.ai/docs and model availability: https://openrouter.ai/models";

/// Periodic out-of-band availability probe for remote models.
///
/// Only ever writes to the status store. Cycles never overlap: a cycle requested while
/// another is still running is skipped.
pub struct StatusMonitor {
    backend: Arc<dyn ModelBackend>,
    status: Arc<dyn StatusStore>,
    settings: Arc<dyn SettingsProvider>,
    builtin: Arc<ModelCatalog>,
    in_flight: AtomicBool,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl StatusMonitor {
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        status: Arc<dyn StatusStore>,
        settings: Arc<dyn SettingsProvider>,
        builtin: Arc<ModelCatalog>,
    ) -> Self {
        Self {
            backend,
            status,
            settings,
            builtin,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Probe every remote model once, sequentially.
    ///
    /// Returns the number of models probed, or `None` when a cycle was already in flight.
    pub async fn run_cycle(&self) -> Option<usize> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("status probe cycle already running, skipping");
            return None;
        }
        let _guard = InFlightGuard(&self.in_flight);

        let catalog = effective_catalog(self.settings.as_ref(), &self.builtin);
        let ids = catalog.remote_ids();
        let started = Instant::now();

        for id in &ids {
            match self.backend.probe(id).await {
                Ok(()) => self.status.set_status(id, ModelState::Available, None),
                Err(err) => {
                    let (state, message) = probe_failure(&err);
                    debug!(model_id = %id, error_kind = %err.kind, state = %state, "probe failed");
                    self.status.set_status(id, state, Some(&message));
                }
            }
        }

        info!(
            models = ids.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "status probe cycle finished"
        );
        Some(ids.len())
    }

    /// Run cycles forever on a tokio interval. The first cycle starts immediately.
    ///
    /// The interval is re-read from settings after every cycle.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut period = self.interval();
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.run_cycle().await;

                let next = self.interval();
                if next != period {
                    info!(secs = next.as_secs(), "status check interval changed");
                    period = next;
                    ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
                    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                }
            }
        })
    }

    fn interval(&self) -> Duration {
        let settings = AdvancedSettings::clone(&self.settings.snapshot()).normalized();
        Duration::from_secs(settings.status_check_interval_secs)
    }
}

fn probe_failure(err: &RemoteError) -> (ModelState, String) {
    let text = err.message.trim();
    match err.kind {
        ErrorKind::Paused | ErrorKind::BadRequest => {
            let msg = if text.is_empty() { "endpoint paused" } else { text };
            (ModelState::Paused, format!("{msg}. {PAUSE_GUIDANCE}"))
        }
        ErrorKind::Transient => (ModelState::Loading, text.to_string()),
        ErrorKind::Auth => (ModelState::RequiresApiKey, text.to_string()),
        ErrorKind::NotFound => (ModelState::Error, NOT_FOUND_GUIDANCE.to_string()),
        ErrorKind::Timeout => (ModelState::Error, "timeout".to_string()),
        _ => (ModelState::Error, text.to_string()),
    }
}
