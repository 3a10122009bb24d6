//! Fallback router.
//!
//! Per call:
//!
//! ```text
//! Start -> PrimaryAttempt -> Success
//!                         -> AuthRecovery -> PrimaryAttempt
//!                         -> AlternatesWalk -> AlternateSuccess
//!                                           -> LocalFallback
//!                         -> LocalFallback
//! ```
//!
//! [`FallbackRouter::route`] never fails: every path ends in a response string carrying a
//! `[Using: ...]` suffix. All network calls within one call are sequential. Every remote
//! failure is written to the status store before the next decision is taken.

mod alternates;
mod policy;

use crate::catalog::{effective_catalog, ModelCatalog, ModelDescriptor, LOCAL_ENGINE_ID};
use crate::client::{ModelBackend, RemoteError};
use crate::credentials::{CredentialStore, EnvCredentials};
use crate::error_code::ErrorKind;
use crate::responder::LocalResponder;
use crate::settings::{split_list, SettingsProvider};
use crate::status::{InMemoryStatusStore, StatusStore};
use alternates::{plan, AlternateBudget};
use policy::{should_walk_alternates, Decision, RetryPolicy};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Display label used for the last-resort local reply.
pub const LOCAL_FALLBACK_LABEL: &str = "Local Conversation Engine (Fallback)";

const TROUBLE_CONNECTING: &str =
    "I'm having trouble connecting to any AI models right now. Please try again later.";

/// `"{text}\n\n[Using: {label}]"`
pub fn envelope(text: &str, label: &str) -> String {
    format!("{text}\n\n[Using: {label}]")
}

/// One remote call made while serving a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingAttempt {
    pub model_id: String,
    pub outcome: Result<(), ErrorKind>,
    pub latency: Duration,
}

/// Which path produced the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePath {
    /// The selected model is local.
    Local,
    Primary,
    Alternate { model_id: String },
    LocalFallback,
    /// No usable descriptor at all.
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct RouteOutcome {
    pub response: String,
    pub path: RoutePath,
    pub attempts: Vec<RoutingAttempt>,
    pub credential_reloads: u32,
}

#[derive(Default)]
struct Trace {
    attempts: Vec<RoutingAttempt>,
    credential_reloads: u32,
}

impl Trace {
    fn finish(self, response: String, path: RoutePath) -> RouteOutcome {
        RouteOutcome {
            response,
            path,
            attempts: self.attempts,
            credential_reloads: self.credential_reloads,
        }
    }
}

pub struct FallbackRouter {
    backend: Arc<dyn ModelBackend>,
    responder: Arc<LocalResponder>,
    status: Arc<dyn StatusStore>,
    settings: Arc<dyn SettingsProvider>,
    credentials: Arc<dyn CredentialStore>,
    catalog: Arc<ModelCatalog>,
    env_alternates: Vec<String>,
    backoff_unit: Duration,
}

impl FallbackRouter {
    pub fn builder(
        backend: Arc<dyn ModelBackend>,
        responder: Arc<LocalResponder>,
        settings: Arc<dyn SettingsProvider>,
    ) -> FallbackRouterBuilder {
        FallbackRouterBuilder::new(backend, responder, settings)
    }

    pub fn status(&self) -> &Arc<dyn StatusStore> {
        &self.status
    }

    pub fn responder(&self) -> &Arc<LocalResponder> {
        &self.responder
    }

    /// Catalog in effect for the next call.
    pub fn catalog(&self) -> Arc<ModelCatalog> {
        effective_catalog(self.settings.as_ref(), &self.catalog)
    }

    /// Route `message` to `model_id` and return the enveloped response.
    pub async fn route(&self, message: &str, model_id: &str) -> String {
        self.route_traced(message, model_id).await.response
    }

    /// Like [`Self::route`], also returning every attempt made.
    pub async fn route_traced(&self, message: &str, model_id: &str) -> RouteOutcome {
        let settings = self.settings.snapshot();
        self.responder.apply_settings(&settings);
        let catalog = effective_catalog(self.settings.as_ref(), &self.catalog);
        let mut trace = Trace::default();

        let Some(descriptor) = lookup(&catalog, model_id) else {
            warn!(model_id, "no descriptor for model and no local engine in catalog");
            return trace.finish(envelope(TROUBLE_CONNECTING, model_id), RoutePath::Unavailable);
        };

        if descriptor.is_local() {
            let reply = self.responder.respond(message);
            self.status.clear_error(&descriptor.id);
            debug!(model_id = %descriptor.id, "served by local engine");
            return trace.finish(envelope(&reply, &descriptor.display_name), RoutePath::Local);
        }

        let policy = RetryPolicy::from_settings(&settings, self.backoff_unit);
        let max_tokens = settings.max_tokens;
        let primary = descriptor.id.as_str();

        // Primary attempts
        let mut attempt = 0u32;
        let mut reloaded = false;
        let mut last_err: Option<RemoteError> = None;
        while attempt < policy.max_attempts {
            debug!(model_id = primary, attempt, "primary attempt");
            match self.call(primary, message, max_tokens, &mut trace).await {
                Ok(text) => {
                    self.status.clear_error(primary);
                    return trace.finish(envelope(&text, &descriptor.display_name), RoutePath::Primary);
                }
                Err(err) => {
                    let decision = policy.decide(err.kind, attempt, reloaded);
                    warn!(
                        model_id = primary,
                        attempt,
                        error_kind = %err.kind,
                        decision = ?decision,
                        "primary attempt failed: {}",
                        err.summary()
                    );
                    last_err = Some(err);
                    match decision {
                        Decision::ReloadCredentials => {
                            reloaded = true;
                            trace.credential_reloads += 1;
                            if self.credentials.reload_from_environment() {
                                info!(model_id = primary, "credentials reloaded, retrying");
                                continue;
                            }
                            break;
                        }
                        Decision::Retry { delay } => {
                            if !delay.is_zero() {
                                tokio::time::sleep(delay).await;
                            }
                            attempt += 1;
                        }
                        Decision::Stop => break,
                    }
                }
            }
        }

        let last_err =
            last_err.unwrap_or_else(|| RemoteError::new(ErrorKind::Unknown, "unknown error"));

        // Alternates walk
        if should_walk_alternates(&settings, last_err.kind) {
            let priority = settings.alternate_priority();
            let candidates = plan(&catalog, primary, &priority, &self.env_alternates);
            let mut budget = AlternateBudget::new(settings.alt_attempt_cap);
            info!(
                model_id = primary,
                error_kind = %last_err.kind,
                candidates = candidates.len(),
                "walking alternates"
            );

            for alt_id in &candidates {
                if budget.exhausted() {
                    break;
                }
                match self.call(alt_id, message, max_tokens, &mut trace).await {
                    Ok(text) => {
                        self.status.clear_error(alt_id);
                        self.settings.set_current_model(alt_id);
                        let name = catalog
                            .get(alt_id)
                            .map(|m| m.display_name.as_str())
                            .unwrap_or(alt_id.as_str());
                        info!(from = primary, to = %alt_id, "auto-switched to alternate model");
                        return trace.finish(
                            envelope(&text, &format!("{name} (Auto-switched)")),
                            RoutePath::Alternate {
                                model_id: alt_id.clone(),
                            },
                        );
                    }
                    Err(err) if !err.kind.consumes_alternate_budget() => {
                        debug!(model_id = %alt_id, error_kind = %err.kind, "alternate skipped");
                    }
                    Err(err) => {
                        budget.charge();
                        debug!(
                            model_id = %alt_id,
                            error_kind = %err.kind,
                            tried = budget.tried(),
                            "alternate failed"
                        );
                    }
                }
            }
        }

        // Local fallback
        let prompt = format!("[SYSTEM: Remote model error: {}] {message}", last_err.summary());
        let reply = self.responder.respond(&prompt);
        info!(model_id = primary, error_kind = %last_err.kind, "falling back to local engine");
        trace.finish(envelope(&reply, LOCAL_FALLBACK_LABEL), RoutePath::LocalFallback)
    }

    /// One remote call: records the attempt and any failure in the status store.
    async fn call(
        &self,
        model_id: &str,
        message: &str,
        max_tokens: u32,
        trace: &mut Trace,
    ) -> Result<String, RemoteError> {
        let started = Instant::now();
        let result = match self.backend.invoke(model_id, message, max_tokens).await {
            Ok(text) if text.trim().is_empty() => Err(RemoteError::empty_response()),
            other => other,
        };
        let latency = started.elapsed();
        trace.attempts.push(RoutingAttempt {
            model_id: model_id.to_string(),
            outcome: result.as_ref().map(|_| ()).map_err(|e| e.kind),
            latency,
        });
        if let Err(err) = &result {
            self.status.record_failure(model_id, err);
        }
        debug!(
            model_id,
            duration_ms = latency.as_millis() as u64,
            ok = result.is_ok(),
            "remote call finished"
        );
        result
    }
}

/// Exact id, then alias resolution, then the local engine.
fn lookup<'a>(catalog: &'a ModelCatalog, model_id: &str) -> Option<&'a ModelDescriptor> {
    if let Some(d) = catalog.get(model_id) {
        return Some(d);
    }
    if let Ok(resolved) = catalog.resolve_alias(model_id) {
        return catalog.get(&resolved);
    }
    warn!(model_id, "unknown model, using local engine");
    catalog.get(LOCAL_ENGINE_ID)
}

pub struct FallbackRouterBuilder {
    backend: Arc<dyn ModelBackend>,
    responder: Arc<LocalResponder>,
    settings: Arc<dyn SettingsProvider>,
    status: Option<Arc<dyn StatusStore>>,
    credentials: Option<Arc<dyn CredentialStore>>,
    catalog: Option<Arc<ModelCatalog>>,
    env_alternates: Option<Vec<String>>,
    backoff_unit: Duration,
}

impl FallbackRouterBuilder {
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        responder: Arc<LocalResponder>,
        settings: Arc<dyn SettingsProvider>,
    ) -> Self {
        Self {
            backend,
            responder,
            settings,
            status: None,
            credentials: None,
            catalog: None,
            env_alternates: None,
            backoff_unit: Duration::from_secs(1),
        }
    }

    pub fn status_store(mut self, status: Arc<dyn StatusStore>) -> Self {
        self.status = Some(status);
        self
    }

    pub fn credentials(mut self, credentials: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Built-in catalog; a settings-provided override still wins per call.
    pub fn catalog(mut self, catalog: Arc<ModelCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Alternate ids; defaults to `LUNA_ALT_MODELS`.
    pub fn env_alternates(mut self, ids: Vec<String>) -> Self {
        self.env_alternates = Some(ids);
        self
    }

    /// Base unit of the linear backoff (`2 * attempt * unit`). Defaults to one second.
    pub fn backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    pub fn build(self) -> FallbackRouter {
        FallbackRouter {
            backend: self.backend,
            responder: self.responder,
            settings: self.settings,
            status: self
                .status
                .unwrap_or_else(|| Arc::new(InMemoryStatusStore::new())),
            credentials: self
                .credentials
                .unwrap_or_else(|| Arc::new(EnvCredentials::openrouter())),
            catalog: self
                .catalog
                .unwrap_or_else(|| Arc::new(ModelCatalog::builtin())),
            env_alternates: self.env_alternates.unwrap_or_else(|| {
                std::env::var("LUNA_ALT_MODELS")
                    .map(|raw| split_list(&raw))
                    .unwrap_or_default()
            }),
            backoff_unit: self.backoff_unit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope() {
        assert_eq!(envelope("hi", "X"), "hi\n\n[Using: X]");
    }

    #[test]
    fn test_lookup_order() {
        let catalog = ModelCatalog::builtin();
        assert_eq!(lookup(&catalog, "openai/gpt-oss-20b:free").unwrap().id, "openai/gpt-oss-20b:free");
        assert_eq!(
            lookup(&catalog, "deepseek-chat-v3-0324").unwrap().id,
            "deepseek/deepseek-r1-0528:free"
        );
        assert_eq!(lookup(&catalog, "no-such-model").unwrap().id, LOCAL_ENGINE_ID);
        assert!(lookup(&ModelCatalog::new(), "x").is_none());
    }
}
