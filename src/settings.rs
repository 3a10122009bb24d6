//! Advanced settings and the settings provider.
//!
//! The router and dispatcher read the provider on every call and never cache values across
//! calls. Writes replace the whole snapshot atomically; concurrent writers are last-wins.

use crate::catalog::{ModelCatalog, LOCAL_ENGINE_ID};
use crate::{Error, ErrorContext, Result};
use arc_swap::{ArcSwap, ArcSwapOption};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedSettings {
    #[serde(alias = "enable_web_search", alias = "enable_search")]
    pub search_enabled: bool,
    #[serde(alias = "enable_system_commands")]
    pub system_commands_enabled: bool,
    #[serde(alias = "search_results_limit")]
    pub search_result_limit: usize,
    #[serde(alias = "conversation_memory")]
    pub conversation_memory_size: usize,
    #[serde(alias = "response_delay")]
    pub response_delay_seconds: f64,
    #[serde(alias = "current_ai_model", alias = "current_model")]
    pub current_model_id: String,
    #[serde(alias = "save_chat_history")]
    pub remember_local_profile: bool,
    pub auto_fallback: bool,
    /// Primary attempts per route call (min 1).
    pub retry_attempts: u32,
    /// Max counted alternate attempts; 0 disables the alternates walk.
    pub alt_attempt_cap: u32,
    /// Walk alternates after any primary failure, not only paused/loading.
    pub ignore_status_pings: bool,
    /// Comma-separated model ids preferred when ordering alternates.
    #[serde(alias = "alternate_priority")]
    pub alternate_priority_order: String,
    #[serde(alias = "ai_creativity")]
    pub creativity: f64,
    pub default_city: String,
    #[serde(alias = "status_check_interval")]
    pub status_check_interval_secs: u64,
    pub max_tokens: u32,
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            search_enabled: true,
            system_commands_enabled: true,
            search_result_limit: 3,
            conversation_memory_size: 10,
            response_delay_seconds: 0.1,
            current_model_id: LOCAL_ENGINE_ID.to_string(),
            remember_local_profile: true,
            auto_fallback: true,
            retry_attempts: 2,
            alt_attempt_cap: 3,
            ignore_status_pings: false,
            alternate_priority_order: String::new(),
            creativity: 0.7,
            default_city: "Beavercreek,Ohio".to_string(),
            status_check_interval_secs: 300,
            max_tokens: 150,
        }
    }
}

/// Legacy key names accepted by [`SettingsProvider::get`] and [`SettingsProvider::set`].
const KEY_ALIASES: &[(&str, &str)] = &[
    ("enable_web_search", "search_enabled"),
    ("enable_search", "search_enabled"),
    ("enable_system_commands", "system_commands_enabled"),
    ("search_results_limit", "search_result_limit"),
    ("conversation_memory", "conversation_memory_size"),
    ("response_delay", "response_delay_seconds"),
    ("current_ai_model", "current_model_id"),
    ("current_model", "current_model_id"),
    ("save_chat_history", "remember_local_profile"),
    ("alternate_priority", "alternate_priority_order"),
    ("ai_creativity", "creativity"),
    ("status_check_interval", "status_check_interval_secs"),
];

fn canonical_key(key: &str) -> &str {
    KEY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(key)
}

impl AdvancedSettings {
    /// Load from a `.json`, `.yaml` or `.yml` file. Missing fields take defaults.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase());
        let settings: Self = match ext.as_deref() {
            Some("json") => serde_json::from_str(&content)?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            _ => {
                return Err(Error::configuration_with_context(
                    "unsupported settings file format",
                    ErrorContext::new()
                        .with_field_path(path.display().to_string())
                        .with_details("expected .json, .yaml or .yml")
                        .with_source("settings_loader"),
                ))
            }
        };
        debug!(path = %path.display(), "settings loaded");
        Ok(settings.normalized())
    }

    /// Clamp every ranged field into its valid range.
    pub fn normalized(mut self) -> Self {
        self.retry_attempts = self.retry_attempts.max(1);
        self.conversation_memory_size = self.conversation_memory_size.clamp(5, 50);
        self.search_result_limit = self.search_result_limit.max(1);
        self.creativity = if self.creativity.is_finite() {
            self.creativity.clamp(0.0, 1.0)
        } else {
            0.7
        };
        self.response_delay_seconds = if self.response_delay_seconds.is_finite() {
            self.response_delay_seconds.max(0.0)
        } else {
            0.0
        };
        self.status_check_interval_secs = self.status_check_interval_secs.clamp(60, 3600);
        self.max_tokens = self.max_tokens.max(1);
        if self.current_model_id.trim().is_empty() {
            self.current_model_id = LOCAL_ENGINE_ID.to_string();
        }
        self
    }

    /// Overlay `LUNA_CURRENT_MODEL`, `LUNA_RETRY_ATTEMPTS`, `LUNA_ALT_ATTEMPT_CAP` and
    /// `LUNA_AUTO_FALLBACK`. Unparseable values are ignored with a warning.
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(model) = env::var("LUNA_CURRENT_MODEL") {
            if !model.trim().is_empty() {
                self.current_model_id = model.trim().to_string();
            }
        }
        if let Some(v) = env_parse::<u32>("LUNA_RETRY_ATTEMPTS") {
            self.retry_attempts = v;
        }
        if let Some(v) = env_parse::<u32>("LUNA_ALT_ATTEMPT_CAP") {
            self.alt_attempt_cap = v;
        }
        if let Ok(raw) = env::var("LUNA_AUTO_FALLBACK") {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.auto_fallback = true,
                "0" | "false" | "no" | "off" => self.auto_fallback = false,
                other => warn!(value = other, "ignoring invalid LUNA_AUTO_FALLBACK"),
            }
        }
        self.normalized()
    }

    /// Parsed [`Self::alternate_priority_order`], trimmed, empties dropped.
    pub fn alternate_priority(&self) -> Vec<String> {
        split_list(&self.alternate_priority_order)
    }

    fn get_field(&self, key: &str) -> Result<Value> {
        let canonical = canonical_key(key);
        let value = serde_json::to_value(self)?;
        value
            .get(canonical)
            .cloned()
            .ok_or_else(|| unknown_key(key))
    }

    fn with_field(&self, key: &str, new_value: Value) -> Result<Self> {
        let canonical = canonical_key(key);
        let mut value = serde_json::to_value(self)?;
        let Some(obj) = value.as_object_mut() else {
            return Err(unknown_key(key));
        };
        if !obj.contains_key(canonical) {
            return Err(unknown_key(key));
        }
        obj.insert(canonical.to_string(), new_value);
        serde_json::from_value::<Self>(value)
            .map(Self::normalized)
            .map_err(|e| {
                Error::validation_with_context(
                    "invalid settings value",
                    ErrorContext::new()
                        .with_field_path(canonical)
                        .with_details(e.to_string())
                        .with_source("settings"),
                )
            })
    }
}

fn unknown_key(key: &str) -> Error {
    Error::validation_with_context(
        "unknown settings key",
        ErrorContext::new()
            .with_field_path(key)
            .with_source("settings"),
    )
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    let raw = env::var(var).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(var, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}

/// Split a comma-separated list, trimming entries and dropping empties.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Source of [`AdvancedSettings`] for the core.
pub trait SettingsProvider: Send + Sync {
    /// Latest settings.
    fn snapshot(&self) -> Arc<AdvancedSettings>;

    /// Overwrite every field.
    fn replace(&self, settings: AdvancedSettings);

    /// One field by name (canonical or legacy key).
    fn get(&self, key: &str) -> Result<Value>;

    /// One field by name. Unknown keys and ill-typed values are validation errors.
    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Persist the active model selection.
    fn set_current_model(&self, model_id: &str);

    /// Caller-supplied catalog that takes precedence over the built-in one.
    fn catalog_override(&self) -> Option<Arc<ModelCatalog>> {
        None
    }

    fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }
}

pub struct InMemorySettings {
    current: ArcSwap<AdvancedSettings>,
    catalog: ArcSwapOption<ModelCatalog>,
}

impl InMemorySettings {
    pub fn new(settings: AdvancedSettings) -> Self {
        Self {
            current: ArcSwap::from_pointee(settings.normalized()),
            catalog: ArcSwapOption::empty(),
        }
    }

    pub fn with_catalog(self, catalog: ModelCatalog) -> Self {
        self.set_catalog_override(Some(catalog));
        self
    }

    pub fn set_catalog_override(&self, catalog: Option<ModelCatalog>) {
        self.catalog.store(catalog.map(Arc::new));
    }

    /// Apply `f` to a copy of the current snapshot and store the result.
    pub fn update(&self, f: impl Fn(&mut AdvancedSettings)) {
        self.current.rcu(|cur| {
            let mut next = AdvancedSettings::clone(cur);
            f(&mut next);
            Arc::new(next.normalized())
        });
    }
}

impl Default for InMemorySettings {
    fn default() -> Self {
        Self::new(AdvancedSettings::default())
    }
}

impl SettingsProvider for InMemorySettings {
    fn snapshot(&self) -> Arc<AdvancedSettings> {
        self.current.load_full()
    }

    fn replace(&self, settings: AdvancedSettings) {
        self.current.store(Arc::new(settings.normalized()));
    }

    fn get(&self, key: &str) -> Result<Value> {
        self.current.load().get_field(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut failure = None;
        self.current.rcu(|cur| match cur.with_field(key, value.clone()) {
            Ok(next) => {
                failure = None;
                Arc::new(next)
            }
            Err(e) => {
                failure = Some(e);
                Arc::clone(cur)
            }
        });
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn set_current_model(&self, model_id: &str) {
        let id = model_id.to_string();
        self.update(move |s| s.current_model_id = id.clone());
    }

    fn catalog_override(&self) -> Option<Arc<ModelCatalog>> {
        self.catalog.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let s = AdvancedSettings::default();
        assert!(s.search_enabled);
        assert_eq!(s.retry_attempts, 2);
        assert_eq!(s.alt_attempt_cap, 3);
        assert_eq!(s.current_model_id, "local_engine");
        assert_eq!(s.default_city, "Beavercreek,Ohio");
    }

    #[test]
    fn test_normalized_clamps() {
        let s = AdvancedSettings {
            retry_attempts: 0,
            conversation_memory_size: 500,
            creativity: 3.0,
            status_check_interval_secs: 5,
            current_model_id: " ".to_string(),
            ..Default::default()
        }
        .normalized();
        assert_eq!(s.retry_attempts, 1);
        assert_eq!(s.conversation_memory_size, 50);
        assert_eq!(s.creativity, 1.0);
        assert_eq!(s.status_check_interval_secs, 60);
        assert_eq!(s.current_model_id, "local_engine");
    }

    #[test]
    fn test_partial_file_with_legacy_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("luna_settings.json");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(
            f,
            r#"{{"enable_web_search": false, "current_ai_model": "openai/gpt-oss-20b:free", "alternate_priority": "a, b"}}"#
        )
        .unwrap();

        let s = AdvancedSettings::load_from_path(&path).unwrap();
        assert!(!s.search_enabled);
        assert_eq!(s.current_model_id, "openai/gpt-oss-20b:free");
        assert_eq!(s.alternate_priority(), vec!["a", "b"]);
        assert_eq!(s.retry_attempts, 2);
    }

    #[test]
    fn test_yaml_and_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("s.yml");
        std::fs::write(&yaml, "retry_attempts: 4\nauto_fallback: false\n").unwrap();
        let s = AdvancedSettings::load_from_path(&yaml).unwrap();
        assert_eq!(s.retry_attempts, 4);
        assert!(!s.auto_fallback);

        let toml = dir.path().join("s.toml");
        std::fs::write(&toml, "").unwrap();
        assert!(matches!(
            AdvancedSettings::load_from_path(&toml),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn test_load_errors_keep_their_source() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AdvancedSettings::load_from_path(dir.path().join("missing.json")),
            Err(Error::Io(_))
        ));

        let json = dir.path().join("s.json");
        std::fs::write(&json, "{\"retry_attempts\": \"many\"}").unwrap();
        assert!(matches!(
            AdvancedSettings::load_from_path(&json),
            Err(Error::Serialization(_))
        ));

        let yaml = dir.path().join("s.yaml");
        std::fs::write(&yaml, "retry_attempts: [1, 2\n").unwrap();
        assert!(matches!(
            AdvancedSettings::load_from_path(&yaml),
            Err(Error::Yaml(_))
        ));
    }

    #[test]
    fn test_provider_get_set() {
        let provider = InMemorySettings::default();
        provider.set("retry_attempts", json!(5)).unwrap();
        provider.set("enable_web_search", json!(false)).unwrap();
        assert_eq!(provider.get("retry_attempts").unwrap(), json!(5));
        assert_eq!(provider.get("search_enabled").unwrap(), json!(false));
        assert_eq!(provider.get_or("nope", json!(1)), json!(1));

        assert!(matches!(
            provider.set("nope", json!(1)),
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            provider.set("retry_attempts", json!("many")),
            Err(Error::Validation { .. })
        ));
        assert_eq!(provider.snapshot().retry_attempts, 5);
    }

    #[test]
    fn test_set_current_model_and_catalog_override() {
        let provider = InMemorySettings::default();
        assert!(provider.catalog_override().is_none());
        provider.set_current_model("openai/gpt-oss-120b:free");
        assert_eq!(provider.snapshot().current_model_id, "openai/gpt-oss-120b:free");

        let provider = provider.with_catalog(ModelCatalog::builtin());
        assert_eq!(provider.catalog_override().unwrap().len(), 8);
    }
}
