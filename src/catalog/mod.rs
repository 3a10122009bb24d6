//! Model catalog.
//!
//! A static, ordered registry of the models the assistant knows about. The router and the
//! dispatcher only ever look models up here; availability is tracked separately by
//! [`crate::status`].
//!
//! Callers (typically a UI) may install their own superset through the settings provider;
//! [`effective_catalog`] prefers that override so UI and backend agree on ids and names.

mod alias;

pub use alias::{normalize_id, resolve_alias, LEGACY_ALIASES};

use crate::settings::SettingsProvider;
use crate::status::ModelState;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Id of the always-present local rule-based engine.
pub const LOCAL_ENGINE_ID: &str = "local_engine";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Local,
    Remote,
}

/// Immutable description of one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub display_name: String,
    pub provider_kind: ProviderKind,
    #[serde(default)]
    pub capability_tags: BTreeSet<String>,
    /// Advertised status at catalog construction time. Live availability is in the status store.
    #[serde(default = "default_state")]
    pub status: ModelState,
    #[serde(default)]
    pub description: String,
}

fn default_state() -> ModelState {
    ModelState::Available
}

impl ModelDescriptor {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, kind: ProviderKind) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            provider_kind: kind,
            capability_tags: BTreeSet::new(),
            status: ModelState::Available,
            description: String::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capability_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_local(&self) -> bool {
        self.provider_kind == ProviderKind::Local
    }

    pub fn is_remote(&self) -> bool {
        self.provider_kind == ProviderKind::Remote
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.capability_tags.contains(tag)
    }
}

/// Ordered id → descriptor mapping. Iteration order is insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ModelDescriptor>", into = "Vec<ModelDescriptor>")]
pub struct ModelCatalog {
    models: Vec<ModelDescriptor>,
    index: HashMap<String, usize>,
}

impl From<Vec<ModelDescriptor>> for ModelCatalog {
    fn from(models: Vec<ModelDescriptor>) -> Self {
        let mut catalog = ModelCatalog::default();
        for m in models {
            catalog.insert(m);
        }
        catalog
    }
}

impl From<ModelCatalog> for Vec<ModelDescriptor> {
    fn from(catalog: ModelCatalog) -> Self {
        catalog.models
    }
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a descriptor. A replaced id keeps its original position.
    pub fn insert(&mut self, descriptor: ModelDescriptor) {
        match self.index.get(&descriptor.id) {
            Some(&pos) => self.models[pos] = descriptor,
            None => {
                self.index.insert(descriptor.id.clone(), self.models.len());
                self.models.push(descriptor);
            }
        }
    }

    pub fn with_model(mut self, descriptor: ModelDescriptor) -> Self {
        self.insert(descriptor);
        self
    }

    pub fn get(&self, id: &str) -> Option<&ModelDescriptor> {
        self.index.get(id).map(|&i| &self.models[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All descriptors in catalog order.
    pub fn list(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Remote model ids in catalog order.
    pub fn remote_ids(&self) -> Vec<String> {
        self.models
            .iter()
            .filter(|m| m.is_remote())
            .map(|m| m.id.clone())
            .collect()
    }

    /// Descriptor for `id`, or the local engine when `id` is unknown.
    pub fn get_or_local(&self, id: &str) -> Option<&ModelDescriptor> {
        self.get(id).or_else(|| self.get(LOCAL_ENGINE_ID))
    }

    /// See [`resolve_alias`].
    pub fn resolve_alias(&self, raw_id: &str) -> Result<String> {
        resolve_alias(self, raw_id)
    }

    /// Display name for `id`, failing for unknown ids.
    pub fn display_name(&self, id: &str) -> Result<&str> {
        self.get(id)
            .map(|m| m.display_name.as_str())
            .ok_or_else(|| Error::UnknownModel { id: id.to_string() })
    }

    /// Built-in catalog: the local engine, downloadable local models and free OpenRouter models.
    pub fn builtin() -> Self {
        let local_tags = ["offline", "privacy"];
        Self::new()
            .with_model(
                ModelDescriptor::new(LOCAL_ENGINE_ID, "Local Conversation Engine", ProviderKind::Local)
                    .with_tags([
                        "instant_response",
                        "offline",
                        "privacy",
                        "creativity_control",
                        "weather_integration",
                        "web_search",
                        "system_commands",
                    ])
                    .with_description(
                        "Fast local responses with advanced pattern matching and creativity controls",
                    ),
            )
            .with_model(
                ModelDescriptor::new("local/mistral-7b-instruct", "Mistral 7B", ProviderKind::Local)
                    .with_tags(
                        ["conversation", "reasoning", "instruction_following", "code_generation"]
                            .into_iter()
                            .chain(local_tags),
                    )
                    .with_description("Local 7B parameter model that runs entirely on your hardware"),
            )
            .with_model(
                ModelDescriptor::new("local/llama-3.1-8b-instruct", "Llama 3.1 8B", ProviderKind::Local)
                    .with_tags(
                        ["reasoning", "conversation", "instruction_following", "knowledge_retrieval"]
                            .into_iter()
                            .chain(local_tags),
                    )
                    .with_description("Local 8B model with strong reasoning capabilities"),
            )
            .with_model(
                ModelDescriptor::new("local/qwen-2.5-7b-instruct", "Qwen 2.5 7B", ProviderKind::Local)
                    .with_tags(
                        ["multilingual", "conversation", "reasoning", "instruction_following"]
                            .into_iter()
                            .chain(local_tags),
                    )
                    .with_description("Local 7B model with strong multilingual capabilities"),
            )
            .with_model(
                ModelDescriptor::new(
                    "local/deepseek-coder-6.7b",
                    "DeepSeek Coder 6.7B",
                    ProviderKind::Local,
                )
                .with_tags(
                    ["code_generation", "programming_assistance", "debugging"]
                        .into_iter()
                        .chain(local_tags),
                )
                .with_description("Local 6.7B model optimized for coding and programming tasks"),
            )
            .with_model(
                ModelDescriptor::new(
                    "deepseek/deepseek-r1-0528:free",
                    "DeepSeek R1",
                    ProviderKind::Remote,
                )
                .with_tags(["conversation", "instruction_following", "reasoning", "multilingual"])
                .with_description(
                    "DeepSeek's conversational model optimized for chat and instruction following",
                ),
            )
            .with_model(
                ModelDescriptor::new(
                    "openai/gpt-oss-20b:free",
                    "OpenAI GPT-OSS 20B",
                    ProviderKind::Remote,
                )
                .with_tags([
                    "conversation",
                    "reasoning",
                    "code_generation",
                    "knowledge_retrieval",
                    "multilingual",
                ])
                .with_description("Open-source 20B parameter model with strong general-purpose capabilities"),
            )
            .with_model(
                ModelDescriptor::new(
                    "openai/gpt-oss-120b:free",
                    "OpenAI GPT-OSS 120B",
                    ProviderKind::Remote,
                )
                .with_tags([
                    "conversation",
                    "reasoning",
                    "code_generation",
                    "knowledge_retrieval",
                    "multilingual",
                ])
                .with_description("Larger 120B parameter model for demanding reasoning and generation"),
            )
    }
}

/// The catalog a call should use: the provider's override when set, else `builtin`.
pub fn effective_catalog(
    settings: &dyn SettingsProvider,
    builtin: &Arc<ModelCatalog>,
) -> Arc<ModelCatalog> {
    settings
        .catalog_override()
        .unwrap_or_else(|| Arc::clone(builtin))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_order_and_kinds() {
        let catalog = ModelCatalog::builtin();
        assert_eq!(catalog.list()[0].id, LOCAL_ENGINE_ID);
        assert_eq!(catalog.len(), 8);
        assert_eq!(
            catalog.remote_ids(),
            vec![
                "deepseek/deepseek-r1-0528:free",
                "openai/gpt-oss-20b:free",
                "openai/gpt-oss-120b:free"
            ]
        );
        assert!(catalog.get("local/mistral-7b-instruct").unwrap().is_local());
        assert!(catalog.get(LOCAL_ENGINE_ID).unwrap().has_tag("offline"));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut catalog = ModelCatalog::new()
            .with_model(ModelDescriptor::new("a", "A", ProviderKind::Remote))
            .with_model(ModelDescriptor::new("b", "B", ProviderKind::Remote));
        catalog.insert(ModelDescriptor::new("a", "A2", ProviderKind::Remote));
        let names: Vec<_> = catalog.list().iter().map(|m| m.display_name.as_str()).collect();
        assert_eq!(names, vec!["A2", "B"]);
    }

    #[test]
    fn test_unknown_falls_back_to_local() {
        let catalog = ModelCatalog::builtin();
        assert_eq!(catalog.get_or_local("nope").unwrap().id, LOCAL_ENGINE_ID);
        assert!(matches!(
            catalog.display_name("nope"),
            Err(Error::UnknownModel { .. })
        ));
    }

    #[test]
    fn test_serde_keeps_order() {
        let catalog = ModelCatalog::builtin();
        let json = serde_json::to_string(&catalog).unwrap();
        let back: ModelCatalog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, catalog);
        assert_eq!(back.get("openai/gpt-oss-20b:free").unwrap().display_name, "OpenAI GPT-OSS 20B");
    }
}
