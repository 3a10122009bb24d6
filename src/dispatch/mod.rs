//! Intent dispatcher.
//!
//! Ordered, stateless rules decide what a message is before any model sees it:
//!
//! 1. model / identity question
//! 2. weather (`"weather"` anywhere in the text)
//! 3. web search (keywords, WH-question patterns, sports terms) when enabled
//! 4. system command when enabled
//! 5. everything else goes to the router
//!
//! A message containing both "weather" and "search" is weather. Settings are re-read on
//! every call.

mod rules;

use crate::settings::{AdvancedSettings, SettingsProvider};
use rules::{
    contains_any, search_query, weather_city, COMMAND_KEYWORDS, IDENTITY_QUESTIONS,
    MODEL_QUESTIONS, SEARCH_DISABLED_KEYWORDS,
};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// "what model are you", "who are you", ...
    ModelIdentity,
    Weather { city: String },
    Search { query: String },
    /// Search is disabled but the user asked for one.
    SearchDisabled,
    SystemCommand { raw: String },
    /// Commands are disabled but the user asked for one.
    CommandsDisabled,
    General,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::ModelIdentity => "model_identity",
            Intent::Weather { .. } => "weather",
            Intent::Search { .. } => "search",
            Intent::SearchDisabled => "search_disabled",
            Intent::SystemCommand { .. } => "system_command",
            Intent::CommandsDisabled => "commands_disabled",
            Intent::General => "general",
        }
    }
}

pub struct IntentDispatcher {
    settings: Arc<dyn SettingsProvider>,
}

impl IntentDispatcher {
    pub fn new(settings: Arc<dyn SettingsProvider>) -> Self {
        Self { settings }
    }

    pub fn classify(&self, message: &str) -> Intent {
        let settings = self.settings.snapshot();
        let intent = classify_with(message, &settings);
        debug!(intent = intent.name(), "message classified");
        intent
    }
}

/// Classify against an explicit settings snapshot.
pub fn classify_with(message: &str, settings: &AdvancedSettings) -> Intent {
    let lower = message.trim().to_lowercase();

    if contains_any(&lower, MODEL_QUESTIONS) || contains_any(&lower, IDENTITY_QUESTIONS) {
        return Intent::ModelIdentity;
    }

    if lower.contains("weather") {
        let city = weather_city(&lower).unwrap_or_else(|| settings.default_city.clone());
        return Intent::Weather { city };
    }

    if settings.search_enabled {
        if let Some(query) = search_query(&lower) {
            return Intent::Search { query };
        }
    } else if contains_any(&lower, SEARCH_DISABLED_KEYWORDS) {
        return Intent::SearchDisabled;
    }

    if contains_any(&lower, COMMAND_KEYWORDS) {
        return if settings.system_commands_enabled {
            Intent::SystemCommand { raw: lower }
        } else {
            Intent::CommandsDisabled
        };
    }

    Intent::General
}
