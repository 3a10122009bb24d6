//! Message entry point: dispatcher, side services and router behind one call.

use crate::catalog::{ModelDescriptor, ProviderKind};
use crate::dispatch::{Intent, IntentDispatcher};
use crate::router::{envelope, FallbackRouter};
use crate::services::{
    CommandExecutor, DesktopCommands, DuckDuckGoSearch, OpenWeatherMap, SearchService,
    WeatherService, PLAYFUL_THRESHOLD,
};
use crate::settings::SettingsProvider;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info_span, Instrument};

pub struct Assistant {
    settings: Arc<dyn SettingsProvider>,
    dispatcher: IntentDispatcher,
    router: Arc<FallbackRouter>,
    weather: Arc<dyn WeatherService>,
    search: Arc<dyn SearchService>,
    commands: Arc<dyn CommandExecutor>,
}

impl Assistant {
    /// Assistant with the default OpenWeatherMap, DuckDuckGo and desktop executors.
    pub fn new(settings: Arc<dyn SettingsProvider>, router: Arc<FallbackRouter>) -> Self {
        Self {
            dispatcher: IntentDispatcher::new(settings.clone()),
            settings,
            router,
            weather: Arc::new(OpenWeatherMap::from_env()),
            search: Arc::new(DuckDuckGoSearch::new()),
            commands: Arc::new(DesktopCommands::new()),
        }
    }

    pub fn with_weather(mut self, weather: Arc<dyn WeatherService>) -> Self {
        self.weather = weather;
        self
    }

    pub fn with_search(mut self, search: Arc<dyn SearchService>) -> Self {
        self.search = search;
        self
    }

    pub fn with_commands(mut self, commands: Arc<dyn CommandExecutor>) -> Self {
        self.commands = commands;
        self
    }

    pub fn router(&self) -> &Arc<FallbackRouter> {
        &self.router
    }

    /// Answer one user message. Always returns an enveloped response.
    pub async fn handle(&self, message: &str) -> String {
        let settings = self.settings.snapshot();

        if settings.response_delay_seconds > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(settings.response_delay_seconds)).await;
        }

        let intent = self.dispatcher.classify(message);
        let creativity = settings.creativity;
        let current = settings.current_model_id.clone();
        let span = info_span!("handle", intent = intent.name(), model_id = %current);

        async move {
            let catalog = self.router.catalog();
            let label = catalog
                .get_or_local(&current)
                .map(|m| m.display_name.clone())
                .unwrap_or_else(|| current.clone());

            let text = match intent {
                Intent::ModelIdentity => match catalog.get_or_local(&current) {
                    Some(model) => describe_model(model, creativity),
                    None => format!("I am currently using {current}."),
                },
                Intent::Weather { city } => self.weather.current(&city, creativity).await,
                Intent::Search { query } => {
                    self.search.search(&query, settings.search_result_limit).await
                }
                Intent::SearchDisabled => search_disabled_text(creativity).to_string(),
                Intent::CommandsDisabled => commands_disabled_text(creativity).to_string(),
                Intent::SystemCommand { raw } => match self.commands.execute(&raw, creativity) {
                    Some(text) => text,
                    None => {
                        debug!("command not recognised, routing as conversation");
                        return self.router.route(message, &current).await;
                    }
                },
                Intent::General => return self.router.route(message, &current).await,
            };
            envelope(&text, &label)
        }
        .instrument(span)
        .await
    }
}

fn describe_model(model: &ModelDescriptor, creativity: f64) -> String {
    let kind = match model.provider_kind {
        ProviderKind::Local => "local",
        ProviderKind::Remote => "remote",
    };
    let description = if model.description.is_empty() {
        "No description available"
    } else {
        model.description.as_str()
    };
    if creativity > PLAYFUL_THRESHOLD {
        format!(
            "I'm currently running on {}! It's a {kind} model. {description} I'm ready to help you with whatever you need!",
            model.display_name
        )
    } else {
        format!(
            "I am currently using {}, which is a {kind} model. {description}",
            model.display_name
        )
    }
}

fn search_disabled_text(creativity: f64) -> &'static str {
    if creativity > PLAYFUL_THRESHOLD {
        "Web search is currently taking a digital vacation! You can re-enable it in the advanced settings if you'd like to explore the internet together."
    } else {
        "Web search is currently disabled. You can enable it in the advanced settings."
    }
}

fn commands_disabled_text(creativity: f64) -> &'static str {
    if creativity > PLAYFUL_THRESHOLD {
        "System commands are currently disabled for safety. You can re-enable them in the advanced settings if you want me to control apps or volume."
    } else {
        "System commands are disabled. You can enable them in the advanced settings."
    }
}
