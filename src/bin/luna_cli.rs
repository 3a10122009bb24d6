//! luna-cli: text-mode REPL over the assistant core.
//!
//! Usage:
//!   luna-cli [--settings <path>] [--model <id>] [--no-persist]
//!
//! Reads one message per line from stdin and prints the enveloped reply.

use anyhow::Context;
use luna_assistant::responder::default_profile_path;
use luna_assistant::{
    AdvancedSettings, Assistant, EnvCredentials, FallbackRouter, InMemorySettings,
    InMemoryStatusStore, LocalResponder, ModelCatalog, OpenRouterClient, SettingsProvider,
    StatusMonitor, StatusStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

struct Args {
    settings: Option<PathBuf>,
    model: Option<String>,
    persist: bool,
}

fn parse_args() -> anyhow::Result<Option<Args>> {
    let mut args = Args {
        settings: None,
        model: None,
        persist: true,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--settings" => {
                let path = it.next().context("--settings needs a path")?;
                args.settings = Some(PathBuf::from(path));
            }
            "--model" => {
                args.model = Some(it.next().context("--model needs a model id")?);
            }
            "--no-persist" => args.persist = false,
            "--version" | "-V" => {
                println!("luna-cli {}", env!("CARGO_PKG_VERSION"));
                return Ok(None);
            }
            "--help" | "-h" => {
                print_usage();
                return Ok(None);
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    Ok(Some(args))
}

fn print_usage() {
    println!(
        r#"luna-cli - Luna assistant REPL

USAGE:
    luna-cli [OPTIONS]

OPTIONS:
    --settings <path>   Load advanced settings from a .json/.yaml file
    --model <id>        Select the active model (aliases accepted)
    --no-persist        Do not write the local conversation profile
    -h, --help          Show this help message
    -V, --version       Show version information

REPL COMMANDS:
    help, status, models, exit, quit

ENVIRONMENT:
    OPENROUTER_API_KEY      OpenRouter key (also read from .env and the OS keyring)
    OPENWEATHERMAP_API_KEY  Enables live weather
    LUNA_ALT_MODELS         Extra alternate model ids, comma separated
    RUST_LOG                Log filter (default luna_assistant=info)"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("luna_assistant=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(args) = parse_args()? else {
        return Ok(());
    };

    let mut settings = match &args.settings {
        Some(path) => AdvancedSettings::load_from_path(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => AdvancedSettings::default(),
    }
    .apply_env_overrides();
    if !args.persist {
        settings.remember_local_profile = false;
    }

    let catalog = Arc::new(ModelCatalog::builtin());
    if let Some(model) = &args.model {
        settings.current_model_id = catalog
            .resolve_alias(model)
            .with_context(|| format!("selecting model {model}"))?;
    }

    let provider = Arc::new(InMemorySettings::new(settings));
    let credentials = Arc::new(EnvCredentials::openrouter());
    let backend = Arc::new(OpenRouterClient::from_env(credentials.clone())?);
    let status: Arc<dyn StatusStore> = Arc::new(InMemoryStatusStore::new());

    let snapshot = provider.snapshot();
    let mut responder = LocalResponder::new(snapshot.creativity);
    if args.persist {
        responder = responder.with_profile_path(default_profile_path());
    }
    responder.apply_settings(&snapshot);

    let router = FallbackRouter::builder(backend.clone(), Arc::new(responder), provider.clone())
        .credentials(credentials)
        .status_store(status.clone())
        .catalog(catalog.clone())
        .build();
    let assistant = Assistant::new(provider.clone(), Arc::new(router));

    let monitor = Arc::new(StatusMonitor::new(backend, status.clone(), provider.clone(), catalog));
    let probing = monitor.spawn();

    println!("Luna is ready. Type 'help' for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "exit" | "quit" => break,
            "help" => print_usage(),
            "status" => print_status(status.as_ref()),
            "models" => print_models(&assistant, provider.as_ref()),
            message => println!("{}\n", assistant.handle(message).await),
        }
    }

    probing.abort();
    Ok(())
}

fn print_status(status: &dyn StatusStore) {
    let mut entries: Vec<_> = status.snapshot().into_iter().collect();
    if entries.is_empty() {
        println!("No status recorded yet.");
        return;
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    for (id, st) in entries {
        match st.last_error {
            Some(err) => println!(
                "{id:<40} {:<16} {} ({})",
                st.state.as_str(),
                err.message,
                err.timestamp.format("%H:%M:%S")
            ),
            None => println!("{id:<40} {}", st.state.as_str()),
        }
    }
}

fn print_models(assistant: &Assistant, settings: &dyn SettingsProvider) {
    let current = settings.snapshot().current_model_id.clone();
    for model in assistant.router().catalog().list() {
        let marker = if model.id == current { "*" } else { " " };
        println!("{marker} {:<40} {}", model.id, model.display_name);
    }
}
